use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub email: String,
    pub is_confirmed: bool,
}

impl Participant {
    /// Local part of the address, when the stored email parses as a mailbox.
    pub fn display_name(&self) -> Option<String> {
        display_name(&self.email)
    }
}

pub fn display_name(email: &str) -> Option<String> {
    email
        .parse::<Mailbox>()
        .ok()
        .map(|mailbox| mailbox.email.user().to_string())
}

/// What the participant listing hands out: the stored row plus the derived name.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub is_confirmed: bool,
}

impl From<Participant> for ParticipantView {
    fn from(participant: Participant) -> Self {
        let name = participant.display_name();
        Self {
            id: participant.id,
            email: participant.email,
            name,
            is_confirmed: participant.is_confirmed,
        }
    }
}
