use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub destination: String,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_confirmed: bool,
}

/// Input for creating a trip together with its initial participants.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub owner_name: Option<String>,
    pub owner_email: String,
    #[serde(default)]
    pub emails_to_invite: Vec<String>,
}

/// Overwrites destination and dates; the confirmation flag is never part of an update.
#[derive(Debug, Clone, Deserialize)]
pub struct TripUpdate {
    pub destination: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}
