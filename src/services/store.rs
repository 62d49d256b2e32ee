use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{activity::Activity, link::Link, participant::Participant, trip::Trip};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("participant already exists for this trip")]
    DuplicateParticipant,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Fields for the atomic trip insert. `participant_emails` includes the owner.
#[derive(Debug, Clone)]
pub struct TripRecord<'a> {
    pub destination: &'a str,
    pub owner_email: &'a str,
    pub owner_name: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub participant_emails: &'a [String],
}

/// Durable state for trips and everything hanging off them.
///
/// Every mutation is atomic on its own. `create_trip` inserts the trip and
/// all initial participants in one transaction. Confirmation flips report
/// whether this call was the one that changed the row, so two concurrent
/// confirmations cannot both succeed.
#[async_trait]
pub trait TripStore: Send + Sync + 'static {
    async fn get_trip(&self, id: Uuid) -> Result<Trip, StoreError>;

    async fn create_trip(&self, record: TripRecord<'_>) -> Result<Uuid, StoreError>;

    /// Overwrites destination and dates. `is_confirmed` can only raise the flag.
    async fn update_trip(
        &self,
        id: Uuid,
        destination: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        is_confirmed: bool,
    ) -> Result<(), StoreError>;

    /// Returns `false` when the trip was already confirmed.
    async fn confirm_trip(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn get_participant(&self, id: Uuid) -> Result<Participant, StoreError>;

    /// Returns `false` when the participant was already confirmed.
    async fn confirm_participant(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn invite_participant(&self, trip_id: Uuid, email: &str) -> Result<Uuid, StoreError>;

    async fn list_participants(&self, trip_id: Uuid) -> Result<Vec<Participant>, StoreError>;

    async fn create_activity(
        &self,
        trip_id: Uuid,
        title: &str,
        occurs_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError>;

    async fn list_activities(&self, trip_id: Uuid) -> Result<Vec<Activity>, StoreError>;

    async fn create_link(&self, trip_id: Uuid, title: &str, url: &str)
        -> Result<Uuid, StoreError>;

    async fn list_links(&self, trip_id: Uuid) -> Result<Vec<Link>, StoreError>;
}
