use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use lettre::Address;
use tracing::{debug, error, info};
use url::Url;
use uuid::Uuid;

use crate::{
    error::{Entity, TripError},
    models::{
        activity::ActivityDay,
        link::Link,
        participant::ParticipantView,
        trip::{NewTrip, Trip, TripUpdate},
    },
    services::{
        agenda,
        mailer::Notifier,
        store::{StoreError, TripRecord, TripStore},
    },
};

/// Trip lifecycle: creation, invitations and the two confirmation flags.
///
/// Holds no entity state of its own; every read goes to the store. Emails are
/// handed to the notifier on a detached task and never affect the result.
#[derive(Clone)]
pub struct TripPlanner {
    store: Arc<dyn TripStore>,
    notifier: Arc<dyn Notifier>,
    calendar_offset: FixedOffset,
}

impl TripPlanner {
    pub fn new(
        store: Arc<dyn TripStore>,
        notifier: Arc<dyn Notifier>,
        calendar_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            notifier,
            calendar_offset,
        }
    }

    pub async fn create_trip(&self, new_trip: NewTrip) -> Result<Uuid, TripError> {
        let destination = require_text("destination", &new_trip.destination)?;
        let owner_email = require_email(&new_trip.owner_email)?;
        let owner_name = new_trip
            .owner_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let mut emails = Vec::with_capacity(new_trip.emails_to_invite.len() + 1);
        emails.push(owner_email.clone());
        for email in &new_trip.emails_to_invite {
            emails.push(require_email(email)?);
        }

        let record = TripRecord {
            destination,
            owner_email: &owner_email,
            owner_name,
            starts_at: new_trip.starts_at,
            ends_at: new_trip.ends_at,
            participant_emails: &emails,
        };
        // A duplicate inside one request is a failed create, not a conflict.
        let trip_id = self.store.create_trip(record).await.map_err(|err| {
            error!(error = %err, destination = %destination, "failed to create trip");
            TripError::Persistence(err)
        })?;
        info!(trip_id = %trip_id, participants = emails.len(), "trip created");

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.send_trip_confirmation_email(trip_id).await {
                error!(error = %err, trip_id = %trip_id, "failed to send trip confirmation email");
            }
        });

        Ok(trip_id)
    }

    pub async fn get_trip(&self, trip_id: Uuid) -> Result<Trip, TripError> {
        self.store
            .get_trip(trip_id)
            .await
            .map_err(|err| store_failure(err, Entity::Trip, "failed to get trip", trip_id))
    }

    /// Overwrites destination and dates. The confirmation flag is carried over as read.
    pub async fn update_trip(&self, trip_id: Uuid, update: TripUpdate) -> Result<(), TripError> {
        let destination = require_text("destination", &update.destination)?;
        let trip = self.get_trip(trip_id).await?;
        self.store
            .update_trip(
                trip_id,
                destination,
                update.starts_at,
                update.ends_at,
                trip.is_confirmed,
            )
            .await
            .map_err(|err| store_failure(err, Entity::Trip, "failed to update trip", trip_id))?;
        debug!(trip_id = %trip_id, "trip updated");
        Ok(())
    }

    pub async fn confirm_trip(&self, trip_id: Uuid) -> Result<(), TripError> {
        let trip = self.get_trip(trip_id).await?;
        if trip.is_confirmed {
            return Err(TripError::AlreadyConfirmed(Entity::Trip));
        }
        let flipped = self
            .store
            .confirm_trip(trip_id)
            .await
            .map_err(|err| store_failure(err, Entity::Trip, "failed to confirm trip", trip_id))?;
        if !flipped {
            return Err(TripError::AlreadyConfirmed(Entity::Trip));
        }
        info!(trip_id = %trip_id, "trip confirmed");
        Ok(())
    }

    pub async fn confirm_participant(&self, participant_id: Uuid) -> Result<(), TripError> {
        let participant = self.store.get_participant(participant_id).await.map_err(|err| {
            store_failure(err, Entity::Participant, "failed to get participant", participant_id)
        })?;
        if participant.is_confirmed {
            return Err(TripError::AlreadyConfirmed(Entity::Participant));
        }
        let flipped = self
            .store
            .confirm_participant(participant_id)
            .await
            .map_err(|err| {
                store_failure(
                    err,
                    Entity::Participant,
                    "failed to confirm participant",
                    participant_id,
                )
            })?;
        if !flipped {
            return Err(TripError::AlreadyConfirmed(Entity::Participant));
        }
        info!(participant_id = %participant_id, trip_id = %participant.trip_id, "participant confirmed");
        Ok(())
    }

    pub async fn invite_participant(&self, trip_id: Uuid, email: &str) -> Result<Uuid, TripError> {
        let email = require_email(email)?;
        let participant_id = match self.store.invite_participant(trip_id, &email).await {
            Ok(id) => id,
            Err(StoreError::DuplicateParticipant) => return Err(TripError::DuplicateParticipant),
            Err(StoreError::NotFound) => return Err(TripError::NotFound(Entity::Trip)),
            Err(err) => {
                error!(
                    error = %err,
                    trip_id = %trip_id,
                    participant_email = %email,
                    "failed to invite participant to trip"
                );
                return Err(TripError::Persistence(err));
            }
        };
        info!(trip_id = %trip_id, participant_id = %participant_id, "participant invited");

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier
                .send_trip_confirmed_email(trip_id, participant_id)
                .await
            {
                error!(
                    error = %err,
                    trip_id = %trip_id,
                    participant_id = %participant_id,
                    "failed to send trip invitation email"
                );
            }
        });

        Ok(participant_id)
    }

    pub async fn participants(&self, trip_id: Uuid) -> Result<Vec<ParticipantView>, TripError> {
        self.get_trip(trip_id).await?;
        let participants = self.store.list_participants(trip_id).await.map_err(|err| {
            store_failure(err, Entity::Trip, "failed to find trip participants", trip_id)
        })?;
        Ok(participants.into_iter().map(ParticipantView::from).collect())
    }

    pub async fn create_activity(
        &self,
        trip_id: Uuid,
        title: &str,
        occurs_at: DateTime<Utc>,
    ) -> Result<Uuid, TripError> {
        let title = require_text("title", title)?;
        self.store
            .create_activity(trip_id, title, occurs_at)
            .await
            .map_err(|err| store_failure(err, Entity::Trip, "failed to create activity", trip_id))
    }

    pub async fn activities_by_date(&self, trip_id: Uuid) -> Result<Vec<ActivityDay>, TripError> {
        self.get_trip(trip_id).await?;
        let activities = self.store.list_activities(trip_id).await.map_err(|err| {
            store_failure(err, Entity::Trip, "failed to find trip activities", trip_id)
        })?;
        Ok(agenda::group_by_date(activities, self.calendar_offset))
    }

    pub async fn create_link(
        &self,
        trip_id: Uuid,
        title: &str,
        url: &str,
    ) -> Result<Uuid, TripError> {
        let title = require_text("title", title)?;
        let url = Url::parse(url.trim())
            .map_err(|err| TripError::validation(format!("url: {err}")))?;
        self.store
            .create_link(trip_id, title, url.as_str())
            .await
            .map_err(|err| store_failure(err, Entity::Trip, "failed to create link", trip_id))
    }

    pub async fn links(&self, trip_id: Uuid) -> Result<Vec<Link>, TripError> {
        self.get_trip(trip_id).await?;
        self.store
            .list_links(trip_id)
            .await
            .map_err(|err| store_failure(err, Entity::Trip, "failed to find trip links", trip_id))
    }
}

/// Not-found keeps its meaning; anything else is logged and hidden behind Persistence.
fn store_failure(err: StoreError, entity: Entity, context: &str, id: Uuid) -> TripError {
    match err {
        StoreError::NotFound => TripError::NotFound(entity),
        StoreError::DuplicateParticipant => TripError::DuplicateParticipant,
        err => {
            error!(error = %err, id = %id, "{context}");
            TripError::Persistence(err)
        }
    }
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, TripError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TripError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

fn require_email(value: &str) -> Result<String, TripError> {
    let trimmed = value.trim();
    trimmed
        .parse::<Address>()
        .map(|_| trimmed.to_string())
        .map_err(|err| TripError::validation(format!("email {trimmed:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(
            require_text("destination", "   "),
            Err(TripError::Validation(_))
        ));
        assert_eq!(require_text("destination", " Paris ").unwrap(), "Paris");
    }

    #[test]
    fn emails_must_be_addresses() {
        assert_eq!(require_email(" bob@x.com ").unwrap(), "bob@x.com");
        assert!(matches!(
            require_email("bob"),
            Err(TripError::Validation(_))
        ));
    }

    #[test]
    fn store_errors_keep_their_category() {
        assert!(matches!(
            store_failure(StoreError::NotFound, Entity::Participant, "ctx", Uuid::nil()),
            TripError::NotFound(Entity::Participant)
        ));
        assert!(matches!(
            store_failure(
                StoreError::Database(sqlx::Error::PoolTimedOut),
                Entity::Trip,
                "ctx",
                Uuid::nil()
            ),
            TripError::Persistence(_)
        ));
    }
}
