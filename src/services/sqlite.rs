use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    models::{activity::Activity, link::Link, participant::Participant, trip::Trip},
    services::store::{StoreError, TripRecord, TripStore},
};

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Unique violations are duplicate invites, FK violations a missing trip.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateParticipant;
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound;
        }
    }
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl TripStore for SqliteStore {
    async fn get_trip(&self, id: Uuid) -> Result<Trip, StoreError> {
        sqlx::query_as::<_, Trip>(
            "SELECT id, destination, owner_email, owner_name, starts_at, ends_at, is_confirmed \
             FROM trips WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn create_trip(&self, record: TripRecord<'_>) -> Result<Uuid, StoreError> {
        let trip_id = Uuid::new_v4();
        // Dropped without commit on any early return, which rolls back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO trips (id, destination, owner_email, owner_name, starts_at, ends_at, is_confirmed) \
             VALUES (?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(trip_id)
        .bind(record.destination)
        .bind(record.owner_email)
        .bind(record.owner_name)
        .bind(record.starts_at)
        .bind(record.ends_at)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        for email in record.participant_emails {
            sqlx::query(
                "INSERT INTO participants (id, trip_id, email, is_confirmed) VALUES (?, ?, ?, 0)",
            )
            .bind(Uuid::new_v4())
            .bind(trip_id)
            .bind(email)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        tx.commit().await?;
        Ok(trip_id)
    }

    async fn update_trip(
        &self,
        id: Uuid,
        destination: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        is_confirmed: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE trips SET destination = ?, starts_at = ?, ends_at = ?, \
             is_confirmed = (is_confirmed OR ?) WHERE id = ?",
        )
        .bind(destination)
        .bind(starts_at)
        .bind(ends_at)
        .bind(is_confirmed)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn confirm_trip(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE trips SET is_confirmed = 1 WHERE id = ? AND is_confirmed = 0")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_participant(&self, id: Uuid) -> Result<Participant, StoreError> {
        sqlx::query_as::<_, Participant>(
            "SELECT id, trip_id, email, is_confirmed FROM participants WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn confirm_participant(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE participants SET is_confirmed = 1 WHERE id = ? AND is_confirmed = 0",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected() == 1)
    }

    async fn invite_participant(&self, trip_id: Uuid, email: &str) -> Result<Uuid, StoreError> {
        let participant_id = Uuid::new_v4();
        // No existence pre-check: the FK and the unique index decide.
        sqlx::query(
            "INSERT INTO participants (id, trip_id, email, is_confirmed) VALUES (?, ?, ?, 0)",
        )
        .bind(participant_id)
        .bind(trip_id)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(participant_id)
    }

    async fn list_participants(&self, trip_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let rows = sqlx::query_as::<_, Participant>(
            "SELECT id, trip_id, email, is_confirmed FROM participants \
             WHERE trip_id = ? ORDER BY rowid",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows)
    }

    async fn create_activity(
        &self,
        trip_id: Uuid,
        title: &str,
        occurs_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let activity_id = Uuid::new_v4();
        sqlx::query("INSERT INTO activities (id, trip_id, title, occurs_at) VALUES (?, ?, ?, ?)")
            .bind(activity_id)
            .bind(trip_id)
            .bind(title)
            .bind(occurs_at)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(activity_id)
    }

    async fn list_activities(&self, trip_id: Uuid) -> Result<Vec<Activity>, StoreError> {
        let rows = sqlx::query_as::<_, Activity>(
            "SELECT id, trip_id, title, occurs_at FROM activities WHERE trip_id = ? ORDER BY rowid",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows)
    }

    async fn create_link(
        &self,
        trip_id: Uuid,
        title: &str,
        url: &str,
    ) -> Result<Uuid, StoreError> {
        let link_id = Uuid::new_v4();
        sqlx::query("INSERT INTO links (id, trip_id, title, url) VALUES (?, ?, ?, ?)")
            .bind(link_id)
            .bind(trip_id)
            .bind(title)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(link_id)
    }

    async fn list_links(&self, trip_id: Uuid) -> Result<Vec<Link>, StoreError> {
        let rows = sqlx::query_as::<_, Link>(
            "SELECT id, trip_id, title, url FROM links WHERE trip_id = ? ORDER BY rowid",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;
        Ok(rows)
    }
}
