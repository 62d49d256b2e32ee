use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::AppConfig,
    db::DbPool,
    error::AppError,
    services::{
        mailer::{Mailer, Notifier},
        planner::TripPlanner,
        sqlite::SqliteStore,
        store::TripStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub planner: TripPlanner,
}

impl AppState {
    pub fn new(config: AppConfig, planner: TripPlanner) -> Self {
        Self { config, planner }
    }

    /// Wires the SQLite store and the mailer into a planner.
    pub fn from_pool(config: AppConfig, db: DbPool) -> Result<Self, AppError> {
        let store: Arc<dyn TripStore> = Arc::new(SqliteStore::new(db));
        let mailer = Mailer::new(
            Arc::clone(&store),
            &config.mail,
            config.public_base_url.clone(),
        )
        .context("failed to set up the mailer")?;
        let notifier: Arc<dyn Notifier> = Arc::new(mailer);
        let planner = TripPlanner::new(store, notifier, config.calendar_offset);
        Ok(Self::new(config, planner))
    }
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use chrono::FixedOffset;

    use super::*;
    use crate::config::MailConfig;

    fn config(from: &str) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            public_base_url: "http://localhost:8080".parse().unwrap(),
            calendar_offset: FixedOffset::east_opt(0).unwrap(),
            request_timeout: Duration::from_secs(5),
            mail: MailConfig {
                from: from.into(),
                smtp: None,
            },
        }
    }

    #[tokio::test]
    async fn unusable_sender_address_stops_startup() {
        let db = DbPool::connect_lazy("sqlite::memory:").unwrap();
        let err = AppState::from_pool(config("not a mailbox"), db)
            .err()
            .expect("startup must fail");
        assert!(matches!(err, AppError::Other(_)));
        assert!(err.to_string().contains("failed to set up the mailer"));
    }

    #[tokio::test]
    async fn log_only_mailer_wires_up() {
        let db = DbPool::connect_lazy("sqlite::memory:").unwrap();
        assert!(AppState::from_pool(config("Wayfarer <noreply@wayfarer.local>"), db).is_ok());
    }
}
