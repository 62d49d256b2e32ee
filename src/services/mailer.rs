use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use thiserror::Error;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::{
    config::{MailConfig, SmtpConfig, SmtpSecurity},
    models::{participant::Participant, trip::Trip},
    services::store::{StoreError, TripStore},
};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] StoreError),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Send(String),
}

/// Outbound email side effects. Callers run these detached and only log failures.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Asks the trip owner to confirm the freshly created trip.
    async fn send_trip_confirmation_email(&self, trip_id: Uuid) -> Result<(), NotifyError>;

    /// Invites a participant to confirm their presence on the trip.
    async fn send_trip_confirmed_email(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn trip_confirmation_email(trip: &Trip, base_url: &Url) -> Email {
    let greeting = trip
        .owner_name
        .as_deref()
        .map(|name| format!("Hi {name},"))
        .unwrap_or_else(|| "Hi,".to_string());
    let link = confirm_link(base_url, &format!("trips/{}/confirm", trip.id));
    Email {
        to: trip.owner_email.clone(),
        subject: format!("Confirm your trip to {}", trip.destination),
        body: format!(
            "{greeting}\n\n\
             You created a trip to {} from {} to {}.\n\
             Confirm it here:\n\n{link}\n\n\
             If you did not plan this trip, ignore this email.\n",
            trip.destination,
            trip.starts_at.format("%Y-%m-%d"),
            trip.ends_at.format("%Y-%m-%d"),
        ),
    }
}

pub fn invitation_email(trip: &Trip, participant: &Participant, base_url: &Url) -> Email {
    let link = confirm_link(
        base_url,
        &format!("participants/{}/confirm", participant.id),
    );
    Email {
        to: participant.email.clone(),
        subject: format!("You are invited to a trip to {}", trip.destination),
        body: format!(
            "Hi,\n\n\
             You were invited to a trip to {} from {} to {}.\n\
             Confirm your presence here:\n\n{link}\n\n\
             If you do not know what this is about, ignore this email.\n",
            trip.destination,
            trip.starts_at.format("%Y-%m-%d"),
            trip.ends_at.format("%Y-%m-%d"),
        ),
    }
}

fn confirm_link(base_url: &Url, path: &str) -> String {
    format!("{}/{path}", base_url.as_str().trim_end_matches('/'))
}

fn smtp_transport(smtp: &SmtpConfig) -> Result<SmtpTransport, NotifyError> {
    let builder = match smtp.security {
        SmtpSecurity::Tls => SmtpTransport::relay(&smtp.host)
            .map_err(|err| NotifyError::Build(format!("SMTP relay error: {err}")))?,
        SmtpSecurity::StartTls => SmtpTransport::starttls_relay(&smtp.host)
            .map_err(|err| NotifyError::Build(format!("SMTP relay error: {err}")))?,
        SmtpSecurity::Plain => SmtpTransport::builder_dangerous(&smtp.host),
    };
    let builder = match &smtp.credentials {
        Some((user, password)) => {
            builder.credentials(Credentials::new(user.clone(), password.clone()))
        }
        None => builder,
    };
    Ok(builder.port(smtp.port).build())
}

enum Delivery {
    Smtp(SmtpTransport),
    Log,
}

/// Renders trip emails from stored state and delivers them over SMTP,
/// or only logs them when no SMTP server is configured.
#[derive(Clone)]
pub struct Mailer {
    store: Arc<dyn TripStore>,
    base_url: Url,
    from: Mailbox,
    delivery: Arc<Delivery>,
}

impl Mailer {
    pub fn new(
        store: Arc<dyn TripStore>,
        config: &MailConfig,
        base_url: Url,
    ) -> Result<Self, NotifyError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|err| NotifyError::Address(format!("{}: {err}", config.from)))?;

        let delivery = match &config.smtp {
            Some(smtp) => Delivery::Smtp(smtp_transport(smtp)?),
            None => Delivery::Log,
        };

        Ok(Self {
            store,
            base_url,
            from,
            delivery: Arc::new(delivery),
        })
    }

    async fn deliver(&self, email: Email) -> Result<(), NotifyError> {
        let transport = match self.delivery.as_ref() {
            Delivery::Smtp(transport) => transport.clone(),
            Delivery::Log => {
                info!(to = %email.to, subject = %email.subject, body = %email.body, "email (not sent, no SMTP configured)");
                return Ok(());
            }
        };

        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|err| NotifyError::Address(format!("{}: {err}", email.to)))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|err| NotifyError::Build(err.to_string()))?;

        tokio::task::spawn_blocking(move || {
            transport
                .send(&message)
                .map_err(|err| NotifyError::Send(err.to_string()))
        })
        .await
        .map_err(|err| NotifyError::Send(format!("email task failed: {err}")))?
        .map(|_| ())
    }
}

#[async_trait]
impl Notifier for Mailer {
    async fn send_trip_confirmation_email(&self, trip_id: Uuid) -> Result<(), NotifyError> {
        let trip = self.store.get_trip(trip_id).await?;
        self.deliver(trip_confirmation_email(&trip, &self.base_url))
            .await
    }

    async fn send_trip_confirmed_email(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<(), NotifyError> {
        let trip = self.store.get_trip(trip_id).await?;
        let participant = self.store.get_participant(participant_id).await?;
        self.deliver(invitation_email(&trip, &participant, &self.base_url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn trip() -> Trip {
        Trip {
            id: Uuid::new_v4(),
            destination: "Paris".into(),
            owner_email: "ana@example.com".into(),
            owner_name: Some("Ana".into()),
            starts_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap(),
            is_confirmed: false,
        }
    }

    #[test]
    fn confirmation_goes_to_the_owner_with_trip_link() {
        let trip = trip();
        let base = Url::parse("https://trips.example.com/").unwrap();
        let email = trip_confirmation_email(&trip, &base);

        assert_eq!(email.to, "ana@example.com");
        assert_eq!(email.subject, "Confirm your trip to Paris");
        assert!(email.body.starts_with("Hi Ana,"));
        assert!(email.body.contains("2025-06-01"));
        assert!(email
            .body
            .contains(&format!("https://trips.example.com/trips/{}/confirm", trip.id)));
    }

    #[test]
    fn invitation_goes_to_the_participant_with_participant_link() {
        let trip = trip();
        let participant = Participant {
            id: Uuid::new_v4(),
            trip_id: trip.id,
            email: "bob@x.com".into(),
            is_confirmed: false,
        };
        let base = Url::parse("http://localhost:8080").unwrap();
        let email = invitation_email(&trip, &participant, &base);

        assert_eq!(email.to, "bob@x.com");
        assert!(email.body.contains(&format!(
            "http://localhost:8080/participants/{}/confirm",
            participant.id
        )));
    }
}
