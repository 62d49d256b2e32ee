use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use chrono::FixedOffset;
use url::Url;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub public_base_url: Url,
    pub calendar_offset: FixedOffset,
    pub request_timeout: Duration,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub credentials: Option<(String, String)>,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// TLS from the first byte (submissions on 465).
    Tls,
    /// Plain greeting upgraded with STARTTLS (submission on 587).
    StartTls,
    /// No encryption, for local mail catchers.
    Plain,
}

impl SmtpSecurity {
    /// Used when `SMTP_TLS` is not set.
    pub fn for_port(port: u16, authenticated: bool) -> Self {
        match port {
            465 => SmtpSecurity::Tls,
            587 => SmtpSecurity::StartTls,
            _ if authenticated => SmtpSecurity::StartTls,
            _ => SmtpSecurity::Plain,
        }
    }
}

impl FromStr for SmtpSecurity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tls" | "wrapper" => Ok(SmtpSecurity::Tls),
            "starttls" => Ok(SmtpSecurity::StartTls),
            "none" | "plain" => Ok(SmtpSecurity::Plain),
            other => Err(format!("expected tls, starttls or none, got {other:?}")),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://wayfarer.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let public_base_url: Url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid PUBLIC_BASE_URL: {err}")))?;

        let calendar_offset: FixedOffset = env::var("CALENDAR_UTC_OFFSET")
            .unwrap_or_else(|_| "+00:00".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid CALENDAR_UTC_OFFSET: {err}")))?;

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|err| AppError::Config(format!("invalid REQUEST_TIMEOUT_SECS: {err}")))?;

        Ok(Self {
            database_url,
            listen_addr,
            public_base_url,
            calendar_offset,
            request_timeout,
            mail: MailConfig::from_env()?,
        })
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, AppError> {
        let from = env::var("MAIL_FROM")
            .unwrap_or_else(|_| "Wayfarer <noreply@wayfarer.local>".to_string());

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => {
                let port: u16 = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|err| AppError::Config(format!("invalid SMTP_PORT: {err}")))?;
                let credentials = match (env::var("SMTP_USERNAME"), env::var("SMTP_PASSWORD")) {
                    (Ok(user), Ok(password)) => Some((user, password)),
                    _ => None,
                };
                let security = match env::var("SMTP_TLS") {
                    Ok(mode) => mode
                        .parse()
                        .map_err(|err| AppError::Config(format!("invalid SMTP_TLS: {err}")))?,
                    Err(_) => SmtpSecurity::for_port(port, credentials.is_some()),
                };
                Some(SmtpConfig {
                    host: host.trim().to_string(),
                    port,
                    security,
                    credentials,
                })
            }
            _ => None,
        };

        Ok(Self { from, smtp })
    }
}
