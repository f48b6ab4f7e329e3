//! Run-completion email notifications via SMTP.
//!
//! Alerting is strictly best-effort: when SMTP is unconfigured the alerter is
//! a logged no-op, and a failed send is logged and swallowed. A broken mail
//! relay must never fail a pipeline run that otherwise succeeded.

use leaguetable_core::{ErrorLog, RunStatus};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error)]
enum AlertError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("message build error: {0}")]
    Build(String),
}

/// SMTP settings for the alerter.
///
/// | Variable        | Required | Default |
/// |-----------------|----------|---------|
/// | `SMTP_HOST`     | yes      |         |
/// | `ALERT_EMAIL`   | yes      |         |
/// | `SMTP_FROM`     | no       | `leaguetable@localhost` |
/// | `SMTP_PORT`     | no       | `587`   |
/// | `SMTP_USER`     | no       |         |
/// | `SMTP_PASSWORD` | no       |         |
#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub to_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl AlertConfig {
    /// Load from environment variables. Returns `None` unless both
    /// `SMTP_HOST` and `ALERT_EMAIL` are set, signalling that alerting is
    /// disabled.
    pub fn from_env() -> Option<Self> {
        let smtp_host = crate::config::optional("SMTP_HOST")?;
        let to_address = crate::config::optional("ALERT_EMAIL")?;
        Some(Self {
            smtp_host,
            smtp_port: crate::config::optional("SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: crate::config::optional("SMTP_FROM")
                .unwrap_or_else(|| "leaguetable@localhost".to_string()),
            to_address,
            smtp_user: crate::config::optional("SMTP_USER"),
            smtp_password: crate::config::optional("SMTP_PASSWORD"),
        })
    }
}

/// Notification sink for run completion. The production implementation is
/// [`EmailAlerter`]; tests substitute recording stubs.
pub trait Alerter {
    /// Deliver the run summary. Implementations are best-effort and must
    /// never fail the run.
    fn notify(
        &self,
        status: RunStatus,
        errors: &ErrorLog,
        api_sports_teams: usize,
        api_football_teams: usize,
    );
}

/// Sends the end-of-run status email. Construct with `None` to disable.
pub struct EmailAlerter {
    config: Option<AlertConfig>,
}

impl EmailAlerter {
    pub fn new(config: Option<AlertConfig>) -> Self {
        Self { config }
    }

    pub fn disabled() -> Self {
        Self { config: None }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn subject(status: RunStatus) -> &'static str {
        match status {
            RunStatus::Success => "League pipeline run succeeded",
            RunStatus::Partial => "League pipeline run completed with errors",
            RunStatus::Failed => "CRITICAL: league pipeline run failed",
        }
    }
}

impl Alerter for EmailAlerter {
    /// Send the run summary. A missing configuration or a send failure is
    /// logged, never surfaced.
    fn notify(
        &self,
        status: RunStatus,
        errors: &ErrorLog,
        api_sports_teams: usize,
        api_football_teams: usize,
    ) {
        let Some(config) = &self.config else {
            tracing::info!(%status, "alerting not configured, skipping notification");
            return;
        };

        let body = format!(
            "Pipeline status: {status}\n\
             API-Sports teams processed: {api_sports_teams}\n\
             API-Football teams processed: {api_football_teams}\n\n{}",
            errors.report()
        );

        match send(config, Self::subject(status), &body) {
            Ok(()) => {
                tracing::info!(to = %config.to_address, %status, "notification email sent");
            }
            Err(err) => {
                tracing::error!(to = %config.to_address, error = %err, "notification email failed");
            }
        }
    }
}

fn send(config: &AlertConfig, subject: &str, body: &str) -> Result<(), AlertError> {
    let email = Message::builder()
        .from(config.from_address.parse()?)
        .to(config.to_address.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| AlertError::Build(e.to_string()))?;

    let mut builder = SmtpTransport::starttls_relay(&config.smtp_host)?.port(config.smtp_port);
    if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
    }

    builder.build().send(&email)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_alerter_is_a_no_op() {
        let alerter = EmailAlerter::disabled();
        assert!(!alerter.is_configured());
        // Must not attempt any network activity.
        alerter.notify(RunStatus::Failed, &ErrorLog::new(), 0, 0);
    }

    #[test]
    fn subject_reflects_status() {
        assert!(EmailAlerter::subject(RunStatus::Success).contains("succeeded"));
        assert!(EmailAlerter::subject(RunStatus::Partial).contains("with errors"));
        assert!(EmailAlerter::subject(RunStatus::Failed).contains("CRITICAL"));
    }

    #[test]
    fn from_env_requires_host_and_recipient() {
        std::env::remove_var("SMTP_HOST");
        std::env::remove_var("ALERT_EMAIL");
        assert!(AlertConfig::from_env().is_none());
    }
}
