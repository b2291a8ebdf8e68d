//! Configuration loaded from the environment.

use anyhow::{bail, Context};

use billing_observability::LogFormat;

pub const LOG_FORMAT_VAR: &str = "BILLING_LOG_FORMAT";
pub const NOTIFICATIONS_ENABLED_VAR: &str = "BILLING_NOTIFICATIONS_ENABLED";
pub const MAIL_SENDER_VAR: &str = "BILLING_MAIL_SENDER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    pub log_format: LogFormat,
    /// When false, finalization never queues customer mail.
    pub notifications_enabled: bool,
    /// Sender attached to queued mail; the mail queue's default when unset.
    pub mail_sender: Option<String>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            notifications_enabled: true,
            mail_sender: None,
        }
    }
}

impl BillingConfig {
    /// Read `BILLING_*` variables from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = non_empty(lookup(LOG_FORMAT_VAR)) {
            config.log_format = raw
                .parse::<LogFormat>()
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }
        if let Some(raw) = non_empty(lookup(NOTIFICATIONS_ENABLED_VAR)) {
            config.notifications_enabled =
                parse_bool(&raw).with_context(|| format!("invalid {NOTIFICATIONS_ENABLED_VAR}"))?;
        }
        config.mail_sender = non_empty(lookup(MAIL_SENDER_VAR));

        Ok(config)
    }

    /// Install the process-wide subscriber in the configured format.
    pub fn install_tracing(&self) {
        billing_observability::init(self.log_format);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
