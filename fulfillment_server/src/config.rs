use std::{env, time::Duration};

use log::*;
use messaging_tools::{SmsConfig, WhatsAppConfig};
use tour_common::{
    helpers::{parse_boolean_flag, parse_number},
    Secret,
};

const DEFAULT_TFS_HOST: &str = "127.0.0.1";
const DEFAULT_TFS_PORT: u16 = 8370;
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BADGE_VALIDITY_DAYS: i64 = 1;
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 300;
const DEFAULT_RETRY_DEADLINE_MINS: i64 = 5;
const DEFAULT_RETRY_MAX_ATTEMPTS: i64 = 3;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Payment gateway webhooks are signed with this secret.
    pub payment_hmac: HmacConfig,
    /// Messaging provider delivery callbacks are signed with this secret.
    pub callback_hmac: HmacConfig,
    /// The upper bound on a single provider send.
    pub send_timeout: Duration,
    pub badge_validity_days: i64,
    pub retry: RetryConfig,
    pub sms: SmsConfig,
    pub whatsapp: WhatsAppConfig,
}

#[derive(Clone, Debug, Default)]
pub struct HmacConfig {
    pub secret: Secret<String>,
    /// If false, signatures are not checked at all. Only use this in development.
    pub checks: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct RetryConfig {
    /// How often the retry worker wakes up. Zero disables the worker.
    pub interval: Duration,
    /// Only messages untouched for at least this long are retried.
    pub deadline: chrono::Duration,
    pub max_attempts: i64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            deadline: chrono::Duration::minutes(DEFAULT_RETRY_DEADLINE_MINS),
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
        }
    }
}

impl RetryConfig {
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TFS_HOST.to_string(),
            port: DEFAULT_TFS_PORT,
            database_url: String::default(),
            payment_hmac: HmacConfig::default(),
            callback_hmac: HmacConfig::default(),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            badge_validity_days: DEFAULT_BADGE_VALIDITY_DAYS,
            retry: RetryConfig::default(),
            sms: SmsConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TFS_HOST").ok().unwrap_or_else(|| DEFAULT_TFS_HOST.into());
        let port = env::var("TFS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TFS_PORT. {e} Using the default, {DEFAULT_TFS_PORT}, instead."
                    );
                    DEFAULT_TFS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TFS_PORT);
        let database_url = env::var("TFS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TFS_DATABASE_URL is not set. Please set it to the URL for the fulfillment database.");
            String::default()
        });
        let payment_hmac = HmacConfig::from_env("TFS_PAYMENT_HMAC_SECRET", "TFS_PAYMENT_HMAC_CHECKS");
        let callback_hmac = HmacConfig::from_env("TFS_CALLBACK_HMAC_SECRET", "TFS_CALLBACK_HMAC_CHECKS");
        let send_timeout =
            Duration::from_secs(parse_number(env::var("TFS_SEND_TIMEOUT_SECS").ok(), DEFAULT_SEND_TIMEOUT_SECS));
        let badge_validity_days = parse_number(env::var("TFS_BADGE_VALIDITY_DAYS").ok(), DEFAULT_BADGE_VALIDITY_DAYS);
        if badge_validity_days < 1 {
            warn!("🪛️ TFS_BADGE_VALIDITY_DAYS must be at least 1. Badges will be valid for one day.");
        }
        let retry = RetryConfig::from_env();
        let sms = SmsConfig::new_from_env_or_default();
        let whatsapp = WhatsAppConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            payment_hmac,
            callback_hmac,
            send_timeout,
            badge_validity_days: badge_validity_days.max(1),
            retry,
            sms,
            whatsapp,
        }
    }
}

impl HmacConfig {
    pub fn new(secret: &str, checks: bool) -> Self {
        Self { secret: Secret::new(secret.to_string()), checks }
    }

    fn from_env(secret_var: &str, checks_var: &str) -> Self {
        let checks = parse_boolean_flag(env::var(checks_var).ok(), true);
        let secret = env::var(secret_var).ok().unwrap_or_else(|| {
            if checks {
                error!("🪛️ {secret_var} is not set. Every signed request on these routes will be rejected.");
            }
            String::default()
        });
        if !checks {
            warn!("🚨️ {checks_var} is false. Signatures on these routes are NOT being checked.");
        }
        Self { secret: Secret::new(secret), checks }
    }
}

impl RetryConfig {
    fn from_env() -> Self {
        let interval = parse_number(env::var("TFS_RETRY_INTERVAL_SECS").ok(), DEFAULT_RETRY_INTERVAL_SECS);
        if interval == 0 {
            info!("🪛️ TFS_RETRY_INTERVAL_SECS is 0. Failed messages will not be retried automatically.");
        }
        let deadline = parse_number(env::var("TFS_RETRY_DEADLINE_MINS").ok(), DEFAULT_RETRY_DEADLINE_MINS);
        let max_attempts = parse_number(env::var("TFS_RETRY_MAX_ATTEMPTS").ok(), DEFAULT_RETRY_MAX_ATTEMPTS);
        Self {
            interval: Duration::from_secs(interval),
            deadline: chrono::Duration::minutes(deadline.max(0)),
            max_attempts: max_attempts.max(1),
        }
    }
}
