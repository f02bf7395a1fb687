//! Builds a [`Config`] from environment-style key/value lookups.
//!
//! Every numeric setting has a documented default. A value that is present
//! but does not parse as the expected type is replaced by that default and a
//! warning is logged; startup never fails because of it.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::{debug, warn};
use secrecy::SecretString;

use super::schema::{
    Config, ImapSettings, LogSettings, DEFAULT_DATABASE_PATH, DEFAULT_IMAP_PORT,
    DEFAULT_IMAP_SERVER, DEFAULT_LINK_CLICK_DELAY, DEFAULT_LOG_LEVEL, DEFAULT_MAILBOX,
    DEFAULT_MAX_EMAILS_PER_SCAN, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_COUNT,
    DEFAULT_SEARCH_CRITERIA,
};
use crate::error::ConfigError;

impl Config {
    /// Loads `.env` from the working directory (if any) and reads the
    /// process environment. Variables already set in the process win over
    /// values from the file.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], but loads the given env file. A missing
    /// file is not an error; a malformed one is.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        match dotenvy::from_path(path) {
            Ok(()) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {
                debug!("No env file at {}, using process environment", path.display())
            }
            Err(source) => {
                return Err(ConfigError::EnvFile {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds a configuration from an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let email_address = get("EMAIL").or_else(|| get("EMAIL_ADDRESS"));
        let email_password = get("PASSWORD")
            .or_else(|| get("EMAIL_PASSWORD"))
            .map(SecretString::from);

        let imap = ImapSettings {
            server: get("IMAP_SERVER").unwrap_or_else(|| DEFAULT_IMAP_SERVER.to_string()),
            port: parse_or_default("IMAP_PORT", get("IMAP_PORT"), DEFAULT_IMAP_PORT),
            mailbox: get("IMAP_MAILBOX").unwrap_or_else(|| DEFAULT_MAILBOX.to_string()),
            search_criteria: get("SEARCH_CRITERIA")
                .unwrap_or_else(|| DEFAULT_SEARCH_CRITERIA.to_string()),
        };

        let max_emails_per_scan = parse_or_default(
            "MAX_EMAILS_PER_SCAN",
            get("MAX_EMAILS_PER_SCAN"),
            DEFAULT_MAX_EMAILS_PER_SCAN,
        );

        let link_click_delay = parse_seconds_f64(
            "LINK_CLICK_DELAY",
            get("LINK_CLICK_DELAY"),
            DEFAULT_LINK_CLICK_DELAY,
        );

        let request_timeout = Duration::from_secs(parse_or_default(
            "REQUEST_TIMEOUT",
            get("REQUEST_TIMEOUT"),
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        ));

        let retry_count =
            parse_or_default("REQUEST_RETRIES", get("REQUEST_RETRIES"), DEFAULT_RETRY_COUNT).max(1);

        let log = LogSettings {
            level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            file: get("LOG_FILE").map(PathBuf::from),
        };

        Self {
            email_address,
            email_password,
            imap,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
            max_emails_per_scan,
            link_click_delay,
            request_timeout,
            retry_count,
            log,
        }
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                "Invalid value '{}' for {}, falling back to default {}",
                value, key, default
            );
            default
        }),
    }
}

fn parse_seconds_f64(key: &str, raw: Option<String>, default: Duration) -> Duration {
    let Some(value) = raw else {
        return default;
    };

    match value.parse::<f64>().ok().map(Duration::try_from_secs_f64) {
        Some(Ok(duration)) => duration,
        _ => {
            warn!(
                "Invalid value '{}' for {}, falling back to default {}s",
                value,
                key,
                default.as_secs_f64()
            );
            default
        }
    }
}
