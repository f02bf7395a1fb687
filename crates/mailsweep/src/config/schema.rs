use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_IMAP_SERVER: &str = "imap.gmail.com";
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_MAILBOX: &str = "INBOX";
pub const DEFAULT_SEARCH_CRITERIA: &str = "(BODY \"unsubscribe\")";
pub const DEFAULT_DATABASE_PATH: &str = "email_automation.db";
pub const DEFAULT_MAX_EMAILS_PER_SCAN: usize = 100;
pub const DEFAULT_LINK_CLICK_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RETRY_COUNT: u32 = 2;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Immutable application settings, built once at startup and handed to each
/// component when it is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub email_address: Option<String>,
    pub email_password: Option<SecretString>,
    pub imap: ImapSettings,
    pub database_path: PathBuf,
    /// Upper bound on messages examined per scan. `0` disables the bound.
    pub max_emails_per_scan: usize,
    /// Pause between two consecutive link visits in an unsubscribe run.
    pub link_click_delay: Duration,
    pub request_timeout: Duration,
    /// Total number of HTTP attempts per link (always at least one).
    pub retry_count: u32,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapSettings {
    pub server: String,
    pub port: u16,
    pub mailbox: String,
    pub search_criteria: String,
}

impl Default for ImapSettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_IMAP_SERVER.to_string(),
            port: DEFAULT_IMAP_PORT,
            mailbox: DEFAULT_MAILBOX.to_string(),
            search_criteria: DEFAULT_SEARCH_CRITERIA.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            email_address: None,
            email_password: None,
            imap: ImapSettings::default(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_emails_per_scan: DEFAULT_MAX_EMAILS_PER_SCAN,
            link_click_delay: DEFAULT_LINK_CLICK_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            log: LogSettings::default(),
        }
    }
}

impl Config {
    /// Checks that the settings needed to reach the mailbox are present.
    ///
    /// Never touches stored data; the error message is meant to be shown
    /// to the user as-is.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email_address.is_none() {
            return Err(ConfigError::Validation {
                message: "Email address not configured. Please set EMAIL or EMAIL_ADDRESS in .env"
                    .to_string(),
            });
        }

        if self.email_password.is_none() {
            return Err(ConfigError::Validation {
                message:
                    "Email password not configured. Please set PASSWORD or EMAIL_PASSWORD in .env"
                        .to_string(),
            });
        }

        Ok(())
    }

    /// Returns a copy of this configuration with the given credentials.
    pub fn with_credentials(&self, email_address: &str, password: &str) -> Self {
        Self {
            email_address: Some(email_address.to_string()),
            email_password: Some(SecretString::from(password.to_string())),
            ..self.clone()
        }
    }

    /// The per-scan message limit, or `None` when unbounded.
    pub fn scan_limit(&self) -> Option<usize> {
        (self.max_emails_per_scan > 0).then_some(self.max_emails_per_scan)
    }
}
