use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::{redirect, Client};
use serde::Serialize;

use crate::config::Config;

use super::error::VisitError;

/// Client identifier sent with every visit.
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; mailsweep/",
    env!("CARGO_PKG_VERSION"),
    "; unsubscribe automation)"
);

/// Error recorded for links that fail validation.
pub const INVALID_LINK_MESSAGE: &str = "Invalid link format";

const DISALLOWED_MARKERS: [&str; 4] = ["javascript:", "data:", "file:", "ftp:"];

const MAX_REDIRECTS: usize = 10;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Accepts only `http://` and `https://` URLs that carry no script, data,
/// file or ftp scheme marker anywhere in them.
pub fn validate_link(url: &str) -> bool {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    let lower = url.to_lowercase();
    !DISALLOWED_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorSettings {
    pub timeout: Duration,
    /// Total attempts per link; values below one are treated as one.
    pub retry_count: u32,
    /// Pause between two attempts at the same link.
    pub retry_delay: Duration,
}

impl VisitorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.request_timeout,
            retry_count: config.retry_count,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// The final outcome of visiting one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickOutcome {
    pub success: bool,
    /// Status of the last response received, if any.
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
    /// Duration of the last attempt.
    pub response_time: Duration,
    /// Number of HTTP requests issued.
    pub attempts: u32,
}

impl ClickOutcome {
    /// Outcome of a link rejected before any request.
    pub fn invalid() -> Self {
        Self {
            success: false,
            status_code: None,
            error_message: Some(INVALID_LINK_MESSAGE.to_string()),
            response_time: Duration::ZERO,
            attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkResult {
    pub url: String,
    pub outcome: ClickOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub details: Vec<LinkResult>,
}

/// Visits links with a plain GET, following redirects, and retries failed
/// attempts a bounded number of times.
#[derive(Debug, Clone)]
pub struct LinkVisitor {
    client: Client,
    settings: VisitorSettings,
}

impl LinkVisitor {
    pub fn new(settings: VisitorSettings) -> Result<Self, VisitError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(VisitError::ClientBuild)?;
        Ok(Self { client, settings })
    }

    pub fn from_config(config: &Config) -> Result<Self, VisitError> {
        Self::new(VisitorSettings::from_config(config))
    }

    pub fn settings(&self) -> &VisitorSettings {
        &self.settings
    }

    /// Visits a link. Statuses in `200..400` count as success and end the
    /// retry loop; otherwise the last status or transport error is kept.
    pub async fn click(&self, url: &str) -> ClickOutcome {
        let max_attempts = self.settings.retry_count.max(1);
        let mut outcome = ClickOutcome {
            success: false,
            status_code: None,
            error_message: None,
            response_time: Duration::ZERO,
            attempts: 0,
        };

        for attempt in 1..=max_attempts {
            if attempt > 1 && !self.settings.retry_delay.is_zero() {
                tokio::time::sleep(self.settings.retry_delay).await;
            }

            let started = Instant::now();
            let result = self.client.get(url).send().await;
            outcome.response_time = started.elapsed();
            outcome.attempts = attempt;

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    outcome.status_code = Some(status);
                    if (200..400).contains(&status) {
                        outcome.success = true;
                        outcome.error_message = None;
                        debug!("Visited {} with HTTP {} on attempt {}", url, status, attempt);
                        return outcome;
                    }
                    outcome.error_message = Some(format!("HTTP {}", status));
                }
                Err(e) => {
                    outcome.error_message = Some(describe_transport_error(&e));
                }
            }

            warn!(
                "Attempt {}/{} for {} failed: {}",
                attempt,
                max_attempts,
                url,
                outcome.error_message.as_deref().unwrap_or("unknown error")
            );
        }

        outcome
    }

    /// Visits each link in order, skipping network access for links that
    /// fail validation, and pausing `delay` between consecutive links.
    pub async fn batch<S: AsRef<str>>(&self, links: &[S], delay: Duration) -> BatchSummary {
        let mut summary = BatchSummary {
            total: links.len(),
            ..Default::default()
        };

        for (index, link) in links.iter().enumerate() {
            let url = link.as_ref();
            let outcome = if validate_link(url) {
                if index > 0 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                self.click(url).await
            } else {
                warn!("Skipping invalid link: {}", url);
                ClickOutcome::invalid()
            };

            if outcome.success {
                summary.successful += 1;
            } else {
                summary.failed += 1;
            }
            summary.details.push(LinkResult {
                url: url.to_string(),
                outcome,
            });
        }

        info!(
            "Batch finished: {} successful, {} failed of {}",
            summary.successful, summary.failed, summary.total
        );
        summary
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "Request timeout".to_string()
    } else if err.is_connect() {
        "Connection error".to_string()
    } else {
        err.to_string()
    }
}
