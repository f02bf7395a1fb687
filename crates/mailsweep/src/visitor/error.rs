use thiserror::Error;

/// Errors that prevent the visitor from being used at all. Failures of an
/// individual visit are reported in its `ClickOutcome` instead.
#[derive(Error, Debug)]
pub enum VisitError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
