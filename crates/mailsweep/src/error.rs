use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailsweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Email error: {0}")]
    Email(#[from] crate::email::EmailError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Link visitor error: {0}")]
    Visit(#[from] crate::visitor::VisitError),

    #[error("Failed to write export '{path}': {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load env file '{path}': {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("{message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file '{path}': {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, MailsweepError>;
