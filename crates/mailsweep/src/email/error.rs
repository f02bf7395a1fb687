//! Mailbox error types.

use thiserror::Error;

/// Errors that can occur while talking to the mailbox or reading messages.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Address or password missing from the configuration.
    #[error("Credentials not configured: {0}")]
    CredentialsMissing(&'static str),

    /// IMAP protocol error.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse email message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// Mailbox not found.
    #[error("IMAP mailbox '{0}' not found")]
    MailboxNotFound(String),

    /// An operation was attempted before `connect`.
    #[error("Not connected to the mailbox")]
    NotConnected,
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

/// Result type for email operations.
pub type Result<T> = std::result::Result<T, EmailError>;
