//! IMAP client for reading the mailbox.

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{Config, ImapSettings};

use super::error::{EmailError, Result};
use super::source::MailSource;

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<std::net::TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// IMAP client that opens the mailbox read-only and never marks messages
/// as seen.
pub struct ImapClient {
    session: Option<Session<TlsStream>>,
    settings: ImapSettings,
    username: String,
    password: SecretString,
}

impl ImapClient {
    pub fn new(settings: ImapSettings, username: &str, password: SecretString) -> Self {
        Self {
            session: None,
            settings,
            username: username.to_string(),
            password,
        }
    }

    /// Builds a client from the application configuration. Fails when the
    /// address or password is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let username = config
            .email_address
            .as_deref()
            .ok_or(EmailError::CredentialsMissing("email address"))?;
        let password = config
            .email_password
            .clone()
            .ok_or(EmailError::CredentialsMissing("email password"))?;
        Ok(Self::new(config.imap.clone(), username, password))
    }

    /// Connects to the IMAP server, authenticates and opens the mailbox.
    pub async fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            debug!("Already connected to IMAP server");
            return Ok(());
        }

        let addr = format!("{}:{}", self.settings.server, self.settings.port);
        info!("Connecting to IMAP server at {}", addr);

        // Establish TCP connection using std::net and wrap with async-io
        let std_stream = std::net::TcpStream::connect(&addr)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        std_stream
            .set_nonblocking(true)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        let tcp_stream = async_io::Async::new(std_stream)
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;

        let tls = TlsConnector::new();
        let tls_stream = tls.connect(&self.settings.server, tcp_stream).await?;

        let client = async_imap::Client::new(tls_stream);
        let session = client
            .login(&self.username, self.password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!("Successfully authenticated to IMAP server");
        self.session = Some(session);

        let mailbox = self.settings.mailbox.clone();
        if let Err(e) = self.examine(&mailbox).await {
            // Leave no half-open session behind.
            let _ = self.disconnect().await;
            return Err(e);
        }
        Ok(())
    }

    fn session(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session.as_mut().ok_or(EmailError::NotConnected)
    }

    /// Opens a mailbox in read-only mode using EXAMINE (not SELECT).
    async fn examine(&mut self, mailbox: &str) -> Result<u32> {
        let session = self.session()?;

        info!("Examining mailbox: {}", mailbox);

        let opened = session.examine(mailbox).await.map_err(|e| {
            if e.to_string().contains("Mailbox doesn't exist") || e.to_string().contains("NO") {
                EmailError::MailboxNotFound(mailbox.to_string())
            } else {
                EmailError::ProtocolError(e.to_string())
            }
        })?;

        debug!("Mailbox '{}' holds {} messages", mailbox, opened.exists);
        Ok(opened.exists)
    }

    /// Runs a UID search and keeps the most recent `limit` matches.
    pub async fn search(&mut self, criteria: &str, limit: Option<usize>) -> Result<Vec<u32>> {
        let session = self.session()?;

        debug!("Searching with query: {}", criteria);

        let uids = session
            .uid_search(criteria)
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let found = uids.len();
        let selected = select_recent(uids, limit);
        debug!("Found {} messages, keeping {}", found, selected.len());
        Ok(selected)
    }

    /// Fetches a message by UID using BODY.PEEK[] to avoid marking it as read.
    pub async fn fetch(&mut self, uid: u32) -> Result<Vec<u8>> {
        let session = self.session()?;

        debug!("Fetching email with UID {}", uid);

        let messages = session
            .uid_fetch(uid.to_string(), "BODY.PEEK[]")
            .await
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let message = first_and_drain(messages)
            .await
            .ok_or_else(|| {
                EmailError::ProtocolError(format!("Message with UID {} not found", uid))
            })?
            .map_err(|e| EmailError::ProtocolError(e.to_string()))?;

        let body = message
            .body()
            .ok_or_else(|| EmailError::ProtocolError("Message has no body".to_string()))?;

        Ok(body.to_vec())
    }

    /// Disconnects from the IMAP server gracefully.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            session
                .logout()
                .await
                .map_err(|e| EmailError::ProtocolError(e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapClient dropped without explicit disconnect - session will be closed");
        }
    }
}

#[async_trait(?Send)]
impl MailSource for ImapClient {
    async fn connect(&mut self) -> Result<()> {
        ImapClient::connect(self).await
    }

    async fn search(&mut self, criteria: &str, limit: Option<usize>) -> Result<Vec<u32>> {
        ImapClient::search(self, criteria, limit).await
    }

    async fn fetch(&mut self, id: u32) -> Result<Vec<u8>> {
        ImapClient::fetch(self, id).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        ImapClient::disconnect(self).await
    }
}

/// Returns the first item of a response stream after reading the stream to
/// its end, so no responses are left pending for the next command.
async fn first_and_drain<S, T>(mut stream: S) -> Option<T>
where
    S: Stream<Item = T> + Unpin,
{
    let first = stream.next().await;
    while stream.next().await.is_some() {}
    first
}

/// Sorts identifiers ascending and keeps the last `limit` of them.
pub fn select_recent<I>(ids: I, limit: Option<usize>) -> Vec<u32>
where
    I: IntoIterator<Item = u32>,
{
    let mut ids: Vec<u32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if let Some(limit) = limit {
        let skip = ids.len().saturating_sub(limit);
        ids.drain(..skip);
    }
    ids
}
