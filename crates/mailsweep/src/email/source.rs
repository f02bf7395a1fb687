use async_trait::async_trait;

use super::error::Result;

/// A mailbox the scan flow can read messages from.
///
/// Identifiers returned by `search` are only meaningful to the same source
/// and only for the lifetime of one connection.
#[async_trait(?Send)]
pub trait MailSource {
    /// Opens the connection and the configured mailbox.
    async fn connect(&mut self) -> Result<()>;

    /// Returns matching message identifiers in ascending order. With a
    /// limit, only the most recent `limit` matches are returned.
    async fn search(&mut self, criteria: &str, limit: Option<usize>) -> Result<Vec<u32>>;

    /// Fetches the full raw message.
    async fn fetch(&mut self, id: u32) -> Result<Vec<u8>>;

    async fn disconnect(&mut self) -> Result<()>;
}
