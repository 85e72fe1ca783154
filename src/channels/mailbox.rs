//! Mailbox abstraction consumed by the account processor.
//!
//! Implementations are blocking; the processor runs them on the blocking
//! thread pool under a timeout.

use chrono::{DateTime, FixedOffset};

use crate::config::AccountConfig;
use crate::error::MailboxError;

/// A message pulled from the server.
#[derive(Debug, Clone)]
pub struct FetchedMessage {
    pub uid: u32,
    pub subject: String,
    pub sender: String,
    pub date: DateTime<FixedOffset>,
    pub body_text: String,
}

/// Opens authenticated sessions against one kind of mail server.
pub trait Mailbox: Send + Sync {
    /// Log in and select `folder`.
    fn login(
        &self,
        account: &AccountConfig,
        folder: &str,
    ) -> Result<Box<dyn MailSession>, MailboxError>;
}

/// An open, folder-selected session.
///
/// Implementations must release the connection when dropped without an
/// explicit [`MailSession::logout`].
pub trait MailSession: Send {
    /// Fetch up to `limit` of the most recent messages, newest first.
    fn fetch_recent(
        &mut self,
        limit: usize,
        mark_seen: bool,
    ) -> Result<Vec<FetchedMessage>, MailboxError>;

    /// Remove a message from the folder.
    fn delete(&mut self, uid: u32) -> Result<(), MailboxError>;

    /// Close the session.
    fn logout(self: Box<Self>) -> Result<(), MailboxError>;
}
