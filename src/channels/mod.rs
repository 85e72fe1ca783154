//! Mailbox I/O.

pub mod email_types;
pub mod imap;
pub mod mailbox;

pub use email_types::parse_message;
pub use imap::ImapMailbox;
pub use mailbox::{FetchedMessage, MailSession, Mailbox};
