//! Error types for the enquiry extractor.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("No valid email accounts found. Set EMAIL_USER_n and EMAIL_PASSWORD_n.")]
    NoAccounts,
}

/// Mailbox login / fetch / delete failures. Scoped to one account poll.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Connection to {host} failed: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Authentication failed for {user}")]
    AuthFailed { user: String },

    #[error("IMAP protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Mailbox operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Mailbox task failed: {0}")]
    Task(String),
}

/// Tagger failures. Callers degrade to empty fields instead of propagating.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Tagger request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid tagger response: {0}")]
    InvalidResponse(String),

    #[error("Unknown label from tagger: {0}")]
    UnknownLabel(String),

    #[error("Tagger timed out after {0:?}")]
    Timeout(Duration),
}

/// Record store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_lift_into_top_level() {
        let err: Error = MailboxError::AuthFailed {
            user: "ops@example.com".into(),
        }
        .into();
        assert!(matches!(err, Error::Mailbox(_)));
        assert_eq!(
            err.to_string(),
            "Mailbox error: Authentication failed for ops@example.com"
        );

        let err: Error = ConfigError::NoAccounts.into();
        assert!(matches!(err, Error::Config(ConfigError::NoAccounts)));
    }

    #[test]
    fn store_io_error_names_the_path() {
        let err = StoreError::Io {
            path: PathBuf::from("/tmp/email_data.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "IO error on '/tmp/email_data.json': denied");
    }
}
