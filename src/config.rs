//! Configuration types.
//!
//! Everything is read from the process environment (a `.env` file is loaded
//! by the binary first). Parsing goes through a lookup closure so tests can
//! feed a map instead of touching the real environment.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default IMAP host when `IMAP_URL_n` is unset.
pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";

/// Default number of account slots scanned (`*_1` .. `*_3`).
const DEFAULT_ACCOUNT_SLOTS: usize = 3;

/// Default business ids for the first account slots:
/// (companyId, companyBranchId, financialYearId, clientId, id).
const SLOT_ID_DEFAULTS: [(i64, i64, i64, i64, i64); 3] =
    [(1, 2, 3, 7, 6), (2, 4, 3, 9, 8), (3, 3, 5, 7, 5)];

/// Process-wide settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JSON file holding every extracted record.
    pub store_path: PathBuf,
    /// Sleep between driver ticks.
    pub poll_interval: Duration,
    /// Length of one dedup cycle; the store is cleared when it elapses.
    pub cycle_interval: Duration,
    /// Maximum messages fetched per poll, newest first.
    pub fetch_limit: usize,
    /// Folder selected at login.
    pub folder: String,
    /// Upper bound on each blocking mailbox phase (login+fetch, delete+logout).
    pub mailbox_timeout: Duration,
    /// Token-classification endpoint.
    pub tagger_url: String,
    /// Upper bound on one inference call.
    pub tagger_timeout: Duration,
    /// Token window of the model, boundary markers included.
    pub tagger_max_tokens: usize,
    /// Optional directory for a daily-rolling log file.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("email_data.json"),
            poll_interval: Duration::from_secs(2),
            cycle_interval: Duration::from_secs(120), // 2 minutes
            fetch_limit: 20,
            folder: "INBOX".to_string(),
            mailbox_timeout: Duration::from_secs(60),
            tagger_url: "http://127.0.0.1:8000/predict".to_string(),
            tagger_timeout: Duration::from_secs(30),
            tagger_max_tokens: 128,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store_path = lookup("RECORD_STORE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let poll_interval = secs_or(&lookup, "POLL_INTERVAL_SECS", defaults.poll_interval)?;
        let cycle_interval = secs_or(&lookup, "CYCLE_INTERVAL_SECS", defaults.cycle_interval)?;
        let mailbox_timeout =
            secs_or(&lookup, "MAILBOX_TIMEOUT_SECS", defaults.mailbox_timeout)?;
        let tagger_timeout = secs_or(&lookup, "TAGGER_TIMEOUT_SECS", defaults.tagger_timeout)?;

        let fetch_limit = parse_or(&lookup, "FETCH_LIMIT", defaults.fetch_limit)?;
        if fetch_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FETCH_LIMIT".into(),
                message: "must be at least 1".into(),
            });
        }

        let tagger_max_tokens = parse_or(&lookup, "TAGGER_MAX_TOKENS", defaults.tagger_max_tokens)?;
        if tagger_max_tokens < 3 {
            return Err(ConfigError::InvalidValue {
                key: "TAGGER_MAX_TOKENS".into(),
                message: "must leave room for [CLS] and [SEP]".into(),
            });
        }

        let folder = lookup("MAILBOX_FOLDER")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.folder);
        let tagger_url = lookup("TAGGER_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.tagger_url);
        let log_dir = lookup("LOG_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            store_path,
            poll_interval,
            cycle_interval,
            fetch_limit,
            folder,
            mailbox_timeout,
            tagger_url,
            tagger_timeout,
            tagger_max_tokens,
            log_dir,
        })
    }
}

/// One mailbox account and the business ids stamped on its records.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub company_id: i64,
    pub company_branch_id: i64,
    pub financial_year_id: i64,
    pub client_id: i64,
    pub record_id: i64,
    pub user: String,
    pub password: SecretString,
    pub imap_host: String,
    pub imap_port: u16,
}

impl AccountConfig {
    /// Load every configured account from environment variables.
    ///
    /// Fails with [`ConfigError::NoAccounts`] when no slot has both a user
    /// and a password.
    pub fn load_all_from_env() -> Result<Vec<Self>, ConfigError> {
        Self::load_all(|key| std::env::var(key).ok())
    }

    /// Load every configured account from an arbitrary key lookup.
    pub fn load_all<F>(lookup: F) -> Result<Vec<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = parse_or(&lookup, "EMAIL_ACCOUNT_SLOTS", DEFAULT_ACCOUNT_SLOTS)?;

        let mut accounts = Vec::new();
        for slot in 1..=slots {
            if let Some(account) = Self::from_slot(slot, &lookup)? {
                accounts.push(account);
            }
        }

        if accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }
        Ok(accounts)
    }

    /// Read account slot `n`. Returns `None` when user or password is missing.
    fn from_slot<F>(n: usize, lookup: &F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user = lookup(&format!("EMAIL_USER_{n}")).unwrap_or_default();
        let password = lookup(&format!("EMAIL_PASSWORD_{n}")).unwrap_or_default();
        if user.trim().is_empty() || password.is_empty() {
            return Ok(None);
        }

        let (company, branch, year, client, id) =
            SLOT_ID_DEFAULTS.get(n - 1).copied().unwrap_or_default();

        let imap_host = lookup(&format!("IMAP_URL_{n}"))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMAP_HOST.to_string());

        Ok(Some(Self {
            company_id: parse_or(lookup, &format!("COMPANY_ID_{n}"), company)?,
            company_branch_id: parse_or(lookup, &format!("COMPANY_BRANCH_ID_{n}"), branch)?,
            financial_year_id: parse_or(lookup, &format!("FINANCIAL_YEAR_ID_{n}"), year)?,
            client_id: parse_or(lookup, &format!("CLIENT_ID_{n}"), client)?,
            record_id: parse_or(lookup, &format!("ID_{n}"), id)?,
            user: user.trim().to_string(),
            password: SecretString::from(password),
            imap_host,
            imap_port: parse_or(lookup, &format!("IMAP_PORT_{n}"), 993)?,
        }))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_or(lookup, key, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
