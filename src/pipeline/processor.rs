//! AccountProcessor — one mailbox account's poll / extract / persist loop body.
//!
//! Each `process_emails()` call:
//! 1. Checks the cycle clock; an expired cycle clears the shared store and
//!    the dedup state.
//! 2. Logs in and fetches the most recent messages (blocking pool, bounded).
//! 3. Admits messages that are new for this cycle and runs each through
//!    the extraction chain into an `EmailRecord`.
//! 4. Appends the batch to the store.
//! 5. Deletes the admitted messages and logs out (blocking pool, bounded).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::cycle::CycleState;
use crate::channels::{FetchedMessage, MailSession, Mailbox};
use crate::config::{AccountConfig, AppConfig};
use crate::error::MailboxError;
use crate::extraction::{Tagger, extract_fields};
use crate::store::{EmailRecord, RecordStore};

/// Per-processor knobs, taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub fetch_limit: usize,
    pub folder: String,
    pub cycle_interval: Duration,
    pub mailbox_timeout: Duration,
    pub tagger_timeout: Duration,
}

impl ProcessorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fetch_limit: config.fetch_limit,
            folder: config.folder.clone(),
            cycle_interval: config.cycle_interval,
            mailbox_timeout: config.mailbox_timeout,
            tagger_timeout: config.tagger_timeout,
        }
    }
}

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub cycle_reset: bool,
    pub fetched: usize,
    pub admitted: usize,
    /// Store total after the append, when a batch was written.
    pub store_total: Option<usize>,
}

pub struct AccountProcessor {
    account: AccountConfig,
    mailbox: Arc<dyn Mailbox>,
    tagger: Arc<dyn Tagger>,
    store: Arc<RecordStore>,
    settings: ProcessorSettings,
    state: CycleState,
}

impl AccountProcessor {
    pub fn new(
        account: AccountConfig,
        mailbox: Arc<dyn Mailbox>,
        tagger: Arc<dyn Tagger>,
        store: Arc<RecordStore>,
        settings: ProcessorSettings,
    ) -> Self {
        Self::starting_at(account, mailbox, tagger, store, settings, Utc::now())
    }

    /// Like [`new`](Self::new) with the first cycle starting at `now`.
    pub fn starting_at(
        account: AccountConfig,
        mailbox: Arc<dyn Mailbox>,
        tagger: Arc<dyn Tagger>,
        store: Arc<RecordStore>,
        settings: ProcessorSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let state = CycleState::new(settings.cycle_interval, now);
        Self {
            account,
            mailbox,
            tagger,
            store,
            settings,
            state,
        }
    }

    pub fn account(&self) -> &AccountConfig {
        &self.account
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Reset the cycle if it has expired at `now`. Returns whether it did.
    ///
    /// The reset clears the whole shared store, not only this account's
    /// records. A failed clear is logged and the state is reset anyway.
    pub async fn check_for_cycle_reset(&mut self, now: DateTime<Utc>) -> bool {
        if !self.state.is_expired(now) {
            return false;
        }

        info!(
            account = %self.account.user,
            seen = self.state.seen_count(),
            "Cycle complete; clearing record store and starting a new cycle"
        );
        if let Err(e) = self.store.clear().await {
            error!(account = %self.account.user, error = %e, "Failed to clear record store");
        }
        self.state.reset(now);
        true
    }

    /// Run one poll against the wall clock.
    pub async fn process_emails(&mut self) -> Result<PollSummary, MailboxError> {
        self.process_emails_at(Utc::now()).await
    }

    /// Run one poll with `now` as the cycle clock.
    ///
    /// Every fetched uid is judged against the watermark as it stood when
    /// the poll began. Messages arrive newest first, so raising the
    /// watermark mid-loop would drop the older new messages of the batch.
    pub async fn process_emails_at(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<PollSummary, MailboxError> {
        let mut summary = PollSummary {
            cycle_reset: self.check_for_cycle_reset(now).await,
            ..Default::default()
        };

        let (session, messages) = self.fetch().await?;
        summary.fetched = messages.len();
        debug!(account = %self.account.user, count = messages.len(), "Fetched messages");

        let watermark = self.state.last_seen_uid();
        let mut batch = Vec::new();
        let mut to_delete = Vec::new();

        for message in &messages {
            if !self.state.admits(message.uid, watermark) {
                continue;
            }

            info!(
                account = %self.account.user,
                uid = message.uid,
                sender = %message.sender,
                subject = %message.subject,
                date = %message.date.to_rfc3339(),
                "New email"
            );
            debug!(uid = message.uid, remarks = %message.body_text, "Email body");

            let fields =
                extract_fields(self.tagger.as_ref(), &message.body_text, self.settings.tagger_timeout)
                    .await;
            debug!(uid = message.uid, ?fields, "Extracted fields");

            batch.push(EmailRecord::new(&self.account, message, fields));
            self.state.mark_seen(message.uid);
            to_delete.push(message.uid);
        }
        summary.admitted = batch.len();

        if batch.is_empty() {
            let remaining = self.state.remaining(now);
            info!(
                account = %self.account.user,
                "No new emails. Next cycle in {}s",
                remaining.as_secs()
            );
        } else {
            match self.store.append(&batch).await {
                Ok(total) => summary.store_total = Some(total),
                Err(e) => error!(
                    account = %self.account.user,
                    count = batch.len(),
                    error = %e,
                    "Failed to append batch; dropping it"
                ),
            }
        }

        self.finish(session, to_delete).await;
        Ok(summary)
    }

    /// Login + fetch on the blocking pool.
    async fn fetch(
        &self,
    ) -> Result<(Box<dyn MailSession>, Vec<FetchedMessage>), MailboxError> {
        let mailbox = Arc::clone(&self.mailbox);
        let account = self.account.clone();
        let folder = self.settings.folder.clone();
        let limit = self.settings.fetch_limit;

        run_blocking(self.settings.mailbox_timeout, move || {
            let mut session = mailbox.login(&account, &folder)?;
            let messages = session.fetch_recent(limit, true)?;
            Ok((session, messages))
        })
        .await
    }

    /// Delete admitted messages and log out. Failures are logged only.
    async fn finish(&self, mut session: Box<dyn MailSession>, uids: Vec<u32>) {
        let user = self.account.user.clone();
        let result = run_blocking(self.settings.mailbox_timeout, move || {
            for uid in uids {
                if let Err(e) = session.delete(uid) {
                    warn!(account = %user, uid, error = %e, "Failed to delete message");
                }
            }
            session.logout()
        })
        .await;

        if let Err(e) = result {
            warn!(account = %self.account.user, error = %e, "Mailbox cleanup failed");
        }
    }
}

/// Run blocking mailbox work off the runtime, bounded by `timeout`.
async fn run_blocking<T, F>(timeout: Duration, f: F) -> Result<T, MailboxError>
where
    F: FnOnce() -> Result<T, MailboxError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(MailboxError::Task(e.to_string())),
        Err(_) => Err(MailboxError::Timeout(timeout)),
    }
}
