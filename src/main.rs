use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use freight_enquiry_extractor::channels::{ImapMailbox, Mailbox};
use freight_enquiry_extractor::config::{AccountConfig, AppConfig};
use freight_enquiry_extractor::extraction::{HttpTagger, Tagger};
use freight_enquiry_extractor::pipeline::{AccountProcessor, ProcessorSettings, spawn_driver};
use freight_enquiry_extractor::store::RecordStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    let accounts = match AccountConfig::load_all_from_env() {
        Ok(accounts) => accounts,
        Err(e) => {
            error!("No usable email accounts: {e}");
            return Err(e.into());
        }
    };

    info!("Freight enquiry extractor v{}", env!("CARGO_PKG_VERSION"));
    info!(
        accounts = accounts.len(),
        store = %config.store_path.display(),
        tagger = %config.tagger_url,
        "Starting email monitoring"
    );

    // ── Collaborators ───────────────────────────────────────────────────
    let tagger: Arc<dyn Tagger> = Arc::new(
        HttpTagger::new(
            config.tagger_url.clone(),
            config.tagger_max_tokens,
            config.tagger_timeout,
        )
        .context("failed to build tagger client")?,
    );
    let mailbox: Arc<dyn Mailbox> = Arc::new(ImapMailbox::new(config.mailbox_timeout));
    let store = Arc::new(RecordStore::new(config.store_path.clone()));
    let settings = ProcessorSettings::from_config(&config);

    let processors = accounts
        .into_iter()
        .map(|account| {
            info!(account = %account.user, host = %account.imap_host, "Monitoring account");
            AccountProcessor::new(
                account,
                Arc::clone(&mailbox),
                Arc::clone(&tagger),
                Arc::clone(&store),
                settings.clone(),
            )
        })
        .collect();

    // ── Driver ──────────────────────────────────────────────────────────
    let (handle, shutdown) = spawn_driver(processors, config.poll_interval);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested; finishing in-flight account");
    shutdown.store(true, Ordering::Relaxed);

    if let Err(e) = handle.await {
        error!("Driver task failed: {e}");
    }
    info!("Email monitoring stopped");
    Ok(())
}

/// Console logging, plus a daily-rolling file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop; keep it alive.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "freight-enquiry-extractor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter())
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .init();
            None
        }
    }
}
