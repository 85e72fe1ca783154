//! Driver loop — ticks every account processor in turn.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::processor::AccountProcessor;

/// Spawn the background driver over `processors`.
///
/// Each pass polls the accounts sequentially, then rests `poll_interval`
/// before the next pass starts. One account's error is logged and never
/// stops the others. Returns a `JoinHandle` and a shutdown flag; once the
/// flag is set the loop exits between accounts or after the rest, once the
/// in-flight account has closed its session.
pub fn spawn_driver(
    mut processors: Vec<AccountProcessor>,
    poll_interval: Duration,
) -> (JoinHandle<()>, Arc<AtomicBool>) {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);

    let handle = tokio::spawn(async move {
        info!(
            "Driver started — {} account(s), resting {}s between passes",
            processors.len(),
            poll_interval.as_secs_f32()
        );

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Driver shutting down");
                return;
            }

            debug!("Checking all accounts");
            for processor in processors.iter_mut() {
                if shutdown.load(Ordering::Relaxed) {
                    info!("Driver shutting down");
                    return;
                }
                poll_account(processor).await;
            }

            // The rest is measured from the end of the pass.
            tokio::time::sleep(poll_interval).await;
        }
    });

    (handle, shutdown_flag)
}

async fn poll_account(processor: &mut AccountProcessor) {
    match processor.process_emails().await {
        Ok(summary) => debug!(
            account = %processor.account().user,
            fetched = summary.fetched,
            admitted = summary.admitted,
            "Account polled"
        ),
        Err(e) => error!(
            account = %processor.account().user,
            error = %e,
            "Error processing account"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn driver_with_no_accounts_stops_on_flag() {
        let (handle, shutdown) = spawn_driver(Vec::new(), Duration::from_millis(10));
        shutdown.store(true, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("driver did not stop")
            .unwrap();
    }
}
