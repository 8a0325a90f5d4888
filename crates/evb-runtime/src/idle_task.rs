use std::sync::Arc;
use std::time::{Duration, Instant};

use evb_config::CloseErrorPolicy;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::EventWriter;
use crate::error::RuntimeFault;

pub(crate) const FAULT_CHANNEL_CAPACITY: usize = 16;

/// Parameters of the background idle closer.
pub(crate) struct IdleCloser {
    pub writer: Arc<EventWriter>,
    /// Age after which an open file is closed.
    pub idle_after: Duration,
    /// How often the open file's age is checked.
    pub check_interval: Duration,
    pub on_close_error: CloseErrorPolicy,
    pub fault_tx: mpsc::Sender<RuntimeFault>,
}

/// Periodically close the open batch file once it has been open for
/// `idle_after`, until cancelled.
///
/// Each check runs on the blocking pool since closing flushes and syncs the
/// file while holding the writer lock.
///
/// A failed close is always reported on the fault channel. With
/// [`CloseErrorPolicy::Shutdown`] a close-path failure stops the task with an
/// error; otherwise it keeps ticking.
#[tracing::instrument(name = "idle_closer", skip_all)]
pub(crate) async fn run_idle_closer(
    closer: IdleCloser,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut tick = tokio::time::interval(closer.check_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let writer = Arc::clone(&closer.writer);
                let idle_after = closer.idle_after;
                let outcome =
                    tokio::task::spawn_blocking(move || writer.close_if_idle(idle_after, Instant::now()))
                        .await
                        .map_err(|e| anyhow::anyhow!("idle close worker failed: {e}"))?;
                match outcome {
                    Ok(Some(closed)) => {
                        evb_debug!(res,
                            path = %closed.path.display(),
                            rows = closed.rows,
                            "idle batch file closed"
                        );
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let fatal = closer.on_close_error == CloseErrorPolicy::Shutdown
                            && e.is_fatal_for_background();
                        evb_error!(res, error = %e, fatal, "unable to close expired file");
                        let fault = RuntimeFault {
                            task: "idle_closer",
                            fatal,
                            message: e.to_string(),
                        };
                        if closer.fault_tx.send(fault).await.is_err() {
                            evb_warn!(sys, "fault channel closed, idle close failure not delivered");
                        }
                        if fatal {
                            return Err(anyhow::anyhow!("idle close failed: {e}"));
                        }
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
