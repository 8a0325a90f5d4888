mod bootstrap;
mod signal;
mod spawn;
mod types;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use orion_error::op_context;
use orion_error::prelude::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use evb_config::EvbConfig;

use crate::EventWriter;
use crate::error::{RuntimeFault, RuntimeReason, RuntimeResult};

// Re-export public API
pub use signal::shutdown_signal;

use bootstrap::build_writer;
use spawn::{fault_channel, spawn_idle_task, spawn_receiver_task};
use types::TaskGroup;

// ---------------------------------------------------------------------------
// Reactor: the top-level lifecycle handle
// ---------------------------------------------------------------------------

/// Manages the full lifecycle of the batch writer service: bootstrap, run,
/// and graceful shutdown.
///
/// Task groups are stored in start order and joined in reverse (LIFO)
/// during [`wait`](Self::wait): the receiver drains in-flight requests
/// first, then the idle closer stops, and finally the open batch file is
/// closed.
pub struct Reactor {
    cancel: CancellationToken,
    /// Cancels the idle closer, triggered only after the receiver has fully
    /// stopped.
    idle_cancel: CancellationToken,
    groups: Vec<TaskGroup>,
    listen_addr: SocketAddr,
    writer: Arc<EventWriter>,
    /// Kept so `fault_rx` never reports a closed channel while the reactor
    /// is alive.
    _fault_tx: mpsc::Sender<RuntimeFault>,
    fault_rx: mpsc::Receiver<RuntimeFault>,
    fatal_fault: Option<RuntimeFault>,
}

impl Reactor {
    /// Bootstrap the service from an [`EvbConfig`] and a base directory (for
    /// resolving a relative `writer.output_dir`).
    ///
    /// Fails with [`RuntimeReason::Bootstrap`] when the output directory is
    /// missing or is not a directory.
    #[tracing::instrument(name = "evbatch.start", skip_all, fields(listen = %config.server.listen))]
    pub async fn start(config: EvbConfig, base_dir: &Path) -> RuntimeResult<Self> {
        let mut op = op_context!("evbatch-bootstrap").with_auto_log();
        op.record("listen", config.server.listen.as_str());
        op.record("base_dir", base_dir.display().to_string().as_str());

        // Phase 1: check output directory, build writer
        let writer = build_writer(&config.writer, base_dir)?;
        evb_info!(
            sys,
            output_dir = %writer.output_dir().display(),
            prefix = %config.writer.file_prefix,
            batch_interval = %config.writer.batch_interval,
            "batch writer ready"
        );

        let reactor = Self::launch(&config, writer).await?;
        op.mark_suc();
        Ok(reactor)
    }

    /// Phase 2: spawn task groups around an already built writer
    /// (start order: idle_closer → receiver).
    async fn launch(config: &EvbConfig, writer: Arc<EventWriter>) -> RuntimeResult<Self> {
        let cancel = CancellationToken::new();
        let idle_cancel = CancellationToken::new();
        let (fault_tx, fault_rx) = fault_channel();
        let mut groups: Vec<TaskGroup> = Vec::with_capacity(2);

        if let Some(group) =
            spawn_idle_task(config, &writer, fault_tx.clone(), idle_cancel.child_token())
        {
            groups.push(group);
        }

        let (listen_addr, receiver_group) =
            spawn_receiver_task(config, Arc::clone(&writer), cancel.clone()).await?;
        groups.push(receiver_group);

        evb_info!(
            sys,
            listen = %listen_addr,
            path = %config.server.path,
            "receiving events"
        );

        Ok(Self {
            cancel,
            idle_cancel,
            groups,
            listen_addr,
            writer,
            _fault_tx: fault_tx,
            fault_rx,
            fatal_fault: None,
        })
    }

    /// Returns the local address the receiver is listening on.
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Returns the shared batch writer.
    pub fn writer(&self) -> &Arc<EventWriter> {
        &self.writer
    }

    /// Returns a clone of the root cancellation token (for signal integration).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Block until a shutdown trigger: SIGINT/SIGTERM, an external cancel of
    /// [`cancel_token`](Self::cancel_token), or a fatal background fault.
    /// Non-fatal faults are logged and waiting continues.
    ///
    /// A received signal also cancels the root token. When signal handlers
    /// cannot be installed the signal branch is disabled.
    pub async fn wait_for_trigger(&mut self) {
        let signal = shutdown_signal();
        tokio::pin!(signal);
        let mut signal_armed = true;
        loop {
            tokio::select! {
                received = &mut signal, if signal_armed => match received {
                    Ok(name) => {
                        evb_info!(sys, signal = name, "received signal, initiating graceful shutdown");
                        self.cancel.cancel();
                        break;
                    }
                    Err(e) => {
                        evb_warn!(sys, error = %e, "signal handlers unavailable, waiting for cancel or fault");
                        signal_armed = false;
                    }
                },
                _ = self.cancel.cancelled() => break,
                Some(fault) = self.fault_rx.recv() => {
                    if fault.fatal {
                        evb_error!(
                            sys,
                            task = fault.task,
                            error = %fault.message,
                            "background task failed, initiating graceful shutdown"
                        );
                        self.fatal_fault = Some(fault);
                        break;
                    }
                    evb_warn!(sys, task = fault.task, error = %fault.message, "background task fault");
                }
            }
        }
    }

    /// Request graceful shutdown of all tasks.
    pub fn shutdown(&self) {
        evb_info!(sys, "initiating graceful shutdown");
        self.cancel.cancel();
    }

    /// Wait for all task groups to complete after shutdown, then close the
    /// open batch file.
    ///
    /// Groups are joined in LIFO order: receiver → idle_closer. The idle
    /// closer is cancelled only after the receiver has stopped. The final
    /// close runs even when a group failed. A fatal fault seen by
    /// [`wait_for_trigger`](Self::wait_for_trigger) is reported as
    /// [`RuntimeReason::Fault`]; otherwise the first group error is returned.
    pub async fn wait(mut self) -> RuntimeResult<()> {
        let mut first_err = None;
        while let Some(group) = self.groups.pop() {
            let name = group.name;
            evb_debug!(sys, task_group = name, "waiting for task group to finish");
            if let Err(e) = group.wait().await {
                evb_error!(sys, task_group = name, error = %e, "task group failed");
                first_err.get_or_insert(e);
            }
            evb_debug!(sys, task_group = name, "task group finished");

            if name == "receiver" {
                self.idle_cancel.cancel();
            }
        }

        let writer = Arc::clone(&self.writer);
        let closed = tokio::task::spawn_blocking(move || writer.close_active_session())
            .await
            .map_err(|e| {
                StructError::from(RuntimeReason::Shutdown)
                    .with_detail(format!("final close join error: {e}"))
            })?
            .map_err(|e| {
                StructError::from(RuntimeReason::Core(e.core_reason()))
                    .with_detail(format!("final close failed: {e}"))
            })?;
        if let Some(closed) = closed {
            evb_info!(
                res,
                path = %closed.path.display(),
                rows = closed.rows,
                "final batch file closed"
            );
        }

        let stats = self.writer.stats();
        evb_info!(
            sys,
            files = stats.files_opened,
            rows = stats.rows_written,
            rotations = stats.rotations,
            idle_closes = stats.idle_closes,
            "batch writer stopped"
        );

        if let Some(fault) = self.fatal_fault {
            return Err(StructError::from(RuntimeReason::Fault)
                .with_detail(format!("{}: {}", fault.task, fault.message)));
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
