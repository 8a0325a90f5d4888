use std::net::SocketAddr;
use std::sync::Arc;

use orion_error::compat_prelude::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use evb_config::EvbConfig;

use crate::EventWriter;
use crate::error::{RuntimeFault, RuntimeResult};
use crate::idle_task::{self, IdleCloser};
use crate::receiver::{Receiver, ingest_router};

use super::types::TaskGroup;

// ---------------------------------------------------------------------------
// Phase 2: task spawn helpers
// ---------------------------------------------------------------------------

/// Spawn the idle closer, or nothing when `auto_close_after` is zero.
pub(super) fn spawn_idle_task(
    config: &EvbConfig,
    writer: &Arc<EventWriter>,
    fault_tx: mpsc::Sender<RuntimeFault>,
    cancel: CancellationToken,
) -> Option<TaskGroup> {
    let idle_after = config.writer.idle_close_after()?;
    let closer = IdleCloser {
        writer: Arc::clone(writer),
        idle_after,
        check_interval: config.writer.idle_check_interval(),
        on_close_error: config.writer.on_close_error,
        fault_tx,
    };
    evb_debug!(
        res,
        idle_after = ?closer.idle_after,
        check_interval = ?closer.check_interval,
        "idle closer enabled"
    );
    let mut group = TaskGroup::new("idle_closer");
    group.push(tokio::spawn(idle_task::run_idle_closer(closer, cancel)));
    Some(group)
}

/// Bind the HTTP receiver and spawn its task.
/// Returns (listen_addr, task_group).
pub(super) async fn spawn_receiver_task(
    config: &EvbConfig,
    writer: Arc<EventWriter>,
    cancel: CancellationToken,
) -> RuntimeResult<(SocketAddr, TaskGroup)> {
    let router = ingest_router(
        &config.server.path,
        writer,
        config.server.max_body_bytes.as_bytes(),
    );
    let receiver = Receiver::bind(&config.server.listen, router)
        .await
        .owe_sys()?;
    let listen_addr = receiver.local_addr().owe_sys()?;
    let receiver_cancel = receiver.cancel_token();
    tokio::spawn(async move {
        cancel.cancelled().await;
        receiver_cancel.cancel();
    });
    let mut group = TaskGroup::new("receiver");
    group.push(tokio::spawn(async move { receiver.run().await }));
    Ok((listen_addr, group))
}

/// Fault channel shared by background tasks.
pub(super) fn fault_channel() -> (mpsc::Sender<RuntimeFault>, mpsc::Receiver<RuntimeFault>) {
    mpsc::channel(idle_task::FAULT_CHANNEL_CAPACITY)
}
