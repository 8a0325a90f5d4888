#[macro_use]
mod log_macros;

pub mod error;
mod idle_task;
pub mod lifecycle;
pub mod receiver;
pub mod tracing_init;

#[cfg(test)]
mod test_support;

use evb_core::batch::RotatingBatchWriter;
use evb_core::event::UserEvent;

/// The writer served by the HTTP ingress.
pub type EventWriter = RotatingBatchWriter<UserEvent>;
