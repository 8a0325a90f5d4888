pub mod batch;
pub mod error;
pub mod event;
