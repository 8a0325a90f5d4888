//! Leveled logging macros that tag every event with a `domain` field.
//!
//! Domains used by evbatch:
//!
//! * `sys`: reactor lifecycle, signals, background faults
//! * `conn`: HTTP receiver
//! * `pipe`: request bodies flowing into the batch writer
//! * `res`: batch files closed outside a request
//!
//! ```ignore
//! evb_info!(sys, listen = %addr, "receiving events");
//! evb_debug!(res, path = %closed.path.display(), "idle batch file closed");
//! ```

macro_rules! evb_error {
    ($domain:ident, $($rest:tt)+) => {
        tracing::event!(tracing::Level::ERROR, domain = stringify!($domain), $($rest)+)
    };
}

macro_rules! evb_warn {
    ($domain:ident, $($rest:tt)+) => {
        tracing::event!(tracing::Level::WARN, domain = stringify!($domain), $($rest)+)
    };
}

macro_rules! evb_info {
    ($domain:ident, $($rest:tt)+) => {
        tracing::event!(tracing::Level::INFO, domain = stringify!($domain), $($rest)+)
    };
}

macro_rules! evb_debug {
    ($domain:ident, $($rest:tt)+) => {
        tracing::event!(tracing::Level::DEBUG, domain = stringify!($domain), $($rest)+)
    };
}

macro_rules! evb_trace {
    ($domain:ident, $($rest:tt)+) => {
        tracing::event!(tracing::Level::TRACE, domain = stringify!($domain), $($rest)+)
    };
}
