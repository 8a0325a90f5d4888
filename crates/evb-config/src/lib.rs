pub mod evb;
pub mod logging;
pub mod server;
pub mod types;
mod validate;
pub mod writer;

pub use evb::EvbConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use types::{ByteSize, CloseErrorPolicy, HumanDuration};
pub use writer::WriterConfig;
