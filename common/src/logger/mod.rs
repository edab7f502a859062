mod init;
mod macros;
mod trace_id;

pub use init::init_logger;
pub use macros::root_span;
pub use trace_id::TraceId;
