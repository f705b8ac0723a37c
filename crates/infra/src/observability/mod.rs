//! Observability helpers exposed alongside the schedulers.

pub mod log_stream;

pub use log_stream::LogStream;
