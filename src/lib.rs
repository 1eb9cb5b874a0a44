//! Mango profiling - in-process benchmark collector for a compute runtime
//!
//! Features:
//! - Timed buffer reads/writes, kernel executions and resource (de)allocations
//! - One end-to-end sample benchmark with parameters and a success/failure outcome
//! - Console summary and a JSON profile per dump
//! - Explicit profiler instances or a process-wide profiler with a teardown guard

pub mod config;
pub mod error;
pub mod profiling;

pub use config::{ConfigBuilder, ProfilingConfig};
pub use error::{ProfilingError, ProfilingResult};
pub use profiling::{
    BenchmarkCategory, BenchmarkHandle, DumpOutcome, Profiler, ProfilingGuard, ProfilingReport,
    SampleResult,
};

/// Install a `tracing` fmt subscriber. Does nothing if one is already set.
pub fn init_logging() {
    if tracing_subscriber::fmt().try_init().is_ok() {
        tracing::info!("Mango profiling initialized");
    }
}

/// Get the current crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
