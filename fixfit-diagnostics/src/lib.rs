//! # FixFit Diagnostics
//!
//! Debugging and diagnostic tools for FixFit.
//! Provides structured logging setup and analysis latency profiling.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod debug_logger;
pub mod latency_profiler;

// Re-export main types
pub use debug_logger::{init_logging, DebugLogger, DEFAULT_FILTER};
pub use latency_profiler::{LatencyProfiler, LatencyReport};
