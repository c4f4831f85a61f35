//! Throughput benchmark built around a single synchronous loop.
//!
//! A [`driver::BenchmarkLoop`] pulls frames, runs one inference per frame and
//! draws timing text. Standalone executables present the result in a local
//! window; the web executables wrap the loop in a [`stream::FrameStream`]
//! served by [`server`].

pub mod config;
pub mod data;
pub mod display;
pub mod driver;
pub mod encoding;
pub mod overlay;
pub mod present;
pub mod server;
pub mod signal;
pub mod standalone;
pub mod stats;
pub mod stream;
pub mod telemetry;

pub use config::{BackendKind, BenchConfig, OverlayStyle, Presentation};
pub use data::{ProcessedFrame, StepOutcome, StopReason};
pub use driver::{BenchmarkLoop, FrameFeed, warm_up};
pub use present::{Control, Presenter, ProgressReporter};
pub use server::{StreamContext, configure_routes, serve};
pub use standalone::{run_benchmark, run_standalone};
pub use stats::{RunStats, RunSummary, frames_per_second};
pub use stream::FrameStream;
