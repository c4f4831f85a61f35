//! Standalone runs: one benchmark loop presented locally, then a summary.

use std::sync::{Arc, atomic::AtomicBool};

use anyhow::{Context, Result};
use ml_core::ScopedBackend;
use tracing::{error, info};
use video_ingest::{FrameSource, OpenCvCamera};

use crate::bench::{
    config::BenchConfig,
    data::StopReason,
    display::Window,
    driver::{BenchmarkLoop, FrameFeed, warm_up},
    present::{Presenter, ProgressReporter},
    signal,
    stats::RunSummary,
};

/// Open the camera (falling back to placeholder frames), run the loop with a
/// window or console progress, and print the summary.
pub fn run_standalone<E: ScopedBackend>(config: &BenchConfig, engine: &mut E) -> Result<RunSummary> {
    let feed = FrameFeed::open_or_placeholder(
        OpenCvCamera::open(config.camera_index),
        config.dummy_frame_limit,
    );
    let mut presenter: Box<dyn Presenter> = if feed.is_placeholder() {
        Box::new(ProgressReporter::new(
            config.progress_interval,
            config.dummy_frame_limit,
        ))
    } else {
        println!("Starting inference loop. Press 'q' to exit.");
        Box::new(Window::open(config.window_title)?)
    };

    let summary = run_benchmark(config, engine, feed, presenter.as_mut(), signal::shutdown_flag())?;
    println!("{}", summary.report(config.backend.label()));
    Ok(summary)
}

/// Activate the engine, warm it up, then loop until a stop condition.
///
/// The presenter is closed and the frame source released on every exit
/// path once warmup has succeeded. An error inside the loop is logged and
/// ends the run like any other stop.
pub fn run_benchmark<E, S, P>(
    config: &BenchConfig,
    engine: &mut E,
    feed: FrameFeed<S>,
    presenter: &mut P,
    shutdown: Arc<AtomicBool>,
) -> Result<RunSummary>
where
    E: ScopedBackend,
    S: FrameSource,
    P: Presenter + ?Sized,
{
    let span = tracing::info_span!(
        "bench.run",
        backend = config.backend.label(),
        placeholder = feed.is_placeholder()
    );
    let _guard = span.enter();

    let mut session = engine.activate().context("failed to activate backend")?;
    warm_up(&mut session, config.warmup_runs).context("warmup failed")?;
    info!("warmup complete ({} runs)", config.warmup_runs);

    let mut bench = BenchmarkLoop::new(&mut session, feed, config.overlay).with_shutdown(shutdown);
    match bench.run(presenter) {
        Ok(StopReason::Interrupted) => info!("benchmark interrupted by user"),
        Ok(reason) => info!("benchmark stopped: {reason:?}"),
        Err(err) => error!("benchmark loop failed: {err:?}"),
    }
    presenter.close();
    Ok(bench.finish())
}
