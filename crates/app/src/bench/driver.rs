//! The benchmark loop: capture, preprocess, infer, count, overlay.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use anyhow::{Context, Result};
use ml_core::{BackendError, InferenceBackend, preprocess};
use tracing::{debug, info, warn};
use video_ingest::{CaptureError, Frame, FrameSource};

use crate::bench::{
    config::{DUMMY_FRAME_HEIGHT, DUMMY_FRAME_WIDTH, OverlayStyle},
    data::{ProcessedFrame, StepOutcome, StopReason},
    overlay::draw_overlay,
    present::{Control, Presenter},
    stats::{RunStats, RunSummary},
};

/// Where frames come from for one run.
pub enum FrameFeed<S> {
    /// A real capture device.
    Live(S),
    /// Zero-filled 640x480 frames, bounded to `limit` iterations. The real
    /// device is never touched.
    Placeholder { limit: u64 },
}

impl<S: FrameSource> FrameFeed<S> {
    /// Use the source if it opened, otherwise fall back to placeholder frames.
    pub fn open_or_placeholder(opened: Result<S, CaptureError>, limit: u64) -> Self {
        match opened {
            Ok(source) => FrameFeed::Live(source),
            Err(err) => {
                warn!("{err}; running with {limit} placeholder frames");
                FrameFeed::Placeholder { limit }
            }
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, FrameFeed::Placeholder { .. })
    }

    fn limit(&self) -> Option<u64> {
        match self {
            FrameFeed::Live(_) => None,
            FrameFeed::Placeholder { limit } => Some(*limit),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        match self {
            FrameFeed::Live(source) => source.read_frame(),
            FrameFeed::Placeholder { .. } => {
                Ok(Some(Frame::blank(DUMMY_FRAME_WIDTH, DUMMY_FRAME_HEIGHT)))
            }
        }
    }

    fn release(&mut self) {
        if let FrameFeed::Live(source) = self {
            source.release();
        }
    }
}

/// Run `runs` inference calls on synthetic input and discard the results.
pub fn warm_up<B: InferenceBackend>(backend: &mut B, runs: usize) -> Result<(), BackendError> {
    let input = backend.warmup_input();
    let started = Instant::now();
    for _ in 0..runs {
        backend.run(&input)?;
    }
    debug!(
        "{} warmup finished: {runs} runs in {:.1} ms",
        backend.name(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}

pub struct BenchmarkLoop<B, S> {
    backend: B,
    feed: FrameFeed<S>,
    overlay: OverlayStyle,
    stats: RunStats,
    shutdown: Option<Arc<AtomicBool>>,
}

impl<B: InferenceBackend, S: FrameSource> BenchmarkLoop<B, S> {
    /// Build the loop and start the clock. Warm the backend up before this.
    pub fn new(backend: B, feed: FrameFeed<S>, overlay: OverlayStyle) -> Self {
        Self {
            backend,
            feed,
            overlay,
            stats: RunStats::start(),
            shutdown: None,
        }
    }

    /// Stop cleanly once `flag` is set.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run one iteration.
    pub fn step(&mut self) -> StepOutcome {
        if self
            .shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            return StepOutcome::StopClean(StopReason::Interrupted);
        }
        if self
            .feed
            .limit()
            .is_some_and(|limit| self.stats.frame_count() >= limit)
        {
            return StepOutcome::StopClean(StopReason::FrameLimit);
        }

        let mut frame = match self.feed.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return StepOutcome::StopClean(StopReason::ReadFailed),
            Err(err) => {
                warn!("capture read failed: {err}");
                return StepOutcome::StopClean(StopReason::ReadFailed);
            }
        };

        match self.process(&mut frame) {
            Ok((fps, inference_ms)) => StepOutcome::Continue(ProcessedFrame {
                frame,
                frame_number: self.stats.frame_count(),
                fps,
                inference_ms,
            }),
            Err(err) => StepOutcome::StopError(err),
        }
    }

    fn process(&mut self, frame: &mut Frame) -> Result<(f64, f64)> {
        let span = tracing::debug_span!("bench.step", frame = self.stats.frame_count() + 1);
        let _guard = span.enter();

        let input = preprocess(
            &frame.data,
            frame.width,
            frame.height,
            self.backend.input_spec(),
        )
        .context("failed to preprocess frame")?;

        let t1 = Instant::now();
        self.backend
            .run(&input)
            .with_context(|| format!("{} inference failed", self.backend.name()))?;
        let inference = t1.elapsed();

        let fps = self.stats.record_frame(inference);
        let inference_ms = self.stats.last_inference().as_secs_f64() * 1000.0;
        draw_overlay(frame, &self.overlay, fps, inference_ms);
        Ok((fps, inference_ms))
    }

    /// Step until the run ends, handing every frame to `presenter`.
    pub fn run<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Result<StopReason> {
        loop {
            match self.step() {
                StepOutcome::Continue(processed) => {
                    if presenter.present(&processed)? == Control::Quit {
                        return Ok(StopReason::Quit);
                    }
                }
                StepOutcome::StopClean(reason) => return Ok(reason),
                StepOutcome::StopError(err) => return Err(err),
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.stats.summary()
    }

    /// Release the frame source and return the whole-run figures.
    pub fn finish(mut self) -> RunSummary {
        self.feed.release();
        let summary = self.stats.summary();
        info!(
            "run finished: {} frames in {:.2} s",
            summary.frames,
            summary.elapsed.as_secs_f64()
        );
        summary
    }
}
