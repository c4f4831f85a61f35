//! Pull-based MJPEG segment stream over a benchmark loop.

use actix_web::web::Bytes;
use ml_core::InferenceBackend;
use tracing::{error, info};
use video_ingest::FrameSource;

use crate::bench::{
    data::StepOutcome,
    driver::BenchmarkLoop,
    encoding::{encode_jpeg, multipart_segment},
};

/// Yields one multipart segment for every `stride`-th processed frame. The
/// frames in between still run inference and are then dropped.
///
/// The stream ends for good on the first stop condition or error.
pub struct FrameStream<B, S> {
    bench: BenchmarkLoop<B, S>,
    stride: u64,
    quality: u8,
    done: bool,
}

impl<B: InferenceBackend, S: FrameSource> FrameStream<B, S> {
    pub fn new(bench: BenchmarkLoop<B, S>, stride: u64, quality: u8) -> Self {
        Self {
            bench,
            stride: stride.max(1),
            quality,
            done: false,
        }
    }

    pub fn bench(&self) -> &BenchmarkLoop<B, S> {
        &self.bench
    }

    /// Log the per-stream totals.
    pub fn log_summary(&self) {
        let summary = self.bench.summary();
        info!(
            "stream closed after {} frames, average {:.2} FPS",
            summary.frames, summary.average_fps
        );
    }
}

impl<B: InferenceBackend, S: FrameSource> Iterator for FrameStream<B, S> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Bytes> {
        if self.done {
            return None;
        }
        loop {
            match self.bench.step() {
                StepOutcome::Continue(processed) => {
                    if processed.frame_number % self.stride != 0 {
                        continue;
                    }
                    match encode_jpeg(&processed.frame, self.quality) {
                        Ok(jpeg) => return Some(multipart_segment(&jpeg)),
                        Err(err) => {
                            error!("frame {} encode failed: {err:?}", processed.frame_number);
                            self.done = true;
                            return None;
                        }
                    }
                }
                StepOutcome::StopClean(reason) => {
                    info!("stream stopped: {reason:?}");
                    self.done = true;
                    return None;
                }
                StepOutcome::StopError(err) => {
                    error!("stream stopped on error: {err:?}");
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
