use anyhow::Result;

use crate::bench::data::ProcessedFrame;

/// What the loop should do after a frame has been presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Sink receiving every processed frame of a standalone run.
pub trait Presenter {
    fn present(&mut self, frame: &ProcessedFrame) -> Result<Control>;

    /// Tear down whatever the presenter opened. Called once after the loop.
    fn close(&mut self) {}
}

/// Console progress for placeholder runs, where no window is opened.
pub struct ProgressReporter {
    every: u64,
    limit: u64,
}

impl ProgressReporter {
    pub fn new(every: u64, limit: u64) -> Self {
        Self { every, limit }
    }

    pub fn line(&self, frame: &ProcessedFrame) -> Option<String> {
        (self.every > 0 && frame.frame_number % self.every == 0).then(|| {
            format!(
                "Frame {}/{} - Current FPS: {:.2}",
                frame.frame_number, self.limit, frame.fps
            )
        })
    }
}

impl Presenter for ProgressReporter {
    fn present(&mut self, frame: &ProcessedFrame) -> Result<Control> {
        if let Some(line) = self.line(frame) {
            println!("{line}");
        }
        Ok(Control::Continue)
    }
}

#[cfg(test)]
mod tests {
    use video_ingest::Frame;

    use super::*;

    fn processed(frame_number: u64, fps: f64) -> ProcessedFrame {
        ProcessedFrame {
            frame: Frame::blank(2, 2),
            frame_number,
            fps,
            inference_ms: 0.0,
        }
    }

    #[test]
    fn progress_is_reported_every_twenty_frames() {
        let reporter = ProgressReporter::new(20, 100);
        assert_eq!(reporter.line(&processed(19, 1.0)), None);
        assert_eq!(
            reporter.line(&processed(20, 31.256)).as_deref(),
            Some("Frame 20/100 - Current FPS: 31.26")
        );
        assert!(reporter.line(&processed(100, 1.0)).is_some());
    }
}
