use video_ingest::Frame;

/// One completed loop iteration, ready for presentation.
#[derive(Clone, Debug)]
pub struct ProcessedFrame {
    /// Original capture with the overlay drawn on it.
    pub frame: Frame,
    /// 1-based position in the run.
    pub frame_number: u64,
    pub fps: f64,
    pub inference_ms: f64,
}

/// Why a run ended without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Placeholder mode reached its frame limit.
    FrameLimit,
    /// The capture device returned no frame.
    ReadFailed,
    /// Ctrl+C was pressed.
    Interrupted,
    /// The user pressed the quit key.
    Quit,
}

/// Result of a single loop step.
#[derive(Debug)]
pub enum StepOutcome {
    Continue(ProcessedFrame),
    StopClean(StopReason),
    StopError(anyhow::Error),
}
