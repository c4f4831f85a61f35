#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::Result;
use inference_bench::bench::{Control, ProcessedFrame, Presenter};
use ml_core::{
    AcceleratorDevice, BackendError, Element, InferenceBackend, InputSpec, InputTensor, Layout,
    RunOutput, ScopedBackend,
};
use video_ingest::{CaptureError, Frame, FrameSource};

#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// CPU-style backend that counts calls and can fail on a given call.
pub struct FakeBackend {
    spec: InputSpec,
    pub runs: Counter,
    fail_on_call: Option<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            spec: InputSpec {
                width: 8,
                height: 8,
                layout: Layout::Nchw,
                element: Element::F32Normalized,
                to_rgb: true,
            },
            runs: Counter::default(),
            fail_on_call: None,
        }
    }

    /// Fail the `call`-th inference (1-based, warmup included).
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new()
        }
    }
}

impl InferenceBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn input_spec(&self) -> &InputSpec {
        &self.spec
    }

    fn run(&mut self, input: &InputTensor) -> Result<RunOutput, BackendError> {
        assert_eq!(input.shape, self.spec.shape());
        self.runs.bump();
        if self.fail_on_call == Some(self.runs.get()) {
            return Err(BackendError::Inference("injected failure".into()));
        }
        Ok(RunOutput { output_count: 1 })
    }
}

impl ScopedBackend for FakeBackend {
    type Session<'a> = &'a mut FakeBackend;

    fn activate(&mut self) -> Result<Self::Session<'_>, BackendError> {
        Ok(self)
    }
}

/// Camera stand-in yielding `frames` blank frames, then nothing.
pub struct FakeSource {
    remaining: usize,
    pub reads: Counter,
    pub releases: Counter,
}

impl FakeSource {
    pub fn with_frames(frames: usize) -> Self {
        Self {
            remaining: frames,
            reads: Counter::default(),
            releases: Counter::default(),
        }
    }
}

impl FrameSource for FakeSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        self.reads.bump();
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(Frame::blank(64, 48)))
    }

    fn release(&mut self) {
        self.releases.bump();
    }
}

/// Accelerator device recording its lifecycle calls.
#[derive(Clone, Default)]
pub struct DeviceLog {
    pub activations: Counter,
    pub deactivations: Counter,
    pub infers: Counter,
}

pub struct FakeDevice {
    pub log: DeviceLog,
    fail_on_call: Option<usize>,
}

impl FakeDevice {
    pub fn new(log: DeviceLog) -> Self {
        Self {
            log,
            fail_on_call: None,
        }
    }

    pub fn failing_on(log: DeviceLog, call: usize) -> Self {
        Self {
            log,
            fail_on_call: Some(call),
        }
    }
}

impl AcceleratorDevice for FakeDevice {
    fn configure(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn input_size(&self) -> (u32, u32) {
        (16, 16)
    }

    fn activate(&mut self) -> Result<(), BackendError> {
        self.log.activations.bump();
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), BackendError> {
        self.log.deactivations.bump();
        Ok(())
    }

    fn infer(&mut self, input: &[u8], timeout: Duration) -> Result<usize, BackendError> {
        assert_eq!(input.len(), 16 * 16 * 3);
        self.log.infers.bump();
        if self.fail_on_call == Some(self.log.infers.get()) {
            return Err(BackendError::Timeout(timeout));
        }
        Ok(3)
    }
}

/// Presenter that asks to quit after `quit_after` frames.
pub struct QuitAfter {
    quit_after: u64,
    pub presented: u64,
    pub closed: bool,
}

impl QuitAfter {
    pub fn new(quit_after: u64) -> Self {
        Self {
            quit_after,
            presented: 0,
            closed: false,
        }
    }

    pub fn never() -> Self {
        Self::new(u64::MAX)
    }
}

impl Presenter for QuitAfter {
    fn present(&mut self, frame: &ProcessedFrame) -> Result<Control> {
        self.presented += 1;
        assert_eq!(frame.frame_number, self.presented);
        if self.presented >= self.quit_after {
            Ok(Control::Quit)
        } else {
            Ok(Control::Continue)
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
