//! Accelerator backends that need an explicit configure / activate / deactivate
//! lifecycle around inference.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    backend::{BackendError, InferenceBackend, RunOutput, ScopedBackend, check_shape},
    tensor::{Element, InputSpec, InputTensor, Layout, TensorData},
};

/// Raw device operations the accelerator backend is built on.
pub trait AcceleratorDevice: Send {
    /// Load the compiled model onto the device and build its network group.
    fn configure(&mut self) -> Result<(), BackendError>;

    /// `(width, height)` of the model's first input stream.
    fn input_size(&self) -> (u32, u32);

    fn activate(&mut self) -> Result<(), BackendError>;

    fn deactivate(&mut self) -> Result<(), BackendError>;

    /// Run one frame of NHWC `u8` input and return how many output streams
    /// were filled.
    fn infer(&mut self, input: &[u8], timeout: Duration) -> Result<usize, BackendError>;
}

/// A configured accelerator that hands out active inference sessions.
pub struct AcceleratorBackend<D: AcceleratorDevice> {
    device: D,
    spec: InputSpec,
    timeout: Duration,
}

impl<D: AcceleratorDevice> AcceleratorBackend<D> {
    pub fn new(mut device: D, timeout: Duration) -> Result<Self, BackendError> {
        device.configure()?;
        let (width, height) = device.input_size();
        info!("accelerator configured with {width}x{height} input");
        Ok(Self {
            device,
            spec: InputSpec {
                width,
                height,
                layout: Layout::Nhwc,
                element: Element::U8,
                to_rgb: true,
            },
            timeout,
        })
    }

    pub fn input_spec(&self) -> &InputSpec {
        &self.spec
    }
}

impl<D: AcceleratorDevice> ScopedBackend for AcceleratorBackend<D> {
    type Session<'a>
        = ActiveAccelerator<'a, D>
    where
        Self: 'a;

    fn activate(&mut self) -> Result<Self::Session<'_>, BackendError> {
        self.device.activate()?;
        debug!("network group activated");
        Ok(ActiveAccelerator { backend: self })
    }
}

/// Activation scope of an [`AcceleratorBackend`]. The network group is
/// deactivated when this guard is dropped.
pub struct ActiveAccelerator<'a, D: AcceleratorDevice> {
    backend: &'a mut AcceleratorBackend<D>,
}

impl<D: AcceleratorDevice> InferenceBackend for ActiveAccelerator<'_, D> {
    fn name(&self) -> &str {
        "Hailo"
    }

    fn input_spec(&self) -> &InputSpec {
        &self.backend.spec
    }

    fn run(&mut self, input: &InputTensor) -> Result<RunOutput, BackendError> {
        check_shape(&self.backend.spec, input)?;
        let TensorData::U8(bytes) = &input.data else {
            return Err(BackendError::ElementType);
        };
        let output_count = self.backend.device.infer(bytes, self.backend.timeout)?;
        Ok(RunOutput { output_count })
    }
}

impl<D: AcceleratorDevice> Drop for ActiveAccelerator<'_, D> {
    fn drop(&mut self) {
        match self.backend.device.deactivate() {
            Ok(()) => debug!("network group deactivated"),
            Err(err) => warn!("failed to deactivate network group: {err}"),
        }
    }
}
