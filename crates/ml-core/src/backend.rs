use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::tensor::{InputSpec, InputTensor};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("model file not found at {0}")]
    ModelNotFound(PathBuf),
    #[error("failed to load model: {0}")]
    Load(String),
    #[error("input tensor shape {actual:?} does not match expected {expected:?}")]
    Shape {
        expected: [usize; 4],
        actual: [usize; 4],
    },
    #[error("input element type does not match the backend")]
    ElementType,
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("accelerator runtime unavailable: {0}")]
    Runtime(String),
    #[error("inference timed out after {0:?}")]
    Timeout(Duration),
    #[error("{call} returned status {status}")]
    Status { call: &'static str, status: i32 },
}

/// Raw result of one backend call. Output values are never decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub output_count: usize,
}

/// A model ready to execute synchronous single-frame inference.
pub trait InferenceBackend {
    fn name(&self) -> &str;

    fn input_spec(&self) -> &InputSpec;

    fn run(&mut self, input: &InputTensor) -> Result<RunOutput, BackendError>;

    /// Synthetic input used for warmup calls.
    fn warmup_input(&self) -> InputTensor {
        InputTensor::zeros(self.input_spec())
    }
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &mut B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input_spec(&self) -> &InputSpec {
        (**self).input_spec()
    }

    fn run(&mut self, input: &InputTensor) -> Result<RunOutput, BackendError> {
        (**self).run(input)
    }

    fn warmup_input(&self) -> InputTensor {
        (**self).warmup_input()
    }
}

/// A backend whose inference must happen inside an explicit active scope.
///
/// [`ScopedBackend::activate`] hands out a session that runs inference; the
/// scope ends when the session is dropped, on every exit path.
pub trait ScopedBackend: Send {
    type Session<'a>: InferenceBackend
    where
        Self: 'a;

    fn activate(&mut self) -> Result<Self::Session<'_>, BackendError>;
}

pub(crate) fn check_shape(spec: &InputSpec, input: &InputTensor) -> Result<(), BackendError> {
    let expected = spec.shape();
    if input.shape != expected {
        return Err(BackendError::Shape {
            expected,
            actual: input.shape,
        });
    }
    Ok(())
}
