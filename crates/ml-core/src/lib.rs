//! Inference backends for the throughput benchmark.
//!
//! Every backend takes one preprocessed frame per call and reports only that
//! the call completed. Outputs are never decoded.

mod accelerator;
mod backend;
mod hailo;
mod onnx;
mod tensor;

pub use accelerator::{AcceleratorBackend, AcceleratorDevice, ActiveAccelerator};
pub use backend::{BackendError, InferenceBackend, RunOutput, ScopedBackend};
pub use hailo::HailoDevice;
pub use onnx::OnnxBackend;
pub use tensor::{
    Element, InputSpec, InputTensor, Layout, PreprocessError, TensorData, preprocess,
};

/// Accelerator backend driving a real Hailo device.
pub type HailoBackend = AcceleratorBackend<HailoDevice>;
