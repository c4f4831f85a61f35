//! CPU inference through ONNX Runtime.

use std::path::Path;

use ort::{
    inputs,
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use tracing::info;

use crate::{
    backend::{BackendError, InferenceBackend, RunOutput, ScopedBackend, check_shape},
    tensor::{Element, InputSpec, InputTensor, Layout, TensorData},
};

pub struct OnnxBackend {
    session: Session,
    input_name: String,
    output_count: usize,
    spec: InputSpec,
}

impl OnnxBackend {
    /// Load a model for CPU execution. The input is fed as NCHW `f32` RGB in
    /// `[0, 1]` at `width`x`height`.
    pub fn load(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self, BackendError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BackendError::ModelNotFound(path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| BackendError::Load(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| BackendError::Load(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| BackendError::Load(e.to_string()))?;

        let spec = InputSpec {
            width,
            height,
            layout: Layout::Nchw,
            element: Element::F32Normalized,
            to_rgb: true,
        };

        let input = session
            .inputs()
            .first()
            .ok_or_else(|| BackendError::Load("model declares no inputs".into()))?;
        let declared: &[i64] = input
            .dtype()
            .tensor_shape()
            .ok_or_else(|| BackendError::Load(format!("input {:?} is not a tensor", input.name())))?;
        check_declared_input(declared, spec.shape())?;
        let input_name = input.name().to_string();

        let output_count = session.outputs().len();
        info!(
            "loaded ONNX model {} (input {input_name:?} {declared:?}, {output_count} outputs)",
            path.display()
        );

        Ok(Self {
            session,
            input_name,
            output_count,
            spec,
        })
    }
}

/// Compare the model's declared input dimensions with the tensor we will
/// feed. Symbolic dimensions (negative) accept any size.
fn check_declared_input(declared: &[i64], expected: [usize; 4]) -> Result<(), BackendError> {
    if declared.len() != expected.len() {
        return Err(BackendError::Load(format!(
            "model input has rank {}, expected 4 ({expected:?})",
            declared.len()
        )));
    }
    let mut actual = expected;
    for (slot, &dim) in actual.iter_mut().zip(declared) {
        if dim >= 0 {
            *slot = dim as usize;
        }
    }
    if actual != expected {
        return Err(BackendError::Shape { expected, actual });
    }
    Ok(())
}

impl InferenceBackend for OnnxBackend {
    fn name(&self) -> &str {
        "CPU"
    }

    fn input_spec(&self) -> &InputSpec {
        &self.spec
    }

    fn run(&mut self, input: &InputTensor) -> Result<RunOutput, BackendError> {
        check_shape(&self.spec, input)?;
        let TensorData::F32(values) = &input.data else {
            return Err(BackendError::ElementType);
        };

        let tensor = TensorRef::from_array_view((input.shape, values.as_slice()))
            .map_err(|e| BackendError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(inputs![self.input_name.as_str() => tensor])
            .map_err(|e| BackendError::Inference(e.to_string()))?;
        drop(outputs);

        Ok(RunOutput {
            output_count: self.output_count,
        })
    }
}

/// The CPU runtime has no activation step; a session is the backend itself.
impl ScopedBackend for OnnxBackend {
    type Session<'a> = &'a mut OnnxBackend;

    fn activate(&mut self) -> Result<Self::Session<'_>, BackendError> {
        Ok(self)
    }
}
