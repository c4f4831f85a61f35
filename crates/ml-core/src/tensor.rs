//! Input tensors and the frame → tensor preprocessing shared by all backends.

use image::{RgbImage, imageops, imageops::FilterType};
use thiserror::Error;

/// Axis order of a 4-D image tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Element encoding expected by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    /// `f32` scaled to `[0, 1]`.
    F32Normalized,
    /// Raw `u8` in native integer range.
    U8,
}

/// What a backend expects as input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub width: u32,
    pub height: u32,
    pub layout: Layout,
    pub element: Element,
    /// Swap the first and third channel (BGR → RGB) before building the tensor.
    pub to_rgb: bool,
}

impl InputSpec {
    pub fn shape(&self) -> [usize; 4] {
        let (w, h) = (self.width as usize, self.height as usize);
        match self.layout {
            Layout::Nchw => [1, 3, h, w],
            Layout::Nhwc => [1, h, w, 3],
        }
    }

    pub fn element_count(&self) -> usize {
        self.shape().iter().product()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    U8(Vec<u8>),
}

/// Dense batch-of-one image tensor handed to a backend for a single call.
#[derive(Clone, Debug, PartialEq)]
pub struct InputTensor {
    pub shape: [usize; 4],
    pub data: TensorData,
}

impl InputTensor {
    /// Zero-filled tensor matching `spec`, used as synthetic warmup input.
    pub fn zeros(spec: &InputSpec) -> Self {
        let len = spec.element_count();
        let data = match spec.element {
            Element::F32Normalized => TensorData::F32(vec![0.0; len]),
            Element::U8 => TensorData::U8(vec![0; len]),
        };
        Self {
            shape: spec.shape(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        match &self.data {
            TensorData::F32(values) => values.len(),
            TensorData::U8(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("unexpected frame buffer size: got {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("frame size {width}x{height} is not a valid image")]
    Dimensions { width: i32, height: i32 },
}

/// Convert a packed 3-channel frame into the tensor described by `spec`.
///
/// The frame is resized to the backend's input size with bilinear filtering,
/// optionally swapped to RGB, then laid out and scaled per `spec`.
pub fn preprocess(
    pixels: &[u8],
    width: i32,
    height: i32,
    spec: &InputSpec,
) -> Result<InputTensor, PreprocessError> {
    if width <= 0 || height <= 0 {
        return Err(PreprocessError::Dimensions { width, height });
    }
    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(PreprocessError::BufferSize {
            expected,
            actual: pixels.len(),
        });
    }

    let mut packed = Vec::with_capacity(expected);
    if spec.to_rgb {
        for px in pixels.chunks_exact(3) {
            packed.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    } else {
        packed.extend_from_slice(pixels);
    }

    let image = RgbImage::from_raw(width as u32, height as u32, packed)
        .ok_or(PreprocessError::Dimensions { width, height })?;
    let resized = if image.width() == spec.width && image.height() == spec.height {
        image
    } else {
        imageops::resize(&image, spec.width, spec.height, FilterType::Triangle)
    };
    let raw = resized.into_raw();

    let data = match (spec.layout, spec.element) {
        (Layout::Nhwc, Element::U8) => TensorData::U8(raw),
        (Layout::Nhwc, Element::F32Normalized) => {
            TensorData::F32(raw.iter().map(|&v| v as f32 / 255.0).collect())
        }
        (Layout::Nchw, element) => {
            let plane = (spec.width as usize) * (spec.height as usize);
            match element {
                Element::F32Normalized => {
                    let mut out = vec![0f32; 3 * plane];
                    for (idx, px) in raw.chunks_exact(3).enumerate() {
                        out[idx] = px[0] as f32 / 255.0;
                        out[plane + idx] = px[1] as f32 / 255.0;
                        out[2 * plane + idx] = px[2] as f32 / 255.0;
                    }
                    TensorData::F32(out)
                }
                Element::U8 => {
                    let mut out = vec![0u8; 3 * plane];
                    for (idx, px) in raw.chunks_exact(3).enumerate() {
                        out[idx] = px[0];
                        out[plane + idx] = px[1];
                        out[2 * plane + idx] = px[2];
                    }
                    TensorData::U8(out)
                }
            }
        }
    };

    Ok(InputTensor {
        shape: spec.shape(),
        data,
    })
}
