use thiserror::Error;

/// Raw 8-bit, 3-channel frame captured from a video source.
///
/// Pixels are packed row-major from the top-left corner in the channel order
/// reported by `format`.
#[derive(Clone, Debug)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
    pub timestamp_ms: i64,
    pub format: FrameFormat,
}

impl Frame {
    /// Zero-filled BGR frame of the given size.
    pub fn blank(width: i32, height: i32) -> Self {
        let len = (width.max(0) as usize) * (height.max(0) as usize) * 3;
        Self {
            data: vec![0; len],
            width,
            height,
            timestamp_ms: 0,
            format: FrameFormat::Bgr8,
        }
    }

    /// Number of bytes a well-formed frame of this size carries.
    pub fn expected_len(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize) * 3
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameFormat {
    Bgr8,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open video source {uri:?}")]
    Open { uri: String },
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
