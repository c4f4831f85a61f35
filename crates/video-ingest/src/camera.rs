//! OpenCV-backed camera capture.

use chrono::Utc;
use opencv::{
    core::{Mat, MatTraitConstManual},
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};
use tracing::{debug, warn};

use crate::{
    FrameSource,
    types::{CaptureError, Frame, FrameFormat},
};

/// Local capture device read synchronously, one frame per call.
pub struct OpenCvCamera {
    capture: VideoCapture,
    index: i32,
    scratch: Mat,
    released: bool,
}

impl OpenCvCamera {
    /// Open the capture device with the given zero-based index.
    ///
    /// V4L is tried first, then whatever backend OpenCV picks by default.
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        for backend in [videoio::CAP_V4L, videoio::CAP_ANY] {
            match VideoCapture::new(index, backend) {
                Ok(capture) => {
                    if capture
                        .is_opened()
                        .map_err(|e| CaptureError::Other(e.into()))?
                    {
                        debug!("opened camera #{index} with backend {backend}");
                        return Ok(Self {
                            capture,
                            index,
                            scratch: Mat::default(),
                            released: false,
                        });
                    }
                }
                Err(err) => {
                    debug!("failed to open camera #{index} with backend {backend}: {err}");
                }
            }
        }

        Err(CaptureError::Open {
            uri: format!("/dev/video{index}"),
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let grabbed = self
            .capture
            .read(&mut self.scratch)
            .map_err(|e| CaptureError::Read(e.to_string()))?;
        if !grabbed || self.scratch.empty() {
            return Ok(None);
        }

        let size = self
            .scratch
            .size()
            .map_err(|e| CaptureError::Other(e.into()))?;

        let data = if self.scratch.is_continuous() {
            self.scratch
                .data_bytes()
                .map_err(|e| CaptureError::Other(e.into()))?
                .to_vec()
        } else {
            self.scratch
                .try_clone()
                .map_err(|e| CaptureError::Other(e.into()))?
                .data_bytes()
                .map_err(|e| CaptureError::Other(e.into()))?
                .to_vec()
        };

        Ok(Some(Frame {
            data,
            width: size.width,
            height: size.height,
            timestamp_ms: Utc::now().timestamp_millis(),
            format: FrameFormat::Bgr8,
        }))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.capture.release() {
            warn!("failed to release camera #{}: {err}", self.index);
        }
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        self.release();
    }
}
