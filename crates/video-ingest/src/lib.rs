//! Frame sources feeding the benchmark loop.
//!
//! A source is pulled synchronously: every call to [`FrameSource::read_frame`]
//! blocks until the device hands over a frame or reports that it has none.

mod camera;
mod types;

pub use camera::OpenCvCamera;
pub use types::{CaptureError, Frame, FrameFormat};

/// Anything that can produce BGR frames on demand.
pub trait FrameSource: Send {
    /// Read the next frame. `Ok(None)` means the source is exhausted or the
    /// device returned no image.
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Release the underlying device. Calling it more than once is a no-op.
    fn release(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}
