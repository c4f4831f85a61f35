//! Local HighGUI window for standalone runs.

use anyhow::{Context, Result};
use opencv::{
    core::{CV_8UC3, Mat, Scalar},
    highgui,
    prelude::*,
};
use tracing::{debug, info};

use crate::bench::{
    data::ProcessedFrame,
    present::{Control, Presenter},
};

const KEY_POLL_MS: i32 = 1;
const KEY_QUIT: i32 = b'q' as i32;

pub struct Window {
    title: &'static str,
    canvas: Mat,
    open: bool,
}

impl Window {
    pub fn open(title: &'static str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .with_context(|| format!("failed to open window {title:?}"))?;
        debug!("opened window {title:?}");
        Ok(Self {
            title,
            canvas: Mat::default(),
            open: true,
        })
    }

    fn upload(&mut self, frame: &ProcessedFrame) -> Result<()> {
        let (width, height) = (frame.frame.width, frame.frame.height);
        if self.canvas.cols() != width || self.canvas.rows() != height {
            self.canvas = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))
                .context("failed to allocate display buffer")?;
        }
        let bytes = self
            .canvas
            .data_bytes_mut()
            .context("display buffer is not contiguous")?;
        if bytes.len() != frame.frame.data.len() {
            anyhow::bail!(
                "frame holds {} bytes, window expects {}",
                frame.frame.data.len(),
                bytes.len()
            );
        }
        bytes.copy_from_slice(&frame.frame.data);
        Ok(())
    }
}

impl Presenter for Window {
    fn present(&mut self, frame: &ProcessedFrame) -> Result<Control> {
        self.upload(frame)?;
        highgui::imshow(self.title, &self.canvas).context("failed to show frame")?;
        let key = highgui::wait_key(KEY_POLL_MS).context("failed to poll keyboard")?;
        if key & 0xFF == KEY_QUIT {
            info!("quit key pressed");
            return Ok(Control::Quit);
        }
        Ok(Control::Continue)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            let _ = highgui::destroy_all_windows();
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.close();
    }
}
