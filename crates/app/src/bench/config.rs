use std::{path::PathBuf, time::Duration};

pub const CAMERA_INDEX: i32 = 0;
pub const WARMUP_RUNS: usize = 5;
pub const DUMMY_FRAME_LIMIT: u64 = 100;
pub const DUMMY_FRAME_WIDTH: i32 = 640;
pub const DUMMY_FRAME_HEIGHT: i32 = 480;
pub const PROGRESS_INTERVAL: u64 = 20;
pub const STREAM_STRIDE: u64 = 3;
pub const JPEG_QUALITY: u8 = 85;

pub const CPU_MODEL_PATH: &str = "/opt/hailo_models/yolov5s.onnx";
pub const CPU_INPUT_SIZE: (u32, u32) = (640, 640);
pub const CPU_PORT: u16 = 5000;

pub const HAILO_MODEL_PATH: &str = "hailo_models/yolov5s_h8l.hef";
pub const HAILO_PORT: u16 = 5001;
pub const HAILO_TIMEOUT: Duration = Duration::from_millis(1000);

/// BGR overlay colors.
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const RED: [u8; 3] = [0, 0, 255];
pub const BLUE: [u8; 3] = [255, 0, 0];

/// Which backend a variant benchmarks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    Hailo,
}

impl BackendKind {
    /// Label used in the final summary line.
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::Cpu => "CPU",
            BackendKind::Hailo => "Hailo",
        }
    }
}

/// Presentation a variant drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    Window,
    Stream,
}

/// What gets drawn on every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlayStyle {
    /// Prefix of the FPS line, e.g. `"FPS"` or `"Hailo FPS"`.
    pub fps_label: &'static str,
    /// Prefix of the inference-time line; `None` draws only the FPS line.
    pub inference_label: Option<&'static str>,
    pub color: [u8; 3],
}

impl OverlayStyle {
    pub fn for_variant(backend: BackendKind, presentation: Presentation) -> Self {
        match (backend, presentation) {
            (BackendKind::Cpu, Presentation::Window) => Self {
                fps_label: "FPS",
                inference_label: None,
                color: GREEN,
            },
            (BackendKind::Cpu, Presentation::Stream) => Self {
                fps_label: "FPS",
                inference_label: Some("Inf Time"),
                color: GREEN,
            },
            (BackendKind::Hailo, Presentation::Window) => Self {
                fps_label: "FPS",
                inference_label: Some("Inference"),
                color: RED,
            },
            (BackendKind::Hailo, Presentation::Stream) => Self {
                fps_label: "Hailo FPS",
                inference_label: Some("Inf Time"),
                color: BLUE,
            },
        }
    }
}

/// Compiled-in settings for one benchmark executable.
#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub backend: BackendKind,
    pub presentation: Presentation,
    pub model_path: PathBuf,
    pub camera_index: i32,
    pub window_title: &'static str,
    pub port: u16,
    /// Per-call accelerator timeout. The CPU backend has none.
    pub inference_timeout: Duration,
    pub overlay: OverlayStyle,
    pub jpeg_quality: u8,
    pub stream_stride: u64,
    pub warmup_runs: usize,
    pub dummy_frame_limit: u64,
    pub progress_interval: u64,
}

impl BenchConfig {
    pub fn cpu(presentation: Presentation) -> Self {
        Self::new(BackendKind::Cpu, presentation, CPU_MODEL_PATH, CPU_PORT)
    }

    pub fn accelerator(presentation: Presentation) -> Self {
        Self::new(BackendKind::Hailo, presentation, HAILO_MODEL_PATH, HAILO_PORT)
    }

    fn new(backend: BackendKind, presentation: Presentation, model: &str, port: u16) -> Self {
        Self {
            backend,
            presentation,
            model_path: PathBuf::from(model),
            camera_index: CAMERA_INDEX,
            window_title: match backend {
                BackendKind::Cpu => "CPU Inference",
                BackendKind::Hailo => "Hailo Inference",
            },
            port,
            inference_timeout: HAILO_TIMEOUT,
            overlay: OverlayStyle::for_variant(backend, presentation),
            jpeg_quality: JPEG_QUALITY,
            stream_stride: STREAM_STRIDE,
            warmup_runs: WARMUP_RUNS,
            dummy_frame_limit: DUMMY_FRAME_LIMIT,
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    pub fn index_html(&self) -> &'static str {
        match self.backend {
            BackendKind::Cpu => crate::html::CPU_INDEX_HTML,
            BackendKind::Hailo => crate::html::ACCELERATOR_INDEX_HTML,
        }
    }
}
