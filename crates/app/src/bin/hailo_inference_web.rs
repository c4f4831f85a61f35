use anyhow::{Context, Result};
use inference_bench::bench::{BenchConfig, Presentation, StreamContext, serve, telemetry};
use ml_core::{HailoBackend, HailoDevice};
use video_ingest::OpenCvCamera;

fn main() {
    if let Err(err) = run() {
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    telemetry::init();
    let config = BenchConfig::accelerator(Presentation::Stream);
    let device = HailoDevice::open(&config.model_path)
        .with_context(|| format!("failed to open {}", config.model_path.display()))?;
    let engine = HailoBackend::new(device, config.inference_timeout)
        .context("failed to configure Hailo device")?;
    println!("Hailo initialized successfully.");
    let camera = OpenCvCamera::open(config.camera_index).context("camera unavailable")?;

    let context = StreamContext::new(engine, camera, &config);
    context.warm_up(config.warmup_runs)?;
    serve(context, config.port)
}
