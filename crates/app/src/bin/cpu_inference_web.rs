use anyhow::{Context, Result};
use inference_bench::bench::{
    BenchConfig, Presentation, StreamContext,
    config::CPU_INPUT_SIZE,
    serve, telemetry,
};
use ml_core::OnnxBackend;
use video_ingest::OpenCvCamera;

fn main() {
    if let Err(err) = run() {
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    telemetry::init();
    let config = BenchConfig::cpu(Presentation::Stream);
    let (width, height) = CPU_INPUT_SIZE;
    let engine = OnnxBackend::load(&config.model_path, width, height)
        .with_context(|| format!("failed to load {}", config.model_path.display()))?;
    println!("Model loaded successfully.");
    let camera = OpenCvCamera::open(config.camera_index).context("camera unavailable")?;

    let context = StreamContext::new(engine, camera, &config);
    context.warm_up(config.warmup_runs)?;
    serve(context, config.port)
}
