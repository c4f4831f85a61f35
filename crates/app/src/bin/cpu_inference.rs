use anyhow::{Context, Result};
use inference_bench::bench::{
    BenchConfig, Presentation,
    config::CPU_INPUT_SIZE,
    run_standalone, telemetry,
};
use ml_core::OnnxBackend;

fn main() {
    if let Err(err) = run() {
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    telemetry::init();
    let config = BenchConfig::cpu(Presentation::Window);
    let (width, height) = CPU_INPUT_SIZE;
    let mut engine = OnnxBackend::load(&config.model_path, width, height)
        .with_context(|| format!("failed to load {}", config.model_path.display()))?;
    println!("Model loaded successfully.");

    run_standalone(&config, &mut engine)?;
    Ok(())
}
