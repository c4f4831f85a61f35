use anyhow::{Context, Result};
use inference_bench::bench::{BenchConfig, Presentation, run_standalone, telemetry};
use ml_core::{HailoBackend, HailoDevice};

fn main() {
    if let Err(err) = run() {
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    telemetry::init();
    let config = BenchConfig::accelerator(Presentation::Window);
    let device = HailoDevice::open(&config.model_path)
        .with_context(|| format!("failed to open {}", config.model_path.display()))?;
    let mut engine = HailoBackend::new(device, config.inference_timeout)
        .context("failed to configure Hailo device")?;
    let spec = engine.input_spec();
    println!("Model Input Shape: {}x{}", spec.width, spec.height);

    run_standalone(&config, &mut engine)?;
    Ok(())
}
