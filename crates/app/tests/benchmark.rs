mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use common::{DeviceLog, FakeBackend, FakeDevice, FakeSource, QuitAfter};
use inference_bench::bench::{
    BenchConfig, BenchmarkLoop, FrameFeed, Presentation, ProgressReporter, StepOutcome,
    run_benchmark, warm_up,
};
use ml_core::AcceleratorBackend;

fn no_shutdown() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[test]
fn placeholder_run_counts_one_hundred_frames_after_warmup() {
    let config = BenchConfig::cpu(Presentation::Window);
    let mut engine = FakeBackend::new();
    let runs = engine.runs.clone();
    let feed: FrameFeed<FakeSource> = FrameFeed::Placeholder {
        limit: config.dummy_frame_limit,
    };

    let mut presenter = ProgressReporter::new(config.progress_interval, config.dummy_frame_limit);
    let summary = run_benchmark(&config, &mut engine, feed, &mut presenter, no_shutdown()).unwrap();

    assert_eq!(summary.frames, 100);
    assert!(summary.average_fps > 0.0);
    assert_eq!(runs.get(), 5 + 100);
    assert_eq!(
        summary.report("CPU").lines().last(),
        Some(format!("Average CPU FPS: {:.2}", summary.average_fps).as_str())
    );
}

#[test]
fn quit_key_after_ten_frames_ends_run_and_closes_presenter() {
    let config = BenchConfig::cpu(Presentation::Window);
    let mut engine = FakeBackend::new();
    let source = FakeSource::with_frames(1_000);
    let releases = source.releases.clone();
    let mut presenter = QuitAfter::new(10);

    let summary = run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(source),
        &mut presenter,
        no_shutdown(),
    )
    .unwrap();

    assert_eq!(summary.frames, 10);
    assert!(presenter.closed);
    assert_eq!(releases.get(), 1);
}

#[test]
fn read_failure_ends_run_cleanly() {
    let config = BenchConfig::cpu(Presentation::Window);
    let mut engine = FakeBackend::new();
    let source = FakeSource::with_frames(7);
    let reads = source.reads.clone();
    let releases = source.releases.clone();
    let mut presenter = QuitAfter::never();

    let summary = run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(source),
        &mut presenter,
        no_shutdown(),
    )
    .unwrap();

    assert_eq!(summary.frames, 7);
    assert_eq!(reads.get(), 8);
    assert_eq!(releases.get(), 1);
    assert!(presenter.closed);
}

#[test]
fn backend_error_in_loop_is_reported_as_step_error() {
    let mut engine = FakeBackend::failing_on(3);
    let mut bench = BenchmarkLoop::new(
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(10)),
        BenchConfig::cpu(Presentation::Window).overlay,
    );
    assert!(matches!(bench.step(), StepOutcome::Continue(_)));
    assert!(matches!(bench.step(), StepOutcome::Continue(_)));
    let StepOutcome::StopError(err) = bench.step() else {
        panic!("expected a step error");
    };
    assert!(format!("{err:?}").contains("injected failure"));
    assert_eq!(bench.stats().frame_count(), 2);
}

#[test]
fn backend_error_still_produces_summary() {
    let config = BenchConfig::cpu(Presentation::Window);
    // Five warmup calls, then the third loop frame fails.
    let mut engine = FakeBackend::failing_on(8);
    let source = FakeSource::with_frames(100);
    let releases = source.releases.clone();
    let mut presenter = QuitAfter::never();

    let summary = run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(source),
        &mut presenter,
        no_shutdown(),
    )
    .unwrap();

    assert_eq!(summary.frames, 2);
    assert_eq!(releases.get(), 1);
}

#[test]
fn warmup_does_not_touch_run_stats() {
    let mut engine = FakeBackend::new();
    let runs = engine.runs.clone();
    warm_up(&mut engine, 5).unwrap();
    assert_eq!(runs.get(), 5);

    let bench = BenchmarkLoop::new(
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(1)),
        BenchConfig::cpu(Presentation::Window).overlay,
    );
    assert_eq!(bench.stats().frame_count(), 0);
    assert!(bench.stats().start_time().elapsed() < Duration::from_secs(1));
}

#[test]
fn interrupt_flag_stops_run_as_clean_termination() {
    let config = BenchConfig::cpu(Presentation::Window);
    let mut engine = FakeBackend::new();
    let shutdown = Arc::new(AtomicBool::new(true));
    let mut presenter = QuitAfter::never();

    let summary = run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(10)),
        &mut presenter,
        shutdown.clone(),
    )
    .unwrap();

    assert_eq!(summary.frames, 0);
    assert_eq!(summary.average_fps, 0.0);
    assert!(shutdown.load(Ordering::SeqCst));
}

#[test]
fn accelerator_deactivates_once_per_run_on_every_exit_path() {
    let config = BenchConfig::accelerator(Presentation::Window);

    // Normal stop via quit key.
    let log = DeviceLog::default();
    let mut engine =
        AcceleratorBackend::new(FakeDevice::new(log.clone()), Duration::from_millis(1000)).unwrap();
    let mut presenter = QuitAfter::new(4);
    run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(50)),
        &mut presenter,
        no_shutdown(),
    )
    .unwrap();
    assert_eq!(log.activations.get(), 1);
    assert_eq!(log.deactivations.get(), 1);
    assert_eq!(log.infers.get(), 5 + 4);

    // Read failure.
    let mut presenter = QuitAfter::never();
    run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(2)),
        &mut presenter,
        no_shutdown(),
    )
    .unwrap();
    assert_eq!(log.activations.get(), 2);
    assert_eq!(log.deactivations.get(), 2);

    // Inference error inside the loop.
    let mut presenter = QuitAfter::never();
    let log = DeviceLog::default();
    let mut engine = AcceleratorBackend::new(
        FakeDevice::failing_on(log.clone(), 6),
        Duration::from_millis(1000),
    )
    .unwrap();
    let summary = run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(50)),
        &mut presenter,
        no_shutdown(),
    )
    .unwrap();
    assert_eq!(summary.frames, 0);
    assert_eq!(log.activations.get(), 1);
    assert_eq!(log.deactivations.get(), 1);
}

#[test]
fn warmup_failure_is_fatal_but_still_deactivates() {
    let config = BenchConfig::accelerator(Presentation::Window);
    let log = DeviceLog::default();
    let mut engine = AcceleratorBackend::new(
        FakeDevice::failing_on(log.clone(), 2),
        Duration::from_millis(1000),
    )
    .unwrap();
    let mut presenter = QuitAfter::never();
    let result = run_benchmark(
        &config,
        &mut engine,
        FrameFeed::Live(FakeSource::with_frames(5)),
        &mut presenter,
        no_shutdown(),
    );
    assert!(result.is_err());
    assert_eq!(log.deactivations.get(), 1);
}
