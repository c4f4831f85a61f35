//! Frame counting and throughput figures.
//!
//! FPS is always `frames / elapsed` since the run started. Nothing is
//! smoothed or windowed, so the first frames may report very large values.

use std::time::{Duration, Instant};

/// Frames per second over `elapsed`, or `0.0` when no time has passed.
pub fn frames_per_second(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { frames as f64 / secs } else { 0.0 }
}

#[derive(Clone, Debug)]
pub struct RunStats {
    frame_count: u64,
    start_time: Instant,
    last_inference: Duration,
}

impl RunStats {
    /// Start counting from now.
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(start_time: Instant) -> Self {
        Self {
            frame_count: 0,
            start_time,
            last_inference: Duration::ZERO,
        }
    }

    /// Count one more frame and return the FPS at this instant.
    pub fn record_frame(&mut self, inference: Duration) -> f64 {
        self.record_frame_at(inference, Instant::now())
    }

    pub fn record_frame_at(&mut self, inference: Duration, now: Instant) -> f64 {
        self.frame_count += 1;
        self.last_inference = inference;
        self.fps_at(now)
    }

    pub fn fps_at(&self, now: Instant) -> f64 {
        frames_per_second(self.frame_count, now.saturating_duration_since(self.start_time))
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn last_inference(&self) -> Duration {
        self.last_inference
    }

    pub fn summary(&self) -> RunSummary {
        self.summary_at(Instant::now())
    }

    pub fn summary_at(&self, now: Instant) -> RunSummary {
        let elapsed = now.saturating_duration_since(self.start_time);
        RunSummary {
            frames: self.frame_count,
            elapsed,
            average_fps: frames_per_second(self.frame_count, elapsed),
        }
    }
}

/// Whole-run figures printed when a benchmark ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub average_fps: f64,
}

impl RunSummary {
    pub fn report(&self, label: &str) -> String {
        format!(
            "Benchmark Complete.\nTotal Frames: {}\nAverage {label} FPS: {:.2}",
            self.frames, self.average_fps
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_frames_over_elapsed() {
        for (frames, millis) in [(0u64, 250u64), (1, 1), (10, 2_000), (100, 3_333)] {
            let elapsed = Duration::from_millis(millis);
            let expected = frames as f64 / elapsed.as_secs_f64();
            assert!((frames_per_second(frames, elapsed) - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_elapsed_reports_zero_fps() {
        assert_eq!(frames_per_second(5, Duration::ZERO), 0.0);
    }

    #[test]
    fn record_frame_is_unsmoothed() {
        let start = Instant::now();
        let mut stats = RunStats::started_at(start);
        let first = stats.record_frame_at(
            Duration::from_millis(3),
            start + Duration::from_millis(1),
        );
        assert!((first - 1000.0).abs() < 1e-6);
        let second = stats.record_frame_at(
            Duration::from_millis(4),
            start + Duration::from_millis(1000),
        );
        assert!((second - 2.0).abs() < 1e-9);
        assert_eq!(stats.frame_count(), 2);
        assert_eq!(stats.last_inference(), Duration::from_millis(4));
    }

    #[test]
    fn summary_report_matches_console_format() {
        let summary = RunSummary {
            frames: 100,
            elapsed: Duration::from_secs(4),
            average_fps: 25.0,
        };
        assert_eq!(
            summary.report("CPU"),
            "Benchmark Complete.\nTotal Frames: 100\nAverage CPU FPS: 25.00"
        );
    }

    #[test]
    fn summary_averages_over_whole_run() {
        let start = Instant::now();
        let mut stats = RunStats::started_at(start);
        for _ in 0..10 {
            stats.record_frame_at(Duration::ZERO, start);
        }
        let summary = stats.summary_at(start + Duration::from_secs(2));
        assert_eq!(summary.frames, 10);
        assert!((summary.average_fps - 5.0).abs() < 1e-9);
    }
}
