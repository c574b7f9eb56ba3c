// Performance sampler: fixed-cadence aggregation of frame readings
use crate::domain::performance::{
    FpsStatus, FrameStats, LoadLevel, MemoryStatus, PerformanceReport, RenderTimeBand, SampleWindow,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const DEFAULT_HISTORY_SIZE: usize = 60;

/// Source of the process memory reading. `None` when the platform does not
/// expose one.
pub trait MemoryProbe: Send + Sync {
    fn used_megabytes(&self) -> Option<f64>;
}

/// Rolling FPS and render-time history. Owns no timer; the caller decides
/// the cadence and passes the elapsed time into [`PerformanceSampler::tick`].
#[derive(Debug, Clone)]
pub struct PerformanceSampler {
    fps: SampleWindow,
    render_times: SampleWindow,
    frames_this_tick: u32,
    render_ms_this_tick: f64,
}

impl Default for PerformanceSampler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl PerformanceSampler {
    pub fn new(history_size: usize) -> Self {
        Self {
            fps: SampleWindow::new(history_size),
            render_times: SampleWindow::new(history_size),
            frames_this_tick: 0,
            render_ms_this_tick: 0.0,
        }
    }

    /// Count a finished frame toward the current tick. Dropped frames still
    /// cost render time, so they are counted too.
    pub fn observe_frame(&mut self, stats: &FrameStats) {
        self.frames_this_tick += 1;
        self.render_ms_this_tick += stats.render_time_ms;
    }

    pub fn record_fps(&mut self, fps: f64) {
        self.fps.push(fps);
    }

    pub fn record_render_time(&mut self, render_time_ms: f64) {
        self.render_times.push(render_time_ms);
    }

    /// Close the current tick. A tick without frames leaves the history
    /// untouched; an idle chart is not a slow chart.
    pub fn tick(&mut self, elapsed_ms: f64, memory_mb: Option<f64>, data_points: usize) -> PerformanceReport {
        if self.frames_this_tick > 0 && elapsed_ms > 0.0 {
            let fps = (f64::from(self.frames_this_tick) * 1000.0 / elapsed_ms).round();
            self.record_fps(fps);
            self.record_render_time(self.render_ms_this_tick / f64::from(self.frames_this_tick));
        }
        self.frames_this_tick = 0;
        self.render_ms_this_tick = 0.0;
        self.report(memory_mb, data_points)
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.fps.len()
    }

    pub fn report(&self, memory_mb: Option<f64>, data_points: usize) -> PerformanceReport {
        let current_fps = self.fps.latest().unwrap_or(0.0);
        let average_fps = self.fps.average().map(f64::round).unwrap_or(0.0);
        let average_render_time_ms = self.render_times.average().unwrap_or(0.0);
        PerformanceReport {
            current_fps,
            average_fps,
            min_fps: self.fps.min().map(f64::round),
            max_fps: self.fps.max().map(f64::round),
            average_render_time_ms,
            memory_mb,
            data_points,
            fps_status: FpsStatus::classify(current_fps),
            average_fps_status: FpsStatus::classify(average_fps),
            memory_status: memory_mb.map(MemoryStatus::classify),
            load: LoadLevel::classify(data_points),
            render_band: RenderTimeBand::classify(average_render_time_ms),
        }
    }
}

/// Running sampler task. Dropping the handle aborts the task, which closes
/// every report subscription.
pub struct SamplerHandle {
    reports: watch::Receiver<PerformanceReport>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn subscribe(&self) -> watch::Receiver<PerformanceReport> {
        self.reports.clone()
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the sampler loop. Frames arrive on `frames`; the dataset size is
/// read from `data_points` at every tick.
pub fn spawn_sampler(
    interval: Duration,
    history_size: usize,
    mut frames: mpsc::Receiver<FrameStats>,
    data_points: watch::Receiver<usize>,
    probe: Arc<dyn MemoryProbe>,
) -> SamplerHandle {
    let mut sampler = PerformanceSampler::new(history_size);
    let (tx, rx) = watch::channel(sampler.report(probe.used_megabytes(), *data_points.borrow()));

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                Some(stats) = frames.recv() => sampler.observe_frame(&stats),
                _ = ticker.tick() => {
                    let elapsed_ms = last_tick.elapsed().as_secs_f64() * 1000.0;
                    last_tick = Instant::now();
                    let report = sampler.tick(elapsed_ms, probe.used_megabytes(), *data_points.borrow());
                    tracing::debug!(
                        fps = report.current_fps,
                        average = report.average_fps,
                        status = report.fps_status.as_str(),
                        "performance sample"
                    );
                    if tx.send(report).is_err() {
                        break;
                    }
                }
            }
        }
    });

    SamplerHandle { reports: rx, task }
}
