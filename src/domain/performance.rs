// Performance readings, classification bands and the bounded sample window
use serde::Serialize;
use std::collections::VecDeque;

/// Fixed-capacity window of recent readings. The oldest entry is dropped
/// once `capacity` is reached, so `len() <= capacity` always holds.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.samples.iter().copied().reduce(f64::max)
    }

    /// Most recent reading.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FpsStatus {
    Good,
    Warning,
    Critical,
}

impl FpsStatus {
    pub fn classify(fps: f64) -> Self {
        if fps >= 50.0 {
            FpsStatus::Good
        } else if fps >= 30.0 {
            FpsStatus::Warning
        } else {
            FpsStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FpsStatus::Good => "good",
            FpsStatus::Warning => "warning",
            FpsStatus::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryStatus {
    Optimal,
    Warning,
    Critical,
}

impl MemoryStatus {
    pub fn classify(megabytes: f64) -> Self {
        if megabytes < 100.0 {
            MemoryStatus::Optimal
        } else if megabytes < 200.0 {
            MemoryStatus::Warning
        } else {
            MemoryStatus::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadLevel {
    Light,
    Medium,
    Heavy,
}

impl LoadLevel {
    pub fn classify(data_points: usize) -> Self {
        if data_points < 1000 {
            LoadLevel::Light
        } else if data_points < 5000 {
            LoadLevel::Medium
        } else {
            LoadLevel::Heavy
        }
    }
}

/// Frame budget a mean render time fits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderTimeBand {
    #[serde(rename = "60 FPS+")]
    Smooth,
    #[serde(rename = "30 FPS+")]
    Acceptable,
    #[serde(rename = "Below 30 FPS")]
    Slow,
}

impl RenderTimeBand {
    pub fn classify(render_time_ms: f64) -> Self {
        if render_time_ms < 16.0 {
            RenderTimeBand::Smooth
        } else if render_time_ms < 33.0 {
            RenderTimeBand::Acceptable
        } else {
            RenderTimeBand::Slow
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RenderTimeBand::Smooth => "60 FPS+",
            RenderTimeBand::Acceptable => "30 FPS+",
            RenderTimeBand::Slow => "Below 30 FPS",
        }
    }
}

/// Timing of one completed frame as measured by the frame scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    /// Time since the previous frame; absent on the first frame.
    pub frame_time_ms: Option<f64>,
    pub instant_fps: Option<f64>,
    /// Rounded mean over the trailing frame-rate window.
    pub average_fps: Option<f64>,
    pub render_time_ms: f64,
    /// The draw pass failed and was discarded at the frame boundary.
    pub dropped: bool,
}

/// Snapshot published by the performance sampler once per tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub current_fps: f64,
    pub average_fps: f64,
    pub min_fps: Option<f64>,
    pub max_fps: Option<f64>,
    pub average_render_time_ms: f64,
    pub memory_mb: Option<f64>,
    pub data_points: usize,
    pub fps_status: FpsStatus,
    pub average_fps_status: FpsStatus,
    pub memory_status: Option<MemoryStatus>,
    pub load: LoadLevel,
    pub render_band: RenderTimeBand,
}
