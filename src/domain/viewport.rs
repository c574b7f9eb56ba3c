// Viewport and pixel geometry
use serde::{Deserialize, Serialize};

const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
const DEFAULT_CANVAS_HEIGHT: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            self.width - 2.0 * amount,
            self.height - 2.0 * amount,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 40.0,
            left: 60.0,
        }
    }
}

/// Canvas size in CSS pixels plus the plot margins. Rebuilt every frame from
/// the host measurement, never stored beyond the component that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub canvas_width: f64,
    pub canvas_height: f64,
    #[serde(default)]
    pub margin: Margin,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

fn default_device_pixel_ratio() -> f64 {
    1.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl Viewport {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            canvas_width,
            canvas_height,
            margin: Margin::default(),
            device_pixel_ratio: 1.0,
        }
    }

    /// Build a viewport from a host measurement. Missing or unusable values
    /// fall back to an 800x400 canvas at ratio 1.
    pub fn measure(host_width: Option<f64>, host_height: Option<f64>, device_pixel_ratio: Option<f64>) -> Self {
        let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        Self {
            canvas_width: usable(host_width).unwrap_or(DEFAULT_CANVAS_WIDTH),
            canvas_height: usable(host_height).unwrap_or(DEFAULT_CANVAS_HEIGHT),
            margin: Margin::default(),
            device_pixel_ratio: usable(device_pixel_ratio).unwrap_or(1.0),
        }
    }

    #[cfg(test)]
    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn plot_width(&self) -> f64 {
        (self.canvas_width - self.margin.left - self.margin.right).max(0.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.canvas_height - self.margin.top - self.margin.bottom).max(0.0)
    }

    pub fn plot_area(&self) -> Rect {
        Rect::new(self.margin.left, self.margin.top, self.plot_width(), self.plot_height())
    }

    /// Device pixels backing the canvas.
    pub fn backing_size(&self) -> (u32, u32) {
        let ratio = if self.device_pixel_ratio > 0.0 { self.device_pixel_ratio } else { 1.0 };
        (
            (self.canvas_width * ratio).round().max(0.0) as u32,
            (self.canvas_height * ratio).round().max(0.0) as u32,
        )
    }
}
