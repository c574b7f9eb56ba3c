// Display-list canvas: records draw calls instead of rasterising them
use crate::application::charts::{Canvas, Stroke, TextAlign, TextBaseline, TextStyle, FONT_PX};
use crate::domain::error::ChartResult;
use crate::domain::viewport::{Point, Rect, Viewport};
use serde::Serialize;

/// Average glyph advance of the 12px sans-serif used for labels.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    #[serde(rename_all = "camelCase")]
    BeginFrame {
        backing_width: u32,
        backing_height: u32,
        scale: f64,
    },
    FillRect {
        rect: Rect,
        color: String,
    },
    StrokePath {
        points: Vec<Point>,
        color: String,
        width: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        dash: Option<[f64; 2]>,
    },
    FillPath {
        points: Vec<Point>,
        color: String,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: String,
    },
    FillText {
        text: String,
        at: Point,
        color: String,
        align: TextAlign,
        baseline: TextBaseline,
    },
}

/// Keeps the commands of the most recent frame only.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
    frames: u64,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Number of frames begun on this canvas.
    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Canvas for RecordingCanvas {
    fn begin_frame(&mut self, viewport: &Viewport) -> ChartResult<()> {
        let (backing_width, backing_height) = viewport.backing_size();
        self.commands.clear();
        self.frames += 1;
        self.commands.push(DrawCommand::BeginFrame {
            backing_width,
            backing_height,
            scale: viewport.device_pixel_ratio,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: &str) {
        self.commands.push(DrawCommand::FillRect {
            rect,
            color: color.to_string(),
        });
    }

    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke<'_>) {
        self.commands.push(DrawCommand::StrokePath {
            points: points.to_vec(),
            color: stroke.color.to_string(),
            width: stroke.width,
            dash: stroke.dash,
        });
    }

    fn fill_path(&mut self, points: &[Point], color: &str) {
        self.commands.push(DrawCommand::FillPath {
            points: points.to_vec(),
            color: color.to_string(),
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle<'_>) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
            color: style.color.to_string(),
            align: style.align,
            baseline: style.baseline,
        });
    }

    fn measure_text(&self, text: &str) -> f64 {
        text.chars().count() as f64 * FONT_PX * GLYPH_WIDTH_RATIO
    }
}
