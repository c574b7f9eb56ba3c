// Chart draw routines and the canvas port they paint through
pub mod bar;
pub mod heatmap;
pub mod line;
pub mod scatter;

use crate::application::binning::DEFAULT_CELL_SIZE;
use crate::application::scale::Domain;
use crate::domain::error::ChartResult;
use crate::domain::hover::{HoverState, Tooltip};
use crate::domain::sample::{ChartKind, Sample};
use crate::domain::viewport::{Point, Rect, Viewport};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const GRID_COLOR: &str = "#e5e7eb";
const LABEL_COLOR: &str = "#6b7280";
const AXIS_COLOR: &str = "#9ca3af";
const TOOLTIP_BACKGROUND: &str = "rgba(0, 0, 0, 0.8)";
const TOOLTIP_TEXT: &str = "#fff";
const OVERLAY_TEXT: &str = "#000";
const ERROR_TEXT: &str = "#ef4444";
pub const FONT_PX: f64 = 12.0;
const VALUE_TICKS: usize = 5;
const MAX_TIME_TICKS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Top,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle<'a> {
    pub color: &'a str,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

impl<'a> TextStyle<'a> {
    pub fn new(color: &'a str, align: TextAlign, baseline: TextBaseline) -> Self {
        Self { color, align, baseline }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f64,
    pub dash: Option<[f64; 2]>,
}

impl<'a> Stroke<'a> {
    pub fn solid(color: &'a str, width: f64) -> Self {
        Self { color, width, dash: None }
    }

    pub fn dashed(color: &'a str, width: f64, dash: [f64; 2]) -> Self {
        Self {
            color,
            width,
            dash: Some(dash),
        }
    }
}

/// A 2-D drawing surface. Coordinates are CSS pixels; the surface applies
/// the device pixel ratio itself.
pub trait Canvas: Send {
    /// Resize the backing store for `viewport` and clear it.
    fn begin_frame(&mut self, viewport: &Viewport) -> ChartResult<()>;
    fn fill_rect(&mut self, rect: Rect, color: &str);
    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke<'_>);
    fn fill_path(&mut self, points: &[Point], color: &str);
    fn fill_circle(&mut self, center: Point, radius: f64, color: &str);
    fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle<'_>);
    fn measure_text(&self, text: &str) -> f64;

    fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke<'_>) {
        self.stroke_path(&[from, to], stroke);
    }
}

/// Presentation options shared by every chart kind. Each kind reads the
/// fields that apply to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartStyle {
    pub line_color: String,
    pub area_color: String,
    pub show_area: bool,
    pub show_points: bool,
    pub bar_color: String,
    pub show_grid: bool,
    pub point_color: String,
    pub point_size: f64,
    pub show_regression_line: bool,
    pub color_range: (String, String),
    pub cell_size: f64,
    pub show_axis_labels: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            line_color: "#3b82f6".to_string(),
            area_color: "rgba(59, 130, 246, 0.2)".to_string(),
            show_area: true,
            show_points: true,
            bar_color: "#3b82f6".to_string(),
            show_grid: true,
            point_color: "#3b82f6".to_string(),
            point_size: 5.0,
            show_regression_line: true,
            color_range: ("#f0f9ff".to_string(), "#0369a1".to_string()),
            cell_size: DEFAULT_CELL_SIZE,
            show_axis_labels: true,
        }
    }
}

/// Paint one full frame of `kind` onto `canvas`.
pub fn draw_chart(
    kind: ChartKind,
    canvas: &mut dyn Canvas,
    data: &[Sample],
    viewport: &Viewport,
    style: &ChartStyle,
    hover: Option<&HoverState>,
) -> ChartResult<()> {
    canvas.begin_frame(viewport)?;
    if data.is_empty() {
        return Ok(());
    }
    match kind {
        ChartKind::Line => line::draw(canvas, data, viewport, style),
        ChartKind::Bar => bar::draw(canvas, data, viewport, style, hover),
        ChartKind::Scatter => scatter::draw(canvas, data, viewport, style, hover),
        ChartKind::Heatmap => heatmap::draw(canvas, data, viewport, style, hover),
    }
}

pub fn format_clock(timestamp: f64) -> String {
    local_time(timestamp)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn format_date_time(timestamp: f64) -> String {
    local_time(timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn local_time(timestamp: f64) -> Option<DateTime<Local>> {
    if !timestamp.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(timestamp as i64).map(|t| t.with_timezone(&Local))
}

/// Horizontal grid lines with their value labels, five intervals top to bottom.
pub(crate) fn draw_value_grid(canvas: &mut dyn Canvas, area: Rect, values: Domain) {
    let grid = Stroke::solid(GRID_COLOR, 1.0);
    let label = TextStyle::new(LABEL_COLOR, TextAlign::Right, TextBaseline::Middle);
    for i in 0..=VALUE_TICKS {
        let y = area.y + (i as f64 * area.height) / VALUE_TICKS as f64;
        canvas.stroke_line(Point::new(area.x, y), Point::new(area.x + area.width, y), &grid);
        let value = values.min + ((VALUE_TICKS - i) as f64 / VALUE_TICKS as f64) * values.span();
        canvas.fill_text(&format!("{:.2}", value), Point::new(area.x - 10.0, y), &label);
    }
}

/// Up to ten time labels below the plot, optionally with vertical grid lines.
pub(crate) fn draw_time_ticks(
    canvas: &mut dyn Canvas,
    data: &[Sample],
    area: Rect,
    x_at: impl Fn(usize) -> f64,
    with_lines: bool,
) {
    let ticks = MAX_TIME_TICKS.min(data.len());
    if ticks == 0 {
        return;
    }
    let grid = Stroke::solid(GRID_COLOR, 1.0);
    let label = TextStyle::new(LABEL_COLOR, TextAlign::Center, TextBaseline::Top);
    for i in 0..=ticks {
        let index = ((i as f64 / ticks as f64) * (data.len() - 1) as f64).floor() as usize;
        let x = x_at(index);
        if with_lines {
            canvas.stroke_line(Point::new(x, area.y), Point::new(x, area.y + area.height), &grid);
        }
        canvas.fill_text(
            &format_clock(data[index].timestamp),
            Point::new(x, area.y + area.height + 10.0),
            &label,
        );
    }
}

pub(crate) fn draw_axes(canvas: &mut dyn Canvas, area: Rect) {
    let axis = Stroke::solid(AXIS_COLOR, 1.0);
    let bottom = area.y + area.height;
    canvas.stroke_line(Point::new(area.x, area.y), Point::new(area.x, bottom), &axis);
    canvas.stroke_line(Point::new(area.x, bottom), Point::new(area.x + area.width, bottom), &axis);
}

/// Tooltip box above the hovered element, kept inside the plot horizontally.
pub(crate) fn draw_tooltip(canvas: &mut dyn Canvas, tooltip: &Tooltip, area: Rect) {
    let text = format!("{:.2} ({})", tooltip.value, format_date_time(tooltip.timestamp));
    let text_width = canvas.measure_text(&text);
    let x = (tooltip.x - text_width / 2.0 - 10.0)
        .max(area.x)
        .min(area.x + area.width - text_width - 20.0);
    canvas.fill_rect(Rect::new(x, tooltip.y - 30.0, text_width + 20.0, 25.0), TOOLTIP_BACKGROUND);
    canvas.fill_text(
        &text,
        Point::new(x + 10.0, tooltip.y - 18.0),
        &TextStyle::new(TOOLTIP_TEXT, TextAlign::Left, TextBaseline::Middle),
    );
}

/// Centred notice drawn over a chart whose data failed to load.
pub fn draw_error_message(canvas: &mut dyn Canvas, viewport: &Viewport, message: &str) {
    canvas.fill_text(
        &format!("Error: {}", message),
        Point::new(viewport.canvas_width / 2.0, viewport.canvas_height / 2.0),
        &TextStyle::new(ERROR_TEXT, TextAlign::Center, TextBaseline::Middle),
    );
}

pub fn draw_fps_overlay(canvas: &mut dyn Canvas, viewport: &Viewport, average_fps: f64) {
    canvas.fill_text(
        &format!("FPS: {}", average_fps.round()),
        Point::new(viewport.canvas_width - 10.0, 10.0),
        &TextStyle::new(OVERLAY_TEXT, TextAlign::Right, TextBaseline::Top),
    );
}

