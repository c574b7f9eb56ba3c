// Scatter plot with a least-squares trend line
use super::{draw_axes, draw_time_ticks, draw_tooltip, draw_value_grid, Canvas, ChartStyle, Stroke};
use crate::application::regression;
use crate::application::scale::ChartScales;
use crate::domain::error::ChartResult;
use crate::domain::hover::{HoverState, HoverTarget};
use crate::domain::sample::{ChartKind, Sample};
use crate::domain::viewport::{Point, Viewport};

const REGRESSION_COLOR: &str = "#f59e0b";
const HOVER_COLOR: &str = "#ef4444";
const HOVER_SCALE: f64 = 1.5;

/// Pixel position of sample `index`.
pub fn point_at(scales: &ChartScales, index: usize, sample: &Sample) -> Point {
    Point::new(scales.x.map(index as f64), scales.y.map(sample.value))
}

pub fn draw(
    canvas: &mut dyn Canvas,
    data: &[Sample],
    viewport: &Viewport,
    style: &ChartStyle,
    hover: Option<&HoverState>,
) -> ChartResult<()> {
    let area = viewport.plot_area();
    let Some(scales) = ChartScales::for_chart(ChartKind::Scatter, data, area) else {
        return Ok(());
    };

    draw_value_grid(canvas, area, scales.y.domain);
    draw_time_ticks(canvas, data, area, |i| scales.x.map(i as f64), true);

    if style.show_regression_line {
        if let Some(line) = regression::fit_samples(data) {
            let x_max = (data.len() - 1) as f64;
            canvas.stroke_line(
                Point::new(area.x, scales.y.map(line.y_at(0.0))),
                Point::new(area.x + area.width, scales.y.map(line.y_at(x_max))),
                &Stroke::dashed(REGRESSION_COLOR, 2.0, [5.0, 5.0]),
            );
        }
    }

    let hovered = match hover.map(|h| h.target) {
        Some(HoverTarget::Point { index }) => Some(index),
        _ => None,
    };

    for (i, sample) in data.iter().enumerate() {
        let center = point_at(&scales, i, sample);
        if hovered == Some(i) {
            canvas.fill_circle(center, style.point_size * HOVER_SCALE, HOVER_COLOR);
        } else {
            canvas.fill_circle(center, style.point_size, &style.point_color);
        }
    }

    if let Some(hover) = hover {
        draw_tooltip(canvas, &hover.tooltip, area);
    }

    draw_axes(canvas, area);
    Ok(())
}
