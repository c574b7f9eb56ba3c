// Bar chart, one bar per sample in sequence order
use super::{draw_axes, draw_time_ticks, draw_tooltip, draw_value_grid, Canvas, ChartStyle};
use crate::application::color::Rgb;
use crate::application::scale::ChartScales;
use crate::domain::error::ChartResult;
use crate::domain::hover::{HoverState, HoverTarget};
use crate::domain::sample::{ChartKind, Sample};
use crate::domain::viewport::{Rect, Viewport};

/// Horizontal gap between neighbouring bars.
pub const BAR_PADDING: f64 = 2.0;

/// Painted rectangle of bar `index`. Its width is not clamped, so a dense
/// chart may report a negative width; painting widens it to 1px.
pub fn bar_rect(scales: &ChartScales, area: Rect, index: usize, value: f64, count: usize) -> Rect {
    let width = area.width / count as f64 - BAR_PADDING;
    let x = scales.x.map(index as f64) + BAR_PADDING / 2.0;
    let y = scales.y.map(value);
    Rect::new(x, y, width, area.y + area.height - y)
}

pub fn draw(
    canvas: &mut dyn Canvas,
    data: &[Sample],
    viewport: &Viewport,
    style: &ChartStyle,
    hover: Option<&HoverState>,
) -> ChartResult<()> {
    let area = viewport.plot_area();
    let Some(scales) = ChartScales::for_chart(ChartKind::Bar, data, area) else {
        return Ok(());
    };
    let base: Rgb = style.bar_color.parse()?;
    let highlight = format!("hsl({}, 100%, 40%)", base.r);

    if style.show_grid {
        draw_value_grid(canvas, area, scales.y.domain);
    }
    draw_time_ticks(canvas, data, area, |i| scales.x.map(i as f64), style.show_grid);

    let hovered = match hover.map(|h| h.target) {
        Some(HoverTarget::Bar { index }) => Some(index),
        _ => None,
    };

    for (i, sample) in data.iter().enumerate() {
        let mut rect = bar_rect(&scales, area, i, sample.value, data.len());
        rect.width = rect.width.max(1.0);
        let color = if hovered == Some(i) { highlight.as_str() } else { style.bar_color.as_str() };
        canvas.fill_rect(rect, color);
    }

    if let Some(hover) = hover {
        draw_tooltip(canvas, &hover.tooltip, area);
    }

    draw_axes(canvas, area);
    Ok(())
}
