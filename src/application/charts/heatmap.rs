// Heatmap over a time x value grid
use super::{draw_axes, draw_tooltip, format_clock, Canvas, ChartStyle, TextAlign, TextBaseline, TextStyle};
use crate::application::binning::{self, HeatGrid};
use crate::application::color::Gradient;
use crate::domain::error::ChartResult;
use crate::domain::hover::{HoverState, HoverTarget};
use crate::domain::sample::Sample;
use crate::domain::viewport::{Point, Rect, Viewport};

const LABEL_COLOR: &str = "#6b7280";
const HOVER_BORDER: f64 = 2.0;
const MAX_AXIS_TICKS: usize = 5;

/// Rebin `data` for the plot area of `viewport`. Grids never outlive a frame.
pub fn bin_for(data: &[Sample], viewport: &Viewport, style: &ChartStyle) -> HeatGrid {
    binning::bin(data, viewport.plot_width(), viewport.plot_height(), style.cell_size)
}

/// Pixel rectangle of `(row, col)` inside `area`.
pub fn cell_rect(grid: &HeatGrid, area: Rect, row: usize, col: usize) -> Rect {
    let (cell_width, cell_height) = grid.cell_extent(area.width, area.height);
    Rect::new(
        area.x + col as f64 * cell_width,
        area.y + row as f64 * cell_height,
        cell_width,
        cell_height,
    )
}

pub fn draw(
    canvas: &mut dyn Canvas,
    data: &[Sample],
    viewport: &Viewport,
    style: &ChartStyle,
    hover: Option<&HoverState>,
) -> ChartResult<()> {
    let gradient = Gradient::parse(&style.color_range.0, &style.color_range.1)?;
    let area = viewport.plot_area();
    let grid = bin_for(data, viewport, style);
    let Some(values) = grid.value_domain() else {
        return Ok(());
    };

    let hovered = match hover.map(|h| h.target) {
        Some(HoverTarget::Cell { row, col }) => Some((row, col)),
        _ => None,
    };

    for (row, col, cell) in grid.occupied() {
        let rect = cell_rect(&grid, area, row, col);
        let rect = if hovered == Some((row, col)) { rect.inset(HOVER_BORDER) } else { rect };
        let color = gradient.interpolate(cell.running_average, values.min, values.max);
        canvas.fill_rect(rect, &color.to_hex());
    }

    if let Some(hover) = hover {
        draw_tooltip(canvas, &hover.tooltip, area);
    }

    if style.show_axis_labels {
        draw_axis_labels(canvas, &grid, area);
    }

    draw_axes(canvas, area);
    Ok(())
}

fn draw_axis_labels(canvas: &mut dyn Canvas, grid: &HeatGrid, area: Rect) {
    let (cell_width, cell_height) = grid.cell_extent(area.width, area.height);
    let (rows, cols) = (grid.rows(), grid.cols());

    let time_label = TextStyle::new(LABEL_COLOR, TextAlign::Center, TextBaseline::Top);
    let x_ticks = MAX_AXIS_TICKS.min(cols);
    for i in 0..=x_ticks {
        let col = ((i as f64 / x_ticks as f64) * (cols - 1) as f64).floor() as usize;
        // Label with the first occupied cell of the column, if any.
        let timestamp = (0..rows).find_map(|row| grid.occupied_cell(row, col)).map(|c| c.last_timestamp);
        if let Some(timestamp) = timestamp {
            let x = area.x + (col as f64 + 0.5) * cell_width;
            canvas.fill_text(&format_clock(timestamp), Point::new(x, area.y + area.height + 10.0), &time_label);
        }
    }

    let Some(values) = grid.value_domain() else {
        return;
    };
    let value_label = TextStyle::new(LABEL_COLOR, TextAlign::Right, TextBaseline::Middle);
    let y_ticks = MAX_AXIS_TICKS.min(rows);
    for i in 0..=y_ticks {
        let row = ((i as f64 / y_ticks as f64) * (rows - 1) as f64).floor() as usize;
        let y = area.y + (row as f64 + 0.5) * cell_height;
        // Row 0 holds the largest values; a single row shows the maximum.
        let fraction = if rows > 1 { 1.0 - row as f64 / (rows - 1) as f64 } else { 1.0 };
        let value = values.min + fraction * values.span();
        canvas.fill_text(&format!("{:.2}", value), Point::new(area.x - 10.0, y), &value_label);
    }
}
