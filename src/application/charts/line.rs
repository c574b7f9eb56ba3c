// Line chart with optional area fill
use super::{draw_axes, draw_time_ticks, draw_value_grid, Canvas, ChartStyle, Stroke};
use crate::application::scale::ChartScales;
use crate::domain::error::ChartResult;
use crate::domain::sample::{ChartKind, Sample};
use crate::domain::viewport::{Point, Viewport};

const LINE_WIDTH: f64 = 2.0;
const POINT_RADIUS: f64 = 2.0;
/// Above this many samples only every n-th marker is drawn.
const MAX_MARKERS: usize = 100;

pub fn draw(canvas: &mut dyn Canvas, data: &[Sample], viewport: &Viewport, style: &ChartStyle) -> ChartResult<()> {
    let area = viewport.plot_area();
    let Some(scales) = ChartScales::for_chart(ChartKind::Line, data, area) else {
        return Ok(());
    };
    let at = |s: &Sample| Point::new(scales.x.map(s.timestamp), scales.y.map(s.value));

    draw_value_grid(canvas, area, scales.y.domain);
    draw_time_ticks(canvas, data, area, |i| scales.x.map(data[i].timestamp), true);

    let path: Vec<Point> = data.iter().map(at).collect();

    if style.show_area && data.len() > 1 {
        let baseline = scales.y.map(0.0);
        let mut area_path = Vec::with_capacity(path.len() + 2);
        area_path.push(Point::new(path[0].x, baseline));
        area_path.extend_from_slice(&path);
        area_path.push(Point::new(path[path.len() - 1].x, baseline));
        canvas.fill_path(&area_path, &style.area_color);
    }

    canvas.stroke_path(&path, &Stroke::solid(&style.line_color, LINE_WIDTH));

    if style.show_points {
        let stride = if data.len() > MAX_MARKERS {
            data.len().div_ceil(MAX_MARKERS)
        } else {
            1
        };
        for point in path.iter().step_by(stride) {
            canvas.fill_circle(*point, POINT_RADIUS, &style.line_color);
        }
    }

    draw_axes(canvas, area);
    Ok(())
}
