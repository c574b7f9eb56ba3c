// Chart component: the rendering surface contract shared by every chart kind
use crate::application::charts::{draw_chart, draw_error_message, draw_fps_overlay, Canvas, ChartStyle};
use crate::application::frame_scheduler::{FrameClock, FrameScheduler, FrameToken, RedrawReason};
use crate::application::hit_test::hit_test;
use crate::domain::error::ChartError;
use crate::domain::hover::HoverState;
use crate::domain::performance::FrameStats;
use crate::domain::sample::{ChartKind, Sample, Sequence};
use crate::domain::viewport::{Point, Viewport};

/// Owns one chart's data, hover state, scheduler and drawing surface.
/// Event handlers only update state and request a redraw; drawing happens
/// when the clock delivers the frame to [`ChartComponent::on_frame`].
pub struct ChartComponent<C, S> {
    kind: ChartKind,
    data: Sequence,
    viewport: Viewport,
    style: ChartStyle,
    hover: Option<HoverState>,
    pointer: Option<Point>,
    scheduler: FrameScheduler<C>,
    surface: Option<S>,
    error: Option<String>,
    disposed: bool,
}

impl<C: FrameClock, S: Canvas> ChartComponent<C, S> {
    /// `surface` is `None` when the host could not provide one; the
    /// component then keeps its state but every draw is a no-op.
    pub fn new(kind: ChartKind, clock: C, surface: Option<S>) -> Self {
        Self {
            kind,
            data: Sequence::new(),
            viewport: Viewport::default(),
            style: ChartStyle::default(),
            hover: None,
            pointer: None,
            scheduler: FrameScheduler::new(clock),
            surface,
            error: None,
            disposed: false,
        }
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn data(&self) -> &[Sample] {
        &self.data
    }

    pub fn hover(&self) -> Option<&HoverState> {
        self.hover.as_ref()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn into_surface(self) -> Option<S> {
        self.surface
    }

    pub fn scheduler(&self) -> &FrameScheduler<C> {
        &self.scheduler
    }

    pub fn clock_mut(&mut self) -> &mut C {
        self.scheduler.clock_mut()
    }

    /// Message of the last failed data load, shown until new data arrives.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[cfg(test)]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn render(&mut self, data: Sequence, viewport: Viewport, style: ChartStyle) {
        if self.disposed {
            return;
        }
        self.viewport = viewport;
        self.style = style;
        self.replace_data(data);
    }

    /// Swap in a new sequence, keeping viewport and style.
    pub fn replace_data(&mut self, data: Sequence) {
        if self.disposed {
            return;
        }
        self.data = data;
        self.error = None;
        self.refresh_hover();
        self.scheduler.invalidate(RedrawReason::DataReplaced);
    }

    /// The data could not be loaded: show an empty chart with `message`.
    pub fn fail(&mut self, message: String) {
        if self.disposed {
            return;
        }
        self.data = Sequence::new();
        self.hover = None;
        self.error = Some(message);
        self.scheduler.invalidate(RedrawReason::DataReplaced);
    }

    pub fn on_pointer_move(&mut self, pointer: Point) {
        if self.disposed {
            return;
        }
        self.pointer = Some(pointer);
        let hover = hit_test(self.kind, &self.data, &self.viewport, &self.style, pointer);
        if hover != self.hover {
            self.hover = hover;
            self.scheduler.invalidate(RedrawReason::HoverChanged);
        }
    }

    pub fn on_pointer_leave(&mut self) {
        if self.disposed {
            return;
        }
        self.pointer = None;
        if self.hover.take().is_some() {
            self.scheduler.invalidate(RedrawReason::HoverChanged);
        }
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        if self.disposed {
            return;
        }
        self.viewport = viewport;
        self.refresh_hover();
        self.scheduler.invalidate(RedrawReason::Resized);
    }

    /// Cancel any pending redraw and ignore every later event.
    pub fn dispose(&mut self) {
        self.scheduler.cancel();
        self.disposed = true;
        self.hover = None;
        self.pointer = None;
    }

    /// Draw the frame `token` was issued for.
    pub fn on_frame(&mut self, token: FrameToken, now_ms: f64) -> Option<FrameStats> {
        if self.disposed {
            return None;
        }
        let Self {
            kind,
            data,
            viewport,
            style,
            hover,
            scheduler,
            surface,
            error,
            ..
        } = self;

        scheduler.fire(token, now_ms, |average_fps| {
            let outcome = match surface.as_mut() {
                None => return Ok(()),
                Some(canvas) => {
                    let drawn = draw_chart(*kind, canvas, data, viewport, style, hover.as_ref());
                    if drawn.is_ok() {
                        if let Some(message) = error.as_deref() {
                            draw_error_message(canvas, viewport, message);
                        }
                        if let Some(fps) = average_fps {
                            draw_fps_overlay(canvas, viewport, fps);
                        }
                    }
                    drawn
                }
            };
            if let Err(ChartError::SurfaceUnavailable) = outcome {
                tracing::warn!(kind = %kind, "drawing surface lost, further draws are skipped");
                *surface = None;
                return Ok(());
            }
            outcome
        })
    }

    /// Re-resolve the hover after the geometry changed. An element that no
    /// longer exists clears it.
    fn refresh_hover(&mut self) {
        self.hover = self
            .pointer
            .and_then(|p| hit_test(self.kind, &self.data, &self.viewport, &self.style, p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::charts::{Stroke, TextStyle};
    use crate::application::frame_scheduler::{SchedulerState, TickClock};
    use crate::domain::error::ChartResult;
    use crate::domain::hover::HoverTarget;
    use crate::domain::viewport::Rect;
    use crate::infrastructure::canvas::{DrawCommand, RecordingCanvas};

    type Component = ChartComponent<TickClock, RecordingCanvas>;

    fn series(n: usize) -> Sequence {
        (0..n).map(|i| Sample::new(i as f64 * 60_000.0, 10.0 + i as f64)).collect()
    }

    fn step(component: &mut ChartComponent<TickClock, impl Canvas>, now_ms: f64) -> Option<FrameStats> {
        let token = component.clock_mut().take_due()?;
        component.on_frame(token, now_ms)
    }

    #[test]
    fn test_render_draws_once() {
        let mut chart = Component::new(ChartKind::Line, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(20), Viewport::default(), ChartStyle::default());
        chart.on_resize(Viewport::new(640.0, 300.0));
        assert!(step(&mut chart, 0.0).is_some());
        assert!(step(&mut chart, 16.0).is_none());

        let canvas = chart.surface().unwrap();
        assert_eq!(canvas.frames(), 1);
        assert!(matches!(
            canvas.commands()[0],
            DrawCommand::BeginFrame { backing_width: 640, backing_height: 300, .. }
        ));
    }

    #[test]
    fn test_fps_overlay_after_second_frame() {
        let mut chart = Component::new(ChartKind::Bar, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(5), Viewport::default(), ChartStyle::default());
        step(&mut chart, 0.0);
        assert!(!chart.surface().unwrap().texts().any(|t| t.starts_with("FPS")));

        chart.on_resize(Viewport::default());
        step(&mut chart, 20.0);
        assert!(chart.surface().unwrap().texts().any(|t| t == "FPS: 50"));
    }

    #[test]
    fn test_pointer_moves_coalesce_into_one_frame() {
        let mut chart = Component::new(ChartKind::Bar, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(4), Viewport::default(), ChartStyle::default());
        step(&mut chart, 0.0);

        for x in [100.0, 110.0, 120.0, 300.0, 700.0] {
            chart.on_pointer_move(Point::new(x, 200.0));
        }
        assert!(matches!(chart.scheduler().state(), SchedulerState::Scheduled(_)));
        step(&mut chart, 16.0);
        assert!(step(&mut chart, 32.0).is_none());
        assert_eq!(chart.surface().unwrap().frames(), 2);
        assert_eq!(chart.hover().map(|h| h.target), Some(HoverTarget::Bar { index: 3 }));
    }

    #[test]
    fn test_pointer_within_same_element_skips_redraw() {
        let mut chart = Component::new(ChartKind::Bar, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(4), Viewport::default(), ChartStyle::default());
        chart.on_pointer_move(Point::new(100.0, 200.0));
        step(&mut chart, 0.0);

        // Same lane, same bar.
        chart.on_pointer_move(Point::new(120.0, 220.0));
        assert_eq!(chart.scheduler().state(), SchedulerState::Idle);
        assert_eq!(chart.hover().map(|h| h.target), Some(HoverTarget::Bar { index: 0 }));

        chart.on_pointer_leave();
        step(&mut chart, 16.0);
        chart.on_pointer_leave();
        assert_eq!(chart.scheduler().state(), SchedulerState::Idle);
        assert_eq!(chart.surface().unwrap().frames(), 2);
    }

    #[test]
    fn test_failed_load_shows_message_until_new_data() {
        let mut chart = Component::new(ChartKind::Line, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(5), Viewport::default(), ChartStyle::default());
        step(&mut chart, 0.0);

        chart.fail("worker offline".to_string());
        assert!(chart.data().is_empty());
        assert_eq!(chart.error(), Some("worker offline"));
        assert!(!step(&mut chart, 16.0).unwrap().dropped);
        assert!(chart.surface().unwrap().texts().any(|t| t.contains("worker offline")));

        chart.replace_data(series(5));
        assert!(chart.error().is_none());
        step(&mut chart, 32.0);
        assert!(!chart.surface().unwrap().texts().any(|t| t.contains("offline")));
    }

    #[test]
    fn test_pointer_leave_clears_hover() {
        let mut chart = Component::new(ChartKind::Bar, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(4), Viewport::default(), ChartStyle::default());
        chart.on_pointer_move(Point::new(100.0, 200.0));
        assert!(chart.hover().is_some());
        chart.on_pointer_leave();
        assert!(chart.hover().is_none());
    }

    #[test]
    fn test_hover_cleared_when_element_disappears() {
        let mut chart = Component::new(ChartKind::Bar, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(4), Viewport::default(), ChartStyle::default());
        // Last lane of four: x 600..780.
        chart.on_pointer_move(Point::new(700.0, 200.0));
        assert_eq!(chart.hover().map(|h| h.target), Some(HoverTarget::Bar { index: 3 }));

        chart.replace_data(Sequence::new());
        assert!(chart.hover().is_none());
    }

    #[test]
    fn test_hover_follows_resize() {
        let mut chart = Component::new(ChartKind::Bar, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(2), Viewport::default(), ChartStyle::default());
        chart.on_pointer_move(Point::new(500.0, 200.0));
        assert_eq!(chart.hover().map(|h| h.target), Some(HoverTarget::Bar { index: 1 }));

        // Narrower canvas: plot is x 60..380, so x=500 is off the plot.
        chart.on_resize(Viewport::new(400.0, 400.0));
        assert!(chart.hover().is_none());
    }

    #[test]
    fn test_dispose_cancels_pending_frame() {
        let mut chart = Component::new(ChartKind::Scatter, TickClock::new(), Some(RecordingCanvas::new()));
        chart.render(series(10), Viewport::default(), ChartStyle::default());
        chart.dispose();
        assert_eq!(chart.scheduler().state(), SchedulerState::Idle);
        assert!(step(&mut chart, 0.0).is_none());

        chart.on_pointer_move(Point::new(100.0, 100.0));
        assert!(step(&mut chart, 16.0).is_none());
        assert_eq!(chart.surface().unwrap().frames(), 0);
    }

    #[test]
    fn test_missing_surface_is_a_no_op() {
        let mut chart: Component = ChartComponent::new(ChartKind::Heatmap, TickClock::new(), None);
        chart.render(series(10), Viewport::default(), ChartStyle::default());
        let stats = step(&mut chart, 0.0).unwrap();
        assert!(!stats.dropped);
    }

    #[test]
    fn test_bad_style_drops_frame_but_keeps_running() {
        let mut chart = Component::new(ChartKind::Heatmap, TickClock::new(), Some(RecordingCanvas::new()));
        let style = ChartStyle {
            color_range: ("blue".to_string(), "#0369a1".to_string()),
            ..ChartStyle::default()
        };
        chart.render(series(10), Viewport::default(), style);
        assert!(step(&mut chart, 0.0).unwrap().dropped);

        chart.render(series(10), Viewport::default(), ChartStyle::default());
        assert!(!step(&mut chart, 16.0).unwrap().dropped);
        assert_eq!(chart.scheduler().frames_dropped(), 1);
    }

    /// Surface that disappears after its first frame.
    struct FailingCanvas {
        inner: RecordingCanvas,
        lost: bool,
    }

    impl Canvas for FailingCanvas {
        fn begin_frame(&mut self, viewport: &Viewport) -> ChartResult<()> {
            if self.lost {
                return Err(ChartError::SurfaceUnavailable);
            }
            self.lost = true;
            self.inner.begin_frame(viewport)
        }
        fn fill_rect(&mut self, rect: Rect, color: &str) {
            self.inner.fill_rect(rect, color)
        }
        fn stroke_path(&mut self, points: &[Point], stroke: &Stroke<'_>) {
            self.inner.stroke_path(points, stroke)
        }
        fn fill_path(&mut self, points: &[Point], color: &str) {
            self.inner.fill_path(points, color)
        }
        fn fill_circle(&mut self, center: Point, radius: f64, color: &str) {
            self.inner.fill_circle(center, radius, color)
        }
        fn fill_text(&mut self, text: &str, at: Point, style: &TextStyle<'_>) {
            self.inner.fill_text(text, at, style)
        }
        fn measure_text(&self, text: &str) -> f64 {
            self.inner.measure_text(text)
        }
    }

    #[test]
    fn test_lost_surface_is_detached() {
        let canvas = FailingCanvas {
            inner: RecordingCanvas::new(),
            lost: false,
        };
        let mut chart = ChartComponent::new(ChartKind::Line, TickClock::new(), Some(canvas));
        chart.render(series(3), Viewport::default(), ChartStyle::default());
        assert!(!step(&mut chart, 0.0).unwrap().dropped);

        chart.on_resize(Viewport::default());
        assert!(!step(&mut chart, 16.0).unwrap().dropped);
        assert!(chart.surface().is_none());
    }
}
