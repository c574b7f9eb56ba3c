// Render loop: one tokio task per live chart, fired on a fixed refresh tick
use crate::application::chart_component::ChartComponent;
use crate::application::charts::{Canvas, ChartStyle};
use crate::application::frame_scheduler::TickClock;
use crate::domain::performance::FrameStats;
use crate::domain::sample::Sequence;
use crate::domain::viewport::{Point, Viewport};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

/// Events the host forwards to a running chart.
#[derive(Debug, Clone)]
pub enum ChartCommand {
    Render {
        data: Sequence,
        viewport: Viewport,
        style: ChartStyle,
    },
    Replace(Sequence),
    /// Loading new data failed; show an empty chart with this message.
    Failed(String),
    // Pointer and layout input comes from an interactive host; the headless
    // server only feeds data.
    #[allow(dead_code)]
    PointerMove(Point),
    #[allow(dead_code)]
    PointerLeave,
    #[allow(dead_code)]
    Resize(Viewport),
    Dispose,
}

pub struct RenderLoopHandle<S> {
    commands: mpsc::UnboundedSender<ChartCommand>,
    task: JoinHandle<ChartComponent<TickClock, S>>,
}

impl<S> RenderLoopHandle<S> {
    /// Forward `command`; false once the loop has stopped.
    #[cfg(test)]
    pub fn send(&self, command: ChartCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<ChartCommand> {
        self.commands.clone()
    }

    /// Dispose the chart and wait for the loop to hand the component back.
    pub async fn shutdown(self) -> Result<ChartComponent<TickClock, S>, JoinError> {
        let _ = self.commands.send(ChartCommand::Dispose);
        self.task.await
    }
}

/// Drive `component` until it is disposed or every sender is dropped.
/// Completed frames go to `frames` when given; a full channel drops the
/// reading rather than stalling the loop.
pub fn spawn_render_loop<S>(
    mut component: ChartComponent<TickClock, S>,
    refresh: Duration,
    frames: Option<mpsc::Sender<FrameStats>>,
) -> RenderLoopHandle<S>
where
    S: Canvas + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let kind = component.kind();

    let task = tokio::spawn(async move {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(%kind, refresh_ms = refresh.as_millis() as u64, "render loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(token) = component.clock_mut().take_due() else {
                        continue;
                    };
                    let now_ms = started.elapsed().as_secs_f64() * 1000.0;
                    if let (Some(stats), Some(frames)) = (component.on_frame(token, now_ms), &frames) {
                        if frames.try_send(stats).is_err() {
                            tracing::trace!("frame stats channel full, reading dropped");
                        }
                    }
                }
                command = rx.recv() => match command {
                    Some(ChartCommand::Dispose) | None => {
                        component.dispose();
                        break;
                    }
                    Some(command) => apply(&mut component, command),
                },
            }
        }

        tracing::info!(
            %kind,
            drawn = component.scheduler().frames_drawn(),
            dropped = component.scheduler().frames_dropped(),
            "render loop stopped"
        );
        component
    });

    RenderLoopHandle { commands: tx, task }
}

fn apply<S: Canvas>(component: &mut ChartComponent<TickClock, S>, command: ChartCommand) {
    match command {
        ChartCommand::Render { data, viewport, style } => component.render(data, viewport, style),
        ChartCommand::Replace(data) => component.replace_data(data),
        ChartCommand::Failed(message) => component.fail(message),
        ChartCommand::PointerMove(at) => component.on_pointer_move(at),
        ChartCommand::PointerLeave => component.on_pointer_leave(),
        ChartCommand::Resize(viewport) => component.on_resize(viewport),
        ChartCommand::Dispose => component.dispose(),
    }
}
