// Live session: a render loop fed by periodic regeneration
use crate::application::chart_component::ChartComponent;
use crate::application::charts::{Canvas, ChartStyle};
use crate::application::data_source::SequenceSource;
use crate::application::frame_scheduler::TickClock;
use crate::application::render_loop::{spawn_render_loop, ChartCommand, RenderLoopHandle};
use crate::domain::error::ChartResult;
use crate::domain::generation::GenerationSpec;
use crate::domain::performance::FrameStats;
use crate::domain::sample::{ChartKind, Sequence};
use crate::domain::viewport::Viewport;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::IntervalStream;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub kind: ChartKind,
    pub spec: GenerationSpec,
    pub viewport: Viewport,
    pub style: ChartStyle,
    /// Display refresh period of the render loop.
    pub refresh: Duration,
    /// How often the data is regenerated.
    pub auto_refresh: Duration,
}

pub struct LiveSession<S> {
    render: RenderLoopHandle<S>,
    refresher: JoinHandle<()>,
}

impl<S> LiveSession<S> {
    /// Stop regenerating, dispose the chart and return it.
    pub async fn shutdown(self) -> Result<ChartComponent<TickClock, S>, JoinError> {
        self.refresher.abort();
        self.render.shutdown().await
    }
}

/// Start a chart on `surface` and keep replacing its data from `source`.
/// Sequence lengths are published on `data_points` for the sampler; frame
/// readings go to `frames`.
pub fn start_live_session<S>(
    source: Arc<dyn SequenceSource>,
    surface: S,
    settings: SessionSettings,
    frames: mpsc::Sender<FrameStats>,
    data_points: watch::Sender<usize>,
) -> LiveSession<S>
where
    S: Canvas + 'static,
{
    let component = ChartComponent::new(settings.kind, TickClock::new(), Some(surface));
    let render = spawn_render_loop(component, settings.refresh, Some(frames));
    let commands = render.sender();
    let _ = commands.send(ChartCommand::Render {
        data: Sequence::new(),
        viewport: settings.viewport,
        style: settings.style.clone(),
    });

    let refresher = tokio::spawn(async move {
        let mut ticks = IntervalStream::new(tokio::time::interval(settings.auto_refresh));
        while ticks.next().await.is_some() {
            let (command, len) = match refresh(source.as_ref(), &settings.spec).await {
                Ok(data) => {
                    let len = data.len();
                    (ChartCommand::Replace(data), len)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "live refresh failed, showing an empty chart");
                    (ChartCommand::Failed(e.to_string()), 0)
                }
            };
            if commands.send(command).is_err() {
                break;
            }
            data_points.send_replace(len);
        }
    });

    LiveSession { render, refresher }
}

/// Generate a fresh sequence and run it through the source's transform pass.
async fn refresh(source: &dyn SequenceSource, spec: &GenerationSpec) -> ChartResult<Sequence> {
    let data = source.generate(spec.clone()).await?;
    source.transform(data).await
}
