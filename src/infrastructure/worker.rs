// Background worker thread answering data source requests
use crate::application::data_source::{DataSourceAdapter, WorkerEvent, WorkerRequest, WorkerTransport};
use crate::domain::error::{ChartError, ChartResult};
use crate::domain::sample::Sequence;
use crate::infrastructure::generator::SyntheticGenerator;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

/// Request half of a worker channel.
pub struct ChannelTransport {
    requests: mpsc::UnboundedSender<WorkerRequest>,
}

impl WorkerTransport for ChannelTransport {
    fn post(&self, request: WorkerRequest) -> ChartResult<()> {
        self.requests
            .send(request)
            .map_err(|_| ChartError::GenerationFailure("worker thread has stopped".to_string()))
    }
}

pub struct WorkerChannel {
    pub transport: Arc<ChannelTransport>,
    pub events: mpsc::UnboundedReceiver<WorkerEvent>,
}

/// Start a worker on its own OS thread so generation never runs on the
/// async runtime. The thread is detached; it exits once the transport is
/// dropped, which closes `events`.
pub fn spawn_worker(generator: SyntheticGenerator) -> std::io::Result<WorkerChannel> {
    let (requests_tx, requests_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("sequence-worker".to_string())
        .spawn(move || run(generator, requests_rx, events_tx))?;
    Ok(WorkerChannel {
        transport: Arc::new(ChannelTransport { requests: requests_tx }),
        events: events_rx,
    })
}

/// Spawn a worker and wire an adapter to it. Must be called inside a tokio
/// runtime.
pub fn connect_worker(generator: SyntheticGenerator) -> std::io::Result<DataSourceAdapter> {
    let WorkerChannel { transport, events } = spawn_worker(generator)?;
    Ok(DataSourceAdapter::connect(transport, events))
}

fn run(
    mut generator: SyntheticGenerator,
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    tracing::debug!("sequence worker started");
    while let Some(request) = requests.blocking_recv() {
        let event = match request {
            WorkerRequest::Init => WorkerEvent::Ready,
            WorkerRequest::Generate { id, spec } => {
                let now_ms = chrono::Utc::now().timestamp_millis() as f64;
                match generator.generate(&spec, now_ms) {
                    Ok(data) => {
                        tracing::debug!(id, points = data.len(), "generated sequence");
                        WorkerEvent::Completed { id, data }
                    }
                    Err(e) => WorkerEvent::Failed { id, error: e.to_string() },
                }
            }
            WorkerRequest::Transform { id, data } => WorkerEvent::Completed {
                id,
                data: transform(data),
            },
        };
        if events.send(event).is_err() {
            break;
        }
    }
    tracing::debug!("sequence worker stopped");
}

/// Drop samples that cannot be plotted and order the rest by time. Samples
/// sharing a timestamp keep their relative order.
pub fn transform(mut data: Sequence) -> Sequence {
    data.retain(|s| s.timestamp.is_finite() && s.value.is_finite());
    data.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    data
}
