// Data source adapter: correlated request/response over a worker channel
use crate::domain::error::{ChartError, ChartResult};
use crate::domain::generation::GenerationSpec;
use crate::domain::sample::Sequence;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};

/// Anything that can produce or reshape a sequence without blocking the caller.
#[async_trait]
pub trait SequenceSource: Send + Sync {
    async fn generate(&self, spec: GenerationSpec) -> ChartResult<Sequence>;

    async fn transform(&self, data: Sequence) -> ChartResult<Sequence>;
}

/// Messages posted to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerRequest {
    Init,
    Generate { id: u64, spec: GenerationSpec },
    Transform { id: u64, data: Sequence },
}

/// Messages coming back from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Ready,
    Completed { id: u64, data: Sequence },
    Failed { id: u64, error: String },
    /// The channel itself broke; nothing sent so far will be answered.
    ChannelError(String),
}

/// Outbound half of the worker channel.
pub trait WorkerTransport: Send + Sync {
    fn post(&self, request: WorkerRequest) -> ChartResult<()>;
}

type Waiter = oneshot::Sender<ChartResult<Sequence>>;

struct AdapterState {
    transport: Arc<dyn WorkerTransport>,
    /// Bumped on every reinitialisation so a stale event pump cannot touch
    /// the new channel.
    epoch: u64,
    ready: bool,
    failure: Option<String>,
    pending: HashMap<u64, Waiter>,
    queued: Vec<WorkerRequest>,
}

impl AdapterState {
    fn reject_all(&mut self, reason: &str) {
        self.ready = false;
        self.failure = Some(reason.to_string());
        self.queued.clear();
        for (_, waiter) in self.pending.drain() {
            let _ = waiter.send(Err(ChartError::GenerationFailure(reason.to_string())));
        }
    }

    fn post_or_fail(&mut self, request: WorkerRequest) {
        if let Err(e) = self.transport.post(request) {
            tracing::error!(error = %e, "worker channel rejected a request");
            self.reject_all(&e.to_string());
        }
    }
}

/// Async facade in front of a background worker. Cloning shares the same
/// channel and pending table.
#[derive(Clone)]
pub struct DataSourceAdapter {
    state: Arc<Mutex<AdapterState>>,
    next_id: Arc<AtomicU64>,
}

impl DataSourceAdapter {
    /// Wrap `transport` and send it the init handshake. Requests made before
    /// the worker reports ready are queued.
    pub fn new(transport: Arc<dyn WorkerTransport>) -> Self {
        let mut state = AdapterState {
            transport,
            epoch: 0,
            ready: false,
            failure: None,
            pending: HashMap::new(),
            queued: Vec::new(),
        };
        state.post_or_fail(WorkerRequest::Init);
        Self {
            state: Arc::new(Mutex::new(state)),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Build an adapter and pump `events` into it on a background task.
    /// When the event stream ends every outstanding request is rejected.
    pub fn connect(transport: Arc<dyn WorkerTransport>, events: mpsc::UnboundedReceiver<WorkerEvent>) -> Self {
        let adapter = Self::new(transport);
        adapter.spawn_pump(0, events);
        adapter
    }

    /// Swap in a fresh worker channel after a failure. Anything still
    /// outstanding on the old channel is rejected.
    // No production caller yet: the server builds one adapter at startup.
    #[allow(dead_code)]
    pub fn reinitialize(&self, transport: Arc<dyn WorkerTransport>, events: mpsc::UnboundedReceiver<WorkerEvent>) {
        let epoch = {
            let mut state = self.lock();
            state.reject_all("worker reinitialized");
            state.transport = transport;
            state.epoch += 1;
            state.failure = None;
            state.post_or_fail(WorkerRequest::Init);
            state.epoch
        };
        tracing::info!(epoch, "worker channel reinitialized");
        self.spawn_pump(epoch, events);
    }

    #[cfg(test)]
    pub fn handle_event(&self, event: WorkerEvent) {
        let epoch = self.lock().epoch;
        self.handle_event_from(epoch, event);
    }

    #[cfg(test)]
    pub fn pending_requests(&self) -> usize {
        self.lock().pending.len()
    }

    #[cfg(test)]
    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    #[cfg(test)]
    pub fn failure(&self) -> Option<String> {
        self.lock().failure.clone()
    }

    fn spawn_pump(&self, epoch: u64, mut events: mpsc::UnboundedReceiver<WorkerEvent>) {
        let adapter = self.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                adapter.handle_event_from(epoch, event);
            }
            adapter.handle_event_from(epoch, WorkerEvent::ChannelError("worker channel closed".to_string()));
        });
    }

    fn handle_event_from(&self, epoch: u64, event: WorkerEvent) {
        let mut state = self.lock();
        if state.epoch != epoch {
            tracing::trace!(epoch, "ignoring event from a retired worker");
            return;
        }
        match event {
            WorkerEvent::Ready => {
                if state.ready {
                    return;
                }
                state.ready = true;
                let queued = std::mem::take(&mut state.queued);
                tracing::debug!(queued = queued.len(), "worker ready, flushing queued requests");
                for request in queued {
                    state.post_or_fail(request);
                    if state.failure.is_some() {
                        break;
                    }
                }
            }
            WorkerEvent::Completed { id, data } => match state.pending.remove(&id) {
                Some(waiter) => {
                    let _ = waiter.send(Ok(data));
                }
                None => tracing::debug!(id, "dropping response with no waiter"),
            },
            WorkerEvent::Failed { id, error } => match state.pending.remove(&id) {
                Some(waiter) => {
                    let _ = waiter.send(Err(ChartError::GenerationFailure(error)));
                }
                None => tracing::debug!(id, "dropping failure with no waiter"),
            },
            WorkerEvent::ChannelError(reason) => {
                if state.failure.is_none() {
                    tracing::error!(%reason, pending = state.pending.len(), "worker channel failed");
                    state.reject_all(&reason);
                }
            }
        }
    }

    async fn submit(&self, build: impl FnOnce(u64) -> WorkerRequest) -> ChartResult<Sequence> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            if let Some(reason) = &state.failure {
                return Err(ChartError::GenerationFailure(reason.clone()));
            }
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            state.pending.insert(id, tx);
            let request = build(id);
            if state.ready {
                state.post_or_fail(request);
            } else {
                state.queued.push(request);
            }
        }
        rx.await
            .unwrap_or_else(|_| Err(ChartError::GenerationFailure("request abandoned".to_string())))
    }

    fn lock(&self) -> MutexGuard<'_, AdapterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SequenceSource for DataSourceAdapter {
    async fn generate(&self, spec: GenerationSpec) -> ChartResult<Sequence> {
        self.submit(|id| WorkerRequest::Generate { id, spec }).await
    }

    async fn transform(&self, data: Sequence) -> ChartResult<Sequence> {
        self.submit(|id| WorkerRequest::Transform { id, data }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::GenerationRequest;
    use crate::domain::sample::{ChartKind, Sample};
    use std::time::Duration;

    /// Records posted requests; answers are injected by the test.
    #[derive(Default)]
    struct FakeTransport {
        posted: Mutex<Vec<WorkerRequest>>,
        broken: bool,
    }

    impl FakeTransport {
        fn posted(&self) -> Vec<WorkerRequest> {
            self.posted.lock().unwrap().clone()
        }

        fn generate_ids(&self) -> Vec<u64> {
            self.posted()
                .into_iter()
                .filter_map(|r| match r {
                    WorkerRequest::Generate { id, .. } => Some(id),
                    _ => None,
                })
                .collect()
        }
    }

    impl WorkerTransport for FakeTransport {
        fn post(&self, request: WorkerRequest) -> ChartResult<()> {
            if self.broken {
                return Err(ChartError::GenerationFailure("transport closed".to_string()));
            }
            self.posted.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn spec(count: usize) -> GenerationSpec {
        GenerationSpec::from(&GenerationRequest::new(ChartKind::Line, count))
    }

    fn one(value: f64) -> Sequence {
        vec![Sample::new(0.0, value)]
    }

    async fn wait_for_pending(adapter: &DataSourceAdapter, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while adapter.pending_requests() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("requests never registered");
    }

    #[tokio::test]
    async fn test_requests_before_ready_resolve_after_one_ready() {
        let transport = Arc::new(FakeTransport::default());
        let adapter = DataSourceAdapter::new(transport.clone());

        let first = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.generate(spec(10)).await }
        });
        let second = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.generate(spec(20)).await }
        });
        wait_for_pending(&adapter, 2).await;
        assert_eq!(transport.posted(), vec![WorkerRequest::Init]);

        adapter.handle_event(WorkerEvent::Ready);
        adapter.handle_event(WorkerEvent::Ready);
        let ids = transport.generate_ids();
        assert_eq!(ids.len(), 2);

        // Answer out of order; each caller must get its own result.
        let posted = transport.posted();
        for request in posted.iter().rev() {
            if let WorkerRequest::Generate { id, spec } = request {
                let GenerationSpec::TimeSeries(options) = spec else {
                    panic!("expected a time series spec");
                };
                adapter.handle_event(WorkerEvent::Completed {
                    id: *id,
                    data: one(options.count as f64),
                });
            }
        }

        let mut results = vec![
            first.await.unwrap().unwrap()[0].value,
            second.await.unwrap().unwrap()[0].value,
        ];
        results.sort_by(f64::total_cmp);
        assert_eq!(results, vec![10.0, 20.0]);
        assert_eq!(adapter.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_ready_adapter_posts_immediately() {
        let transport = Arc::new(FakeTransport::default());
        let adapter = DataSourceAdapter::new(transport.clone());
        adapter.handle_event(WorkerEvent::Ready);

        let task = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.transform(one(3.0)).await }
        });
        wait_for_pending(&adapter, 1).await;
        let id = match transport.posted().last() {
            Some(WorkerRequest::Transform { id, .. }) => *id,
            other => panic!("unexpected request {:?}", other),
        };
        adapter.handle_event(WorkerEvent::Completed { id, data: one(4.0) });
        assert_eq!(task.await.unwrap().unwrap(), one(4.0));
    }

    #[tokio::test]
    async fn test_unmatched_response_is_dropped() {
        let transport = Arc::new(FakeTransport::default());
        let adapter = DataSourceAdapter::new(transport.clone());
        adapter.handle_event(WorkerEvent::Ready);
        adapter.handle_event(WorkerEvent::Completed { id: 999, data: one(1.0) });
        adapter.handle_event(WorkerEvent::Failed {
            id: 998,
            error: "boom".to_string(),
        });
        assert!(adapter.is_ready());
        assert!(adapter.failure().is_none());
    }

    #[tokio::test]
    async fn test_worker_failure_rejects_only_that_request() {
        let transport = Arc::new(FakeTransport::default());
        let adapter = DataSourceAdapter::new(transport.clone());
        adapter.handle_event(WorkerEvent::Ready);

        let task = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.generate(spec(5)).await }
        });
        wait_for_pending(&adapter, 1).await;
        let id = transport.generate_ids()[0];
        adapter.handle_event(WorkerEvent::Failed {
            id,
            error: "bad options".to_string(),
        });
        assert_eq!(
            task.await.unwrap(),
            Err(ChartError::GenerationFailure("bad options".to_string()))
        );
        assert!(adapter.failure().is_none());
    }

    #[tokio::test]
    async fn test_channel_error_rejects_everything_until_reinitialized() {
        let transport = Arc::new(FakeTransport::default());
        let adapter = DataSourceAdapter::new(transport.clone());

        let tasks: Vec<_> = (0..3)
            .map(|i| {
                let adapter = adapter.clone();
                tokio::spawn(async move { adapter.generate(spec(i + 1)).await })
            })
            .collect();
        wait_for_pending(&adapter, 3).await;

        adapter.handle_event(WorkerEvent::ChannelError("worker crashed".to_string()));
        for task in tasks {
            assert_eq!(
                task.await.unwrap(),
                Err(ChartError::GenerationFailure("worker crashed".to_string()))
            );
        }
        assert_eq!(adapter.pending_requests(), 0);
        assert!(adapter.generate(spec(1)).await.is_err());

        let fresh = Arc::new(FakeTransport::default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        adapter.reinitialize(fresh.clone(), events_rx);
        events_tx.send(WorkerEvent::Ready).unwrap();

        let task = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.generate(spec(7)).await }
        });
        wait_for_pending(&adapter, 1).await;
        tokio::time::timeout(Duration::from_secs(2), async {
            while fresh.generate_ids().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("request never reached the new worker");
        let id = fresh.generate_ids()[0];
        events_tx.send(WorkerEvent::Completed { id, data: one(7.0) }).unwrap();
        assert_eq!(task.await.unwrap().unwrap(), one(7.0));
    }

    #[tokio::test]
    async fn test_closed_event_stream_rejects_pending() {
        let transport = Arc::new(FakeTransport::default());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let adapter = DataSourceAdapter::connect(transport, events_rx);

        let task = tokio::spawn({
            let adapter = adapter.clone();
            async move { adapter.generate(spec(3)).await }
        });
        wait_for_pending(&adapter, 1).await;
        drop(events_tx);

        let outcome = tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert!(matches!(outcome, Err(ChartError::GenerationFailure(_))));
    }

    #[tokio::test]
    async fn test_broken_transport_fails_fast() {
        let transport = Arc::new(FakeTransport {
            broken: true,
            ..FakeTransport::default()
        });
        let adapter = DataSourceAdapter::new(transport);
        assert!(adapter.failure().is_some());
        assert!(adapter.generate(spec(1)).await.is_err());
    }
}
