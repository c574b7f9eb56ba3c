// Application state for HTTP handlers
use crate::application::data_source::SequenceSource;
use crate::domain::performance::PerformanceReport;
use crate::infrastructure::config::RenderSettings;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn SequenceSource>,
    pub reports: watch::Receiver<PerformanceReport>,
    pub render: RenderSettings,
}
