// HTTP request handlers
use crate::application::chart_component::ChartComponent;
use crate::application::charts::ChartStyle;
use crate::application::frame_scheduler::TickClock;
use crate::domain::generation::{DataKind, GeneratorOptions};
use crate::domain::hover::HoverState;
use crate::domain::performance::FrameStats;
use crate::domain::sample::{ChartKind, Sequence};
use crate::domain::viewport::{Point, Viewport};
use crate::infrastructure::canvas::{DrawCommand, RecordingCanvas};
use crate::infrastructure::chunked_json::stream_from_watch;
use crate::infrastructure::config::RenderSettings;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Body of `POST /api/data`. `type` stays loosely typed so a missing or
/// non-string value is answered as an invalid type rather than a parse error.
#[derive(Debug, Deserialize)]
pub struct DataRequest {
    #[serde(rename = "type", default)]
    pub kind: Value,
    #[serde(default)]
    pub options: GeneratorOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[serde(default)]
    pub chart_type: Value,
    #[serde(default)]
    pub options: GeneratorOptions,
    pub viewport: Option<Viewport>,
    pub style: Option<ChartStyle>,
    pub pointer: Option<Point>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub chart_type: ChartKind,
    pub title: &'static str,
    pub points: usize,
    pub hover: Option<HoverState>,
    pub stats: Option<FrameStats>,
    pub commands: Vec<DrawCommand>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Generate a sequence through the background worker.
pub async fn generate_data(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: Result<Json<DataRequest>, JsonRejection>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(status = %rejection.status(), error = %rejection, "malformed data request");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process data", compress).await;
        }
    };

    let kind = match request.kind.as_str().map(DataKind::parse) {
        Some(Ok(kind)) => kind,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "rejected data request");
            return error_response(StatusCode::BAD_REQUEST, "Invalid data type", compress).await;
        }
        None => {
            tracing::warn!(kind = %request.kind, "data request without a string type");
            return error_response(StatusCode::BAD_REQUEST, "Invalid data type", compress).await;
        }
    };

    let spec = request.options.into_spec(kind);
    match state.source.generate(spec).await {
        Ok(data) => {
            tracing::debug!(kind = %request.kind, points = data.len(), "generated data");
            respond(json_response(StatusCode::OK, &json!({ "data": data }), compress).await)
        }
        Err(e) => {
            tracing::error!(error = %e, "data generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process data", compress).await
        }
    }
}

/// Generate data and draw a single frame of it headlessly, returning the
/// display list together with hover and frame timing.
pub async fn render_chart(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    body: Result<Json<RenderRequest>, JsonRejection>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(status = %rejection.status(), error = %rejection, "malformed render request");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process data", compress).await;
        }
    };

    let chart_type = match serde_json::from_value::<ChartKind>(request.chart_type.clone()) {
        Ok(chart_type) => chart_type,
        Err(e) => {
            tracing::warn!(error = %e, chart_type = %request.chart_type, "rejected render request");
            return error_response(StatusCode::BAD_REQUEST, "Invalid chart type", compress).await;
        }
    };

    let kind = match chart_type {
        ChartKind::Heatmap => DataKind::Heatmap,
        _ => DataKind::TimeSeries,
    };
    let data = match state.source.generate(request.options.into_spec(kind)).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(error = %e, "render data generation failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process data", compress).await;
        }
    };

    let viewport = request.viewport.unwrap_or_else(|| default_viewport(&state.render));
    let style = request.style.unwrap_or_else(|| ChartStyle {
        cell_size: state.render.cell_size,
        ..ChartStyle::default()
    });
    let pointer = request.pointer;
    let snapshot =
        tokio::task::spawn_blocking(move || render_snapshot(chart_type, data, viewport, style, pointer)).await;

    match snapshot {
        Ok(snapshot) => respond(json_response(StatusCode::OK, &snapshot, compress).await),
        Err(e) => {
            tracing::error!(error = %e, "render task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render chart", compress).await
        }
    }
}

/// Latest performance report.
pub async fn performance(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let report = state.reports.borrow().clone();
    respond(json_response(StatusCode::OK, &report, accepts_brotli(&headers)).await)
}

/// Newline-delimited JSON stream of performance reports, one per sampler tick.
pub async fn performance_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    stream_from_watch(state.reports.clone())
}

pub fn render_snapshot(
    chart_type: ChartKind,
    data: Sequence,
    viewport: Viewport,
    style: ChartStyle,
    pointer: Option<Point>,
) -> RenderSnapshot {
    let mut chart = ChartComponent::new(chart_type, TickClock::new(), Some(RecordingCanvas::new()));
    chart.render(data, viewport, style);
    if let Some(pointer) = pointer {
        chart.on_pointer_move(pointer);
    }
    let stats = chart
        .clock_mut()
        .take_due()
        .and_then(|token| chart.on_frame(token, 0.0));

    let points = chart.data().len();
    let hover = chart.hover().copied();
    RenderSnapshot {
        chart_type,
        title: chart_type.display_name(),
        points,
        hover,
        stats,
        commands: chart.into_surface().map(RecordingCanvas::into_commands).unwrap_or_default(),
    }
}

fn default_viewport(render: &RenderSettings) -> Viewport {
    Viewport::measure(
        Some(render.canvas_width),
        Some(render.canvas_height),
        Some(render.device_pixel_ratio),
    )
}

async fn error_response(status: StatusCode, message: &str, compress: bool) -> Response {
    respond(json_response(status, &json!({ "error": message }), compress).await)
}

fn respond(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_source::SequenceSource;
    use crate::application::performance_sampler::PerformanceSampler;
    use crate::domain::error::{ChartError, ChartResult};
    use crate::domain::generation::{GenerationSpec, HeatmapLayout};
    use crate::domain::hover::HoverTarget;
    use crate::domain::sample::Sample;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};
    use tokio::sync::watch;

    /// Answers with as many samples as requested.
    struct EchoSource {
        fail: bool,
    }

    #[async_trait]
    impl SequenceSource for EchoSource {
        async fn generate(&self, spec: GenerationSpec) -> ChartResult<Sequence> {
            if self.fail {
                return Err(ChartError::GenerationFailure("worker crashed".to_string()));
            }
            let count = match spec {
                GenerationSpec::TimeSeries(options) => options.count,
                GenerationSpec::Heatmap(HeatmapLayout::Grid { x_count, y_count, .. }) => x_count * y_count,
                GenerationSpec::Heatmap(HeatmapLayout::TimeBased { count, .. }) => count,
            };
            Ok((0..count)
                .map(|i| Sample::new(i as f64 * 1000.0, (i % 7) as f64))
                .collect())
        }

        async fn transform(&self, data: Sequence) -> ChartResult<Sequence> {
            Ok(data)
        }
    }

    fn state(fail: bool) -> Arc<AppState> {
        let (_tx, reports) = watch::channel(PerformanceSampler::default().report(Some(42.0), 0));
        Arc::new(AppState {
            source: Arc::new(EchoSource { fail }),
            reports,
            render: RenderSettings::default(),
        })
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(kind: &str, options: Value) -> Result<Json<DataRequest>, JsonRejection> {
        Ok(Json(serde_json::from_value(json!({ "type": kind, "options": options })).unwrap()))
    }

    #[tokio::test]
    async fn test_generate_data() {
        let response = generate_data(HeaderMap::new(), State(state(false)), request("time-series", json!({"count": 5}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_type_is_bad_request() {
        let response = generate_data(HeaderMap::new(), State(state(false)), request("pie", json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Invalid data type"}));
    }

    async fn parse_body(body: &'static str, json_content: bool) -> Result<Json<DataRequest>, JsonRejection> {
        let mut builder = Request::builder().method("POST").uri("/api/data");
        if json_content {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        Json::<DataRequest>::from_request(builder.body(Body::from(body)).unwrap(), &()).await
    }

    #[tokio::test]
    async fn test_missing_type_is_bad_request() {
        let body = parse_body(r#"{"options":{}}"#, true).await;
        let response = generate_data(HeaderMap::new(), State(state(false)), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Invalid data type"}));

        let body = parse_body(r#"{"type":7}"#, true).await;
        let response = generate_data(HeaderMap::new(), State(state(false)), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_server_error() {
        let cases = [
            (r#"{"type":"time-series","options":{"count":-5}}"#, true),
            (r#"{"type":"time-series""#, true),
            (r#"{"type":"time-series"}"#, false),
        ];
        for (raw, json_content) in cases {
            let body = parse_body(raw, json_content).await;
            assert!(body.is_err(), "{raw} should not parse");
            let response = generate_data(HeaderMap::new(), State(state(false)), body).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body_json(response).await, json!({"error": "Failed to process data"}));
        }
    }

    #[tokio::test]
    async fn test_unknown_chart_type_is_bad_request() {
        let body: RenderRequest = serde_json::from_value(json!({"chartType": "pie"})).unwrap();
        let response = render_chart(HeaderMap::new(), State(state(false)), Ok(Json(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Invalid chart type"}));
    }

    #[tokio::test]
    async fn test_generation_failure_is_server_error() {
        let response = generate_data(HeaderMap::new(), State(state(true)), request("heatmap", json!({"xCount": 4}))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "Failed to process data"}));
    }

    #[tokio::test]
    async fn test_performance_report() {
        let response = performance(HeaderMap::new(), State(state(false))).await;
        let body = body_json(response).await;
        assert_eq!(body["memoryMb"], json!(42.0));
        assert_eq!(body["memoryStatus"], json!("optimal"));
        assert_eq!(body["load"], json!("light"));
    }

    #[test]
    fn test_render_snapshot_with_pointer() {
        let data: Sequence = (0..4).map(|i| Sample::new(i as f64, 10.0)).collect();
        let snapshot = render_snapshot(
            ChartKind::Bar,
            data,
            Viewport::default(),
            ChartStyle::default(),
            Some(Point::new(100.0, 200.0)),
        );

        assert_eq!(snapshot.title, "Bar Chart");
        assert_eq!(snapshot.points, 4);
        assert_eq!(snapshot.hover.map(|h| h.target), Some(HoverTarget::Bar { index: 0 }));
        assert!(matches!(snapshot.commands.first(), Some(DrawCommand::BeginFrame { .. })));
        assert!(!snapshot.stats.unwrap().dropped);
    }

    #[tokio::test]
    async fn test_render_chart_endpoint() {
        let body: RenderRequest = serde_json::from_value(json!({
            "chartType": "heatmap",
            "options": {"xCount": 5, "yCount": 5},
            "viewport": {"canvasWidth": 400.0, "canvasHeight": 300.0}
        }))
        .unwrap();
        let response = render_chart(HeaderMap::new(), State(state(false)), Ok(Json(body))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["points"], json!(25));
        assert_eq!(body["title"], json!("Heatmap"));
        assert_eq!(body["commands"][0]["op"], json!("beginFrame"));
        assert_eq!(body["commands"][0]["backingWidth"], json!(400));
    }
}
