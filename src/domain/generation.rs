// Generation requests handed to the data source worker
use super::error::ChartError;
use super::sample::{AggregationInterval, ChartKind, TimeRange};
use serde::{Deserialize, Serialize};

/// Upper bound on generated sequence length.
pub const MAX_SAMPLES: usize = 10_000;

const DEFAULT_COUNT: usize = 1000;
const DEFAULT_MIN_VALUE: f64 = 0.0;
const DEFAULT_MAX_VALUE: f64 = 100.0;
const DEFAULT_GRID_SIZE: usize = 10;

fn default_count() -> usize {
    DEFAULT_COUNT
}

fn default_max_value() -> f64 {
    DEFAULT_MAX_VALUE
}

fn default_true() -> bool {
    true
}

/// Request issued by a chart when it needs a fresh sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub time_range: TimeRange,
    #[serde(default = "default_true")]
    pub with_noise: bool,
    pub chart_type: ChartKind,
    #[serde(default)]
    pub aggregation: Option<AggregationInterval>,
}

impl GenerationRequest {
    pub fn new(chart_type: ChartKind, count: usize) -> Self {
        Self {
            count,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
            time_range: TimeRange::default(),
            with_noise: true,
            chart_type,
            aggregation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesOptions {
    pub count: usize,
    pub min_value: f64,
    pub max_value: f64,
    pub time_range: TimeRange,
    pub with_noise: bool,
    pub aggregation: Option<AggregationInterval>,
    pub category: Option<String>,
}

/// Shape of a generated heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HeatmapLayout {
    /// `x_count * y_count` samples on an integer lattice, brighter towards the centre.
    Grid {
        x_count: usize,
        y_count: usize,
        min_value: f64,
        max_value: f64,
    },
    /// `count` samples scattered uniformly over the time range.
    TimeBased {
        count: usize,
        time_range: TimeRange,
        min_value: f64,
        max_value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationSpec {
    TimeSeries(TimeSeriesOptions),
    Heatmap(HeatmapLayout),
}

impl From<&GenerationRequest> for GenerationSpec {
    fn from(request: &GenerationRequest) -> Self {
        let count = request.count.min(MAX_SAMPLES);
        match request.chart_type {
            ChartKind::Heatmap => GenerationSpec::Heatmap(HeatmapLayout::TimeBased {
                count,
                time_range: request.time_range,
                min_value: request.min_value,
                max_value: request.max_value,
            }),
            _ => GenerationSpec::TimeSeries(TimeSeriesOptions {
                count,
                min_value: request.min_value,
                max_value: request.max_value,
                time_range: request.time_range,
                with_noise: request.with_noise,
                aggregation: request.aggregation,
                category: None,
            }),
        }
    }
}

/// Kinds accepted by the HTTP ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    TimeSeries,
    Heatmap,
}

impl DataKind {
    pub fn parse(kind: &str) -> Result<Self, ChartError> {
        match kind {
            "time-series" => Ok(DataKind::TimeSeries),
            "heatmap" => Ok(DataKind::Heatmap),
            other => Err(ChartError::InvalidDataType(other.to_string())),
        }
    }
}

/// Loose option bag accepted by the ingress. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    pub count: Option<usize>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub time_range: Option<TimeRange>,
    pub with_noise: Option<bool>,
    pub aggregation: Option<AggregationInterval>,
    pub category: Option<String>,
    pub x_count: Option<usize>,
    pub y_count: Option<usize>,
}

impl GeneratorOptions {
    pub fn into_spec(self, kind: DataKind) -> GenerationSpec {
        let min_value = self.min_value.unwrap_or(DEFAULT_MIN_VALUE);
        let max_value = self.max_value.unwrap_or(DEFAULT_MAX_VALUE);
        let count = self.count.unwrap_or(DEFAULT_COUNT).min(MAX_SAMPLES);
        let time_range = self.time_range.unwrap_or_default();

        match kind {
            DataKind::TimeSeries => GenerationSpec::TimeSeries(TimeSeriesOptions {
                count,
                min_value,
                max_value,
                time_range,
                with_noise: self.with_noise.unwrap_or(true),
                aggregation: self.aggregation,
                category: self.category,
            }),
            DataKind::Heatmap if self.x_count.is_some() || self.y_count.is_some() => {
                // Keep the lattice within the same sample budget as the other layouts.
                let x_count = self.x_count.unwrap_or(DEFAULT_GRID_SIZE).clamp(1, MAX_SAMPLES);
                let y_count = self
                    .y_count
                    .unwrap_or(DEFAULT_GRID_SIZE)
                    .min(MAX_SAMPLES / x_count);
                GenerationSpec::Heatmap(HeatmapLayout::Grid {
                    x_count,
                    y_count,
                    min_value,
                    max_value,
                })
            }
            DataKind::Heatmap => GenerationSpec::Heatmap(HeatmapLayout::TimeBased {
                count,
                time_range,
                min_value,
                max_value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_data_kind() {
        assert_eq!(DataKind::parse("heatmap").unwrap(), DataKind::Heatmap);
        assert_eq!(
            DataKind::parse("pie"),
            Err(ChartError::InvalidDataType("pie".to_string()))
        );
    }

    #[test]
    fn test_heatmap_options_select_layout() {
        let grid = GeneratorOptions {
            x_count: Some(4),
            ..Default::default()
        }
        .into_spec(DataKind::Heatmap);
        assert_eq!(
            grid,
            GenerationSpec::Heatmap(HeatmapLayout::Grid {
                x_count: 4,
                y_count: 10,
                min_value: 0.0,
                max_value: 100.0,
            })
        );

        let timed = GeneratorOptions::default().into_spec(DataKind::Heatmap);
        assert!(matches!(
            timed,
            GenerationSpec::Heatmap(HeatmapLayout::TimeBased { count: 1000, .. })
        ));
    }

    #[test]
    fn test_wide_grid_stays_within_budget() {
        let spec = GeneratorOptions {
            x_count: Some(MAX_SAMPLES * 3),
            y_count: Some(5),
            ..Default::default()
        }
        .into_spec(DataKind::Heatmap);
        match spec {
            GenerationSpec::Heatmap(HeatmapLayout::Grid { x_count, y_count, .. }) => {
                assert_eq!(x_count, MAX_SAMPLES);
                assert_eq!(y_count, 1);
            }
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_request_defaults_and_clamp() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"chartType":"bar","count":50000}"#).unwrap();
        assert_eq!(request.max_value, 100.0);
        assert!(request.with_noise);
        match GenerationSpec::from(&request) {
            GenerationSpec::TimeSeries(options) => assert_eq!(options.count, MAX_SAMPLES),
            other => panic!("unexpected spec {:?}", other),
        }
    }

    #[test]
    fn test_heatmap_request_is_time_based() {
        let request = GenerationRequest::new(ChartKind::Heatmap, 200);
        assert!(matches!(
            GenerationSpec::from(&request),
            GenerationSpec::Heatmap(HeatmapLayout::TimeBased { count: 200, .. })
        ));
    }
}
