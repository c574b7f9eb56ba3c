// Sample and sequence domain models
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_MINUTE: f64 = 60.0 * 1000.0;
const MS_PER_HOUR: f64 = 60.0 * MS_PER_MINUTE;
const MS_PER_DAY: f64 = 24.0 * MS_PER_HOUR;

/// One timestamped reading. Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub aggregated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            x: None,
            y: None,
            aggregated: false,
            category: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Ordered samples backing one chart render. Replaced wholesale, never patched.
pub type Sequence = Vec<Sample>;

/// Min and max of an iterator of finite numbers, `None` when it yields nothing.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Scatter,
    Heatmap,
}

impl ChartKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Heatmap => "Heatmap",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl TimeRange {
    pub fn as_millis(&self) -> f64 {
        match self {
            TimeRange::OneHour => MS_PER_HOUR,
            TimeRange::SixHours => 6.0 * MS_PER_HOUR,
            TimeRange::OneDay => 24.0 * MS_PER_HOUR,
            TimeRange::SevenDays => 7.0 * MS_PER_DAY,
            TimeRange::ThirtyDays => 30.0 * MS_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl AggregationInterval {
    pub fn as_millis(&self) -> f64 {
        match self {
            AggregationInterval::OneMinute => MS_PER_MINUTE,
            AggregationInterval::FiveMinutes => 5.0 * MS_PER_MINUTE,
            AggregationInterval::FifteenMinutes => 15.0 * MS_PER_MINUTE,
            AggregationInterval::OneHour => MS_PER_HOUR,
            AggregationInterval::OneDay => MS_PER_DAY,
        }
    }
}
