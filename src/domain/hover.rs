// Hover state owned by a chart component
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HoverTarget {
    Bar { index: usize },
    Point { index: usize },
    Cell { row: usize, col: usize },
}

/// Anchor of the tooltip in CSS pixels plus the reading it shows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tooltip {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HoverState {
    pub target: HoverTarget,
    pub tooltip: Tooltip,
}

impl HoverState {
    pub fn new(target: HoverTarget, tooltip: Tooltip) -> Self {
        Self { target, tooltip }
    }
}
