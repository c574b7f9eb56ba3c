// Scale mapping between data domains and pixel coordinates
use crate::domain::sample::{extent, ChartKind, Sample};
use crate::domain::viewport::Rect;

/// Line charts pad the value axis 5% below the minimum and above the maximum.
pub const LINE_VALUE_PADDING: (f64, f64) = (0.95, 1.05);
/// Scatter plots pad the value axis by 10% on both ends.
pub const SCATTER_VALUE_PADDING: (f64, f64) = (0.9, 1.1);
/// Bar charts start at zero and leave 10% headroom above the tallest bar.
pub const BAR_VALUE_HEADROOM: f64 = 1.1;

/// Map a domain value onto a pixel axis. A degenerate domain maps every
/// value to `pixel_min`.
pub fn to_pixel(value: f64, domain_min: f64, domain_max: f64, pixel_min: f64, pixel_extent: f64) -> f64 {
    if domain_min == domain_max {
        return pixel_min;
    }
    pixel_min + (value - domain_min) / (domain_max - domain_min) * pixel_extent
}

/// Inverse of [`to_pixel`]. A degenerate domain or an empty pixel extent
/// maps every pixel back to `domain_min`.
pub fn from_pixel(pixel: f64, domain_min: f64, domain_max: f64, pixel_min: f64, pixel_extent: f64) -> f64 {
    if domain_min == domain_max || pixel_extent == 0.0 {
        return domain_min;
    }
    domain_min + (pixel - pixel_min) / pixel_extent * (domain_max - domain_min)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn of_timestamps(data: &[Sample]) -> Option<Self> {
        extent(data.iter().map(|s| s.timestamp)).map(|(lo, hi)| Self::new(lo, hi))
    }

    pub fn of_values(data: &[Sample]) -> Option<Self> {
        extent(data.iter().map(|s| s.value)).map(|(lo, hi)| Self::new(lo, hi))
    }

    /// Value domain a chart kind draws against, with its padding applied.
    pub fn padded_values(kind: ChartKind, data: &[Sample]) -> Option<Self> {
        let raw = Self::of_values(data)?;
        Some(match kind {
            ChartKind::Line => Self::new(raw.min * LINE_VALUE_PADDING.0, raw.max * LINE_VALUE_PADDING.1),
            ChartKind::Scatter => {
                Self::new(raw.min * SCATTER_VALUE_PADDING.0, raw.max * SCATTER_VALUE_PADDING.1)
            }
            ChartKind::Bar => Self::new(0.0, raw.max * BAR_VALUE_HEADROOM),
            ChartKind::Heatmap => raw,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: Domain,
    pub pixel_min: f64,
    pub pixel_extent: f64,
}

impl LinearScale {
    /// Left-to-right across `area`.
    pub fn horizontal(domain: Domain, area: Rect) -> Self {
        Self {
            domain,
            pixel_min: area.x,
            pixel_extent: area.width,
        }
    }

    /// Bottom-to-top across `area`: larger values sit higher on screen.
    pub fn vertical(domain: Domain, area: Rect) -> Self {
        Self {
            domain,
            pixel_min: area.y + area.height,
            pixel_extent: -area.height,
        }
    }

    #[inline]
    pub fn map(&self, value: f64) -> f64 {
        to_pixel(value, self.domain.min, self.domain.max, self.pixel_min, self.pixel_extent)
    }

    // Pixel to data; rendering only maps forward.
    #[allow(dead_code)]
    #[inline]
    pub fn invert(&self, pixel: f64) -> f64 {
        from_pixel(pixel, self.domain.min, self.domain.max, self.pixel_min, self.pixel_extent)
    }
}

/// Both axes of one chart frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScales {
    pub x: LinearScale,
    pub y: LinearScale,
}

impl ChartScales {
    /// Scales for `kind` over `data` inside `area`; `None` for an empty sequence.
    ///
    /// Line and heatmap place samples by timestamp. Bar places sample `i`
    /// at `i / n` of the width; scatter spreads indices `0..n-1` edge to edge.
    pub fn for_chart(kind: ChartKind, data: &[Sample], area: Rect) -> Option<Self> {
        let y = Domain::padded_values(kind, data)?;
        let x = match kind {
            ChartKind::Line | ChartKind::Heatmap => Domain::of_timestamps(data)?,
            ChartKind::Bar => Domain::new(0.0, data.len() as f64),
            ChartKind::Scatter => Domain::new(0.0, (data.len() - 1) as f64),
        };
        Some(Self {
            x: LinearScale::horizontal(x, area),
            y: LinearScale::vertical(y, area),
        })
    }
}
