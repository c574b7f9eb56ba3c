// Grid binning for the heatmap projection
use crate::application::scale::Domain;
use crate::domain::sample::Sample;

pub const DEFAULT_CELL_SIZE: f64 = 10.0;

/// Running aggregate of the samples that landed in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridCell {
    pub running_average: f64,
    pub sample_count: usize,
    pub last_timestamp: f64,
}

impl GridCell {
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    fn absorb(&mut self, value: f64, timestamp: f64) {
        let count = self.sample_count as f64;
        self.running_average = (self.running_average * count + value) / (count + 1.0);
        self.last_timestamp = if self.sample_count == 0 {
            timestamp
        } else {
            self.last_timestamp.max(timestamp)
        };
        self.sample_count += 1;
    }
}

/// One frame's binned grid, stored row-major. Row 0 holds the highest values.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatGrid {
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
    value_domain: Option<Domain>,
}

impl HeatGrid {
    fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![GridCell::default(); rows * cols],
            value_domain: None,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// Cell at `(row, col)` only if at least one sample landed there.
    pub fn occupied_cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cell(row, col).filter(|c| !c.is_empty())
    }

    /// Non-empty cells with their coordinates. Empty cells are absent, not zero.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &GridCell)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_empty())
            .map(move |(i, c)| (i / cols, i % cols, c))
    }

    #[cfg(test)]
    pub fn total_count(&self) -> usize {
        self.cells.iter().map(|c| c.sample_count).sum()
    }

    /// Raw min/max of the binned values, `None` when nothing was binned.
    pub fn value_domain(&self) -> Option<Domain> {
        self.value_domain
    }

    /// Size of one cell when the grid is stretched over `width x height` pixels.
    pub fn cell_extent(&self, width: f64, height: f64) -> (f64, f64) {
        (width / self.cols as f64, height / self.rows as f64)
    }
}

/// `(rows, cols)` for a plot of `width x height` pixels. Always at least 1x1.
pub fn grid_dimensions(width: f64, height: f64, cell_size: f64) -> (usize, usize) {
    let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
        cell_size
    } else {
        DEFAULT_CELL_SIZE
    };
    let count = |extent: f64| {
        let n = (extent / cell_size).floor();
        if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
    };
    (count(height), count(width))
}

/// Bucket for a normalised position in `[0, 1]`, clamped into `0..buckets`.
fn bucket(normalized: f64, buckets: usize) -> usize {
    let index = (normalized * buckets as f64).floor();
    if index.is_nan() || index <= 0.0 {
        0
    } else {
        (index as usize).min(buckets - 1)
    }
}

fn normalize(value: f64, domain: Domain) -> Option<f64> {
    if domain.is_degenerate() {
        None
    } else {
        Some((value - domain.min) / domain.span())
    }
}

/// Bin `data` into a grid of roughly `cell_size` pixel cells covering
/// `width x height`. Columns follow time, rows follow value with the largest
/// values in row 0. A degenerate time or value range collapses that axis to
/// bucket 0.
pub fn bin(data: &[Sample], width: f64, height: f64, cell_size: f64) -> HeatGrid {
    let (rows, cols) = grid_dimensions(width, height, cell_size);
    let mut grid = HeatGrid::empty(rows, cols);

    let (Some(time_domain), Some(value_domain)) = (Domain::of_timestamps(data), Domain::of_values(data))
    else {
        // Nothing finite to place; still account for every sample.
        if let Some(cell) = grid.cells.first_mut() {
            for sample in data {
                cell.absorb(sample.value, sample.timestamp);
            }
        }
        return grid;
    };

    for sample in data {
        let col = normalize(sample.timestamp, time_domain).map_or(0, |n| bucket(n, cols));
        let row = normalize(sample.value, value_domain).map_or(0, |n| bucket(1.0 - n, rows));
        grid.cells[row * cols + col].absorb(sample.value, sample.timestamp);
    }

    grid.value_domain = Some(value_domain);
    grid
}
