// Ordinary least squares over (index, value) pairs
use crate::domain::sample::Sample;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionLine {
    pub slope: f64,
    pub intercept: f64,
}

impl RegressionLine {
    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Closed-form fit of `value = slope * index + intercept` with
/// `index = 0..n-1`. Fewer than two values yield no line.
pub fn fit(values: &[f64]) -> Option<RegressionLine> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let n = n as f64;
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;
    Some(RegressionLine { slope, intercept })
}

pub fn fit_samples(data: &[Sample]) -> Option<RegressionLine> {
    let values: Vec<f64> = data.iter().map(|s| s.value).collect();
    fit(&values)
}
