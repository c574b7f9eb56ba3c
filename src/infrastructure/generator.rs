// Synthetic sequence generator run inside the background worker
use crate::domain::error::{ChartError, ChartResult};
use crate::domain::generation::{GenerationSpec, HeatmapLayout, TimeSeriesOptions, MAX_SAMPLES};
use crate::domain::sample::{AggregationInterval, Sample, Sequence, TimeRange};

/// Periods of the base wave across the whole series.
const WAVE_SPAN: f64 = 10.0;
const NOISE_AMPLITUDE: f64 = 0.3;
/// Grid cells get between 80% and 100% of their distance-based value.
const GRID_JITTER_FLOOR: f64 = 0.8;

pub struct SyntheticGenerator {
    rng: fastrand::Rng,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self { rng: fastrand::Rng::new() }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Produce the sequence described by `spec`, ending at `now_ms`.
    pub fn generate(&mut self, spec: &GenerationSpec, now_ms: f64) -> ChartResult<Sequence> {
        match spec {
            GenerationSpec::TimeSeries(options) => self.time_series(options, now_ms),
            GenerationSpec::Heatmap(HeatmapLayout::Grid {
                x_count,
                y_count,
                min_value,
                max_value,
            }) => self.grid_heatmap(*x_count, *y_count, *min_value, *max_value, now_ms),
            GenerationSpec::Heatmap(HeatmapLayout::TimeBased {
                count,
                time_range,
                min_value,
                max_value,
            }) => self.scattered_heatmap(*count, *time_range, *min_value, *max_value, now_ms),
        }
    }

    fn time_series(&mut self, options: &TimeSeriesOptions, now_ms: f64) -> ChartResult<Sequence> {
        check_range(options.min_value, options.max_value)?;
        let count = options.count.min(MAX_SAMPLES);
        if count == 0 {
            return Ok(Sequence::new());
        }

        let range_ms = options.time_range.as_millis();
        let start = now_ms - range_ms;
        let step = range_ms / count as f64;
        let value_range = options.max_value - options.min_value;

        let mut data = Sequence::with_capacity(count);
        for i in 0..count {
            let x = (i as f64 / count as f64) * WAVE_SPAN;
            let mut wave = x.sin() * 0.6 + (x * 2.3).sin() * 0.3 + (x * 0.7).sin() * 0.1;
            if options.with_noise {
                wave += (self.rng.f64() - 0.5) * NOISE_AMPLITUDE;
            }
            let value = ((wave + 1.0) / 2.0) * value_range + options.min_value;

            let mut sample = Sample::new(start + i as f64 * step, value).with_position(i as f64, value);
            sample.category = options.category.clone();
            data.push(sample);
        }

        Ok(match options.aggregation {
            Some(interval) => aggregate(&data, interval),
            None => data,
        })
    }

    fn grid_heatmap(
        &mut self,
        x_count: usize,
        y_count: usize,
        min_value: f64,
        max_value: f64,
        now_ms: f64,
    ) -> ChartResult<Sequence> {
        check_range(min_value, max_value)?;
        let cells = x_count.saturating_mul(y_count);
        if cells > MAX_SAMPLES {
            return Err(ChartError::GenerationFailure(format!(
                "grid of {}x{} exceeds {} samples",
                x_count, y_count, MAX_SAMPLES
            )));
        }

        let value_range = max_value - min_value;
        let mut data = Sequence::with_capacity(cells);
        for x in 0..x_count {
            for y in 0..y_count {
                let dx = x as f64 / x_count as f64 - 0.5;
                let dy = y as f64 / y_count as f64 - 0.5;
                let distance = (dx * dx + dy * dy).sqrt();
                let jitter = GRID_JITTER_FLOOR + self.rng.f64() * (1.0 - GRID_JITTER_FLOOR);
                let value = min_value + (1.0 - distance) * value_range * jitter;
                data.push(
                    Sample::new(now_ms, value)
                        .with_position(x as f64, y as f64)
                        .with_category("heatmap"),
                );
            }
        }
        Ok(data)
    }

    fn scattered_heatmap(
        &mut self,
        count: usize,
        time_range: TimeRange,
        min_value: f64,
        max_value: f64,
        now_ms: f64,
    ) -> ChartResult<Sequence> {
        check_range(min_value, max_value)?;
        let count = count.min(MAX_SAMPLES);
        let range_ms = time_range.as_millis();
        let start = now_ms - range_ms;
        let value_range = max_value - min_value;

        let data = (0..count)
            .map(|_| {
                let offset = self.rng.f64() * range_ms;
                let value = min_value + self.rng.f64() * value_range;
                let y = if value_range > 0.0 {
                    (value - min_value) / value_range * 100.0
                } else {
                    0.0
                };
                Sample::new(start + offset, value)
                    .with_position(offset / range_ms * 100.0, y)
                    .with_category("time-heatmap")
            })
            .collect();
        Ok(data)
    }
}

/// Collapse consecutive samples into one mean per interval bucket. Buckets
/// start at multiples of the interval.
pub fn aggregate(data: &[Sample], interval: AggregationInterval) -> Sequence {
    let interval_ms = interval.as_millis();
    let mut out = Sequence::new();
    let mut bucket: Option<(f64, f64, usize)> = None;

    for sample in data {
        let start = (sample.timestamp / interval_ms).floor() * interval_ms;
        match bucket.as_mut() {
            Some((current, sum, n)) if *current == start => {
                *sum += sample.value;
                *n += 1;
            }
            _ => {
                if let Some((current, sum, n)) = bucket.take() {
                    out.push(bucket_sample(current, sum, n));
                }
                bucket = Some((start, sample.value, 1));
            }
        }
    }
    if let Some((current, sum, n)) = bucket {
        out.push(bucket_sample(current, sum, n));
    }
    out
}

fn bucket_sample(start: f64, sum: f64, n: usize) -> Sample {
    let mut sample = Sample::new(start, sum / n as f64);
    sample.aggregated = true;
    sample
}

fn check_range(min_value: f64, max_value: f64) -> ChartResult<()> {
    if !min_value.is_finite() || !max_value.is_finite() || min_value > max_value {
        return Err(ChartError::GenerationFailure(format!(
            "invalid value range {}..{}",
            min_value, max_value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::binning;

    // 2023-11-14T00:00:00Z, aligned to every aggregation interval.
    const NOW: f64 = 1_699_920_000_000.0;

    fn series(count: usize, time_range: TimeRange, aggregation: Option<AggregationInterval>) -> TimeSeriesOptions {
        TimeSeriesOptions {
            count,
            min_value: 0.0,
            max_value: 100.0,
            time_range,
            with_noise: false,
            aggregation,
            category: None,
        }
    }

    #[test]
    fn test_noise_free_series_spans_range() {
        let mut generator = SyntheticGenerator::with_seed(7);
        let data = generator
            .generate(&GenerationSpec::TimeSeries(series(1000, TimeRange::OneDay, None)), NOW)
            .unwrap();

        assert_eq!(data.len(), 1000);
        assert_eq!(data[0].timestamp, NOW - TimeRange::OneDay.as_millis());
        assert!(data.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(data.iter().all(|s| (0.0..=100.0).contains(&s.value)));
        assert_eq!(data[3].x, Some(3.0));
        assert_eq!(data[3].y, Some(data[3].value));
        // sin(0) terms vanish, so the first value sits mid-range.
        assert_eq!(data[0].value, 50.0);
    }

    #[test]
    fn test_binning_thousand_points() {
        let mut generator = SyntheticGenerator::new();
        let data = generator
            .generate(&GenerationSpec::TimeSeries(series(1000, TimeRange::OneDay, None)), NOW)
            .unwrap();
        let grid = binning::bin(&data, 800.0, 400.0, 10.0);

        assert_eq!(grid.cols(), 80);
        assert_eq!(grid.rows(), 40);
        assert_eq!(grid.total_count(), 1000);
    }

    #[test]
    fn test_aggregation_is_applied() {
        let mut generator = SyntheticGenerator::with_seed(1);
        let raw = generator
            .generate(&GenerationSpec::TimeSeries(series(60, TimeRange::OneHour, None)), NOW)
            .unwrap();
        let buckets = generator
            .generate(
                &GenerationSpec::TimeSeries(series(60, TimeRange::OneHour, Some(AggregationInterval::FiveMinutes))),
                NOW,
            )
            .unwrap();

        // One sample per minute over an aligned hour: twelve five-minute buckets.
        assert_eq!(buckets.len(), 12);
        assert!(buckets.iter().all(|s| s.aggregated));
        assert_eq!(buckets[0].timestamp, raw[0].timestamp);
        assert_eq!(buckets[1].timestamp - buckets[0].timestamp, 300_000.0);
        let first_mean = raw[..5].iter().map(|s| s.value).sum::<f64>() / 5.0;
        assert!((buckets[0].value - first_mean).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_keeps_trailing_bucket() {
        let data = vec![Sample::new(0.0, 1.0), Sample::new(30_000.0, 3.0), Sample::new(60_000.0, 10.0)];
        let out = aggregate(&data, AggregationInterval::OneMinute);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].value, 2.0);
        assert_eq!(out[1].timestamp, 60_000.0);
        assert_eq!(out[1].value, 10.0);
    }

    #[test]
    fn test_grid_heatmap_lattice() {
        let mut generator = SyntheticGenerator::with_seed(3);
        let spec = GenerationSpec::Heatmap(HeatmapLayout::Grid {
            x_count: 10,
            y_count: 6,
            min_value: 0.0,
            max_value: 100.0,
        });
        let data = generator.generate(&spec, NOW).unwrap();

        assert_eq!(data.len(), 60);
        assert!(data.iter().all(|s| s.category.as_deref() == Some("heatmap")));
        assert!(data.iter().all(|s| s.timestamp == NOW));
        assert!(data.iter().all(|s| (0.0..=100.0).contains(&s.value)));
        assert_eq!((data[7].x, data[7].y), (Some(1.0), Some(1.0)));
    }

    #[test]
    fn test_oversized_grid_fails() {
        let mut generator = SyntheticGenerator::new();
        let spec = GenerationSpec::Heatmap(HeatmapLayout::Grid {
            x_count: 200,
            y_count: 200,
            min_value: 0.0,
            max_value: 1.0,
        });
        assert!(matches!(
            generator.generate(&spec, NOW),
            Err(ChartError::GenerationFailure(_))
        ));
    }

    #[test]
    fn test_time_based_heatmap() {
        let mut generator = SyntheticGenerator::with_seed(11);
        let spec = GenerationSpec::Heatmap(HeatmapLayout::TimeBased {
            count: 500,
            time_range: TimeRange::SixHours,
            min_value: 10.0,
            max_value: 20.0,
        });
        let data = generator.generate(&spec, NOW).unwrap();
        let start = NOW - TimeRange::SixHours.as_millis();

        assert_eq!(data.len(), 500);
        for s in &data {
            assert!(s.timestamp >= start && s.timestamp <= NOW);
            assert!((10.0..=20.0).contains(&s.value));
            assert!((0.0..=100.0).contains(&s.x.unwrap()));
            assert!((0.0..=100.0).contains(&s.y.unwrap()));
            assert_eq!(s.category.as_deref(), Some("time-heatmap"));
        }
    }

    #[test]
    fn test_inverted_range_fails() {
        let mut options = series(10, TimeRange::OneHour, None);
        options.min_value = 5.0;
        options.max_value = 1.0;
        let result = SyntheticGenerator::new().generate(&GenerationSpec::TimeSeries(options), NOW);
        assert!(matches!(result, Err(ChartError::GenerationFailure(_))));
    }
}
