//! Descriptive statistics over plain `f64` slices.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of already sorted values with linear interpolation between
/// closest ranks. `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// One equal-width histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram over `[min, max]` of `values`.
///
/// Every bucket is half-open except the last, which also holds the maximum.
/// A constant series collapses into a single bucket.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![Bin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        let sd = std_dev(&v).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6, "got {sd}");
        assert_eq!(std_dev(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn quantiles_interpolate() {
        let v = [25.0, 30.0, 35.0];
        assert_eq!(quantile_sorted(&v, 0.5), Some(30.0));
        let p95 = quantile_sorted(&v, 0.95).unwrap();
        assert!((p95 - 34.5).abs() < 1e-9, "got {p95}");
        assert_eq!(quantile_sorted(&v, 0.0), Some(25.0));
        assert_eq!(quantile_sorted(&v, 1.0), Some(35.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn histogram_covers_every_value() {
        let v: Vec<f64> = (0..=100).map(f64::from).collect();
        let bins = histogram(&v, 30);
        assert_eq!(bins.len(), 30);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), v.len());
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[29].end, 100.0);
    }

    #[test]
    fn constant_series_is_one_bucket() {
        let bins = histogram(&[3.0, 3.0, 3.0], 30);
        assert_eq!(
            bins,
            vec![Bin {
                start: 3.0,
                end: 3.0,
                count: 3
            }]
        );
    }
}
