//! Order statistics over scalar samples

/// Linear-interpolated quantile of `values` for `q` in `[0, 1]`.
///
/// Returns `None` for an empty slice. NaN samples are ordered last.
pub fn quantile(values: &[f32], q: f64) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(quantile_sorted(&sorted, q))
}

/// Same as [`quantile`] but with `q` given in percent
pub fn percentile(values: &[f32], p: f64) -> Option<f32> {
    quantile(values, p / 100.0)
}

/// Quantile of an already sorted, non-empty slice
pub fn quantile_sorted(sorted: &[f32], q: f64) -> f32 {
    let last = sorted.len() - 1;
    let position = q.clamp(0.0, 1.0) * last as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    let a = sorted[lower] as f64;
    let b = sorted[upper.min(last)] as f64;
    (a + (b - a) * fraction) as f32
}

/// Population mean and variance
pub fn mean_variance(values: impl Iterator<Item = f64> + Clone) -> Option<(f64, f64)> {
    let (count, sum) = values.clone().fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    Some((mean, variance))
}
