//! Reductions over numeric columns. Every function is total: degenerate input
//! (empty, single value, zero variance) yields `None` instead of panicking.

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    percentile(&sorted(values), 50.0)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

/// Linear interpolation between closest ranks ("R-7"): for `n` sorted values
/// the rank is `p / 100 * (n - 1)` and the result is interpolated between the
/// order statistics on either side of it.
///
/// `sorted` must be ascending. Returns `None` for an empty slice or a `p`
/// outside `[0, 100]`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower_index = rank.floor() as usize;
    let upper_index = (rank.ceil() as usize).min(sorted.len() - 1);
    let lower = sorted[lower_index];
    let upper = sorted[upper_index];
    let fraction = rank - lower_index as f64;
    // keep rounding from pushing the value past the next order statistic
    Some((lower + fraction * (upper - lower)).min(upper))
}

/// Pearson correlation coefficient; `None` when fewer than two pairs or either
/// side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    if is_constant(xs) || is_constant(ys) {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x == 0.0 || variance_y == 0.0 {
        return None;
    }
    let r = covariance / (variance_x.sqrt() * variance_y.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

// exact comparison; a mean of identical floats may not reproduce them
fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!(close(percentile(&values, 80.0).unwrap(), 42.0));
        assert!(close(percentile(&values, 50.0).unwrap(), 30.0));
        assert!(close(percentile(&values, 25.0).unwrap(), 20.0));
        assert!(close(percentile(&values, 10.0).unwrap(), 14.0));
        assert!(close(percentile(&values, 0.0).unwrap(), 10.0));
        assert!(close(percentile(&values, 100.0).unwrap(), 50.0));
    }

    #[test]
    fn percentile_matches_linear_method_on_known_data() {
        // 1..=100: rank for p90 is 89.1, so 90 + 0.1 * (91 - 90)
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert!(close(percentile(&values, 90.0).unwrap(), 90.1));
        assert!(close(percentile(&values, 95.0).unwrap(), 95.05));
        assert!(close(percentile(&values, 50.0).unwrap(), 50.5));
    }

    #[test]
    fn percentile_handles_degenerate_input() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[7.0], 95.0), Some(7.0));
        assert_eq!(percentile(&[1.0, 2.0], 101.0), None);
        assert_eq!(percentile(&[1.0, 2.0], -1.0), None);
    }

    #[test]
    fn median_of_even_length_is_midpoint() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn std_dev_uses_sample_denominator() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // population std dev is 2.0; sample is sqrt(32 / 7)
        assert!(close(std_dev(&values).unwrap(), (32.0f64 / 7.0).sqrt()));
        assert_eq!(std_dev(&[3.0]), None);
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn min_max_and_mean() {
        let values = [3.0, -1.0, 8.0];
        assert_eq!(min(&values), Some(-1.0));
        assert_eq!(max(&values), Some(8.0));
        assert!(close(mean(&values).unwrap(), 10.0 / 3.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(min(&[]), None);
    }

    #[test]
    fn pearson_detects_linear_relationships() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!(close(pearson(&xs, &ys).unwrap(), 1.0));
        assert!(close(pearson(&xs, &inverse).unwrap(), -1.0));
    }

    #[test]
    fn pearson_undefined_for_constant_column() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
        assert_eq!(pearson(&[1.0], &[2.0]), None);
    }
}
