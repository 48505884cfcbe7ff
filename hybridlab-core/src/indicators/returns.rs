//! Shared numeric series helpers: percent change, log returns, prefix sums.

/// Percent change from the previous value. Index 0 has no prior and is `None`.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        if i == 0 || values[i - 1] == 0.0 {
            out.push(None);
        } else {
            out.push(Some(values[i] / values[i - 1] - 1.0));
        }
    }
    out
}

/// Log returns `ln(1 + pct_change)`, skipping the undefined first entry.
pub fn log_returns(values: &[f64]) -> Vec<f64> {
    pct_change(values)
        .into_iter()
        .flatten()
        .map(|r| (1.0 + r).ln())
        .collect()
}

/// Running prefix sum: out[0] = x[0], out[i] = out[i-1] + x[i].
pub fn prefix_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Arithmetic mean. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator). `None` for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn pct_change_first_is_none() {
        let r = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(r[0], None);
        assert_approx(r[1].unwrap(), 0.1, DEFAULT_EPSILON);
        assert_approx(r[2].unwrap(), -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_zero_base_is_none() {
        let r = pct_change(&[0.0, 1.0]);
        assert_eq!(r[1], None);
    }

    #[test]
    fn log_returns_length() {
        let r = log_returns(&[100.0, 110.0, 121.0]);
        assert_eq!(r.len(), 2);
        assert_approx(r[0], 1.1_f64.ln(), DEFAULT_EPSILON);
        assert_approx(r[1], 1.1_f64.ln(), DEFAULT_EPSILON);
    }

    #[test]
    fn prefix_sum_matches_running_total() {
        assert_eq!(prefix_sum(&[1.0, -2.0, 4.0]), vec![1.0, -1.0, 3.0]);
        assert!(prefix_sum(&[]).is_empty());
    }

    #[test]
    fn mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(sample_std(&[1.0]), None);
        assert_approx(sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 2.138089935299395, 1e-12);
    }
}
