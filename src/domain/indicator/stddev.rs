//! Population mean and standard deviation helpers.
//!
//! Shared by Bollinger Bands and the per-trade Sharpe ratio so both use the
//! same convention: divide by N, not N-1.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// sqrt(sum((x - mean)^2) / N). Zero for an empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - m;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_constant_is_zero() {
        assert_eq!(population_stddev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn stddev_divides_by_n() {
        // mean 20, squared diffs 100 + 0 + 100 → 200 / 3
        let expected = (200.0_f64 / 3.0).sqrt();
        assert!((population_stddev(&[10.0, 20.0, 30.0]) - expected).abs() < 1e-12);
    }

    #[test]
    fn stddev_known_textbook_value() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_stddev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_stddev(&[]), 0.0);
    }
}
