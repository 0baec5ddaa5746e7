use std::time::Duration;

/// Calculate the mean (average) duration from a collection of durations
pub fn calculate_mean(durations: &[Duration]) -> Duration {
    if durations.is_empty() {
        return Duration::ZERO;
    }

    let total: Duration = durations.iter().sum();
    total / durations.len() as u32
}

/// Calculate the median of an already sorted slice
pub fn calculate_median(sorted: &[Duration]) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }

    let len = sorted.len();
    if len.is_multiple_of(2) {
        // Even number of elements - average the two middle values
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2
    } else {
        // Odd number of elements - return the middle value
        sorted[len / 2]
    }
}

/// Calculate the standard deviation of durations around `mean`
pub fn calculate_std_dev(durations: &[Duration], mean: Duration) -> Duration {
    if durations.len() <= 1 {
        return Duration::ZERO;
    }

    let mean_nanos = mean.as_nanos() as f64;

    let variance: f64 = durations
        .iter()
        .map(|d| {
            let diff = d.as_nanos() as f64 - mean_nanos;
            diff * diff
        })
        .sum::<f64>()
        / (durations.len() - 1) as f64; // Sample standard deviation (n-1)

    Duration::from_nanos(variance.sqrt() as u64)
}

/// Nearest-rank percentile of an already sorted slice
///
/// # Arguments
/// * `sorted` - Durations in ascending order
/// * `percentile` - Percentile to calculate (0.0 to 1.0, e.g., 0.95 for 95th percentile)
pub fn calculate_percentile(sorted: &[Duration], percentile: f64) -> Duration {
    let Some(last) = sorted.last() else {
        return Duration::ZERO;
    };

    if percentile <= 0.0 {
        return Duration::ZERO;
    }

    if percentile >= 1.0 {
        return *last;
    }

    // Nearest rank, rounding up so p95 of 100 samples is the 96th
    let index = (percentile * (sorted.len() - 1) as f64).ceil() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Calculate throughput (operations per second) given iterations and total duration
pub fn calculate_throughput(iterations: u32, total_duration: Duration) -> f64 {
    if total_duration.is_zero() {
        return 0.0;
    }

    iterations as f64 / total_duration.as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|v| Duration::from_millis(*v)).collect()
    }

    #[test]
    fn test_calculate_mean() {
        assert_eq!(
            calculate_mean(&millis(&[100, 200, 300])),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_calculate_mean_empty() {
        assert_eq!(calculate_mean(&[]), Duration::ZERO);
    }

    #[test]
    fn test_calculate_median_odd() {
        assert_eq!(
            calculate_median(&millis(&[100, 200, 300])),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_calculate_median_even() {
        assert_eq!(
            calculate_median(&millis(&[100, 200, 300, 400])),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_calculate_std_dev() {
        let durations = millis(&[100, 200, 300]);
        let std_dev = calculate_std_dev(&durations, calculate_mean(&durations));

        // Sample std dev with n-1 is 100ms
        assert!(std_dev >= Duration::from_millis(95));
        assert!(std_dev <= Duration::from_millis(105));
    }

    #[test]
    fn test_calculate_std_dev_single_sample() {
        let durations = millis(&[42]);
        assert_eq!(
            calculate_std_dev(&durations, Duration::from_millis(42)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_calculate_percentile_95() {
        let sorted: Vec<Duration> = (1..=100).map(|i| Duration::from_millis(i * 10)).collect();
        let p95 = calculate_percentile(&sorted, 0.95);

        assert!(p95 >= Duration::from_millis(940));
        assert!(p95 <= Duration::from_millis(960));
    }

    #[test]
    fn test_calculate_percentile_edge_cases() {
        let sorted = millis(&[100]);

        assert_eq!(calculate_percentile(&sorted, 0.0), Duration::ZERO);
        assert_eq!(calculate_percentile(&sorted, 1.0), Duration::from_millis(100));
        assert_eq!(calculate_percentile(&sorted, 0.5), Duration::from_millis(100));
        assert_eq!(calculate_percentile(&[], 0.5), Duration::ZERO);
    }

    #[test]
    fn test_calculate_throughput() {
        assert_eq!(calculate_throughput(100, Duration::from_secs(10)), 10.0);
        assert_eq!(calculate_throughput(100, Duration::from_millis(2500)), 40.0);
        assert_eq!(calculate_throughput(100, Duration::ZERO), 0.0);
    }
}
