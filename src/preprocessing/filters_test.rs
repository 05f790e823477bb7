// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use super::filters::{MovingAverageFilter, SmoothingFilter};

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference computation: prefix sums kept for the whole sequence
    fn prefix_sum_average(samples: &[i64], window: usize) -> Vec<i64> {
        let mut cumulative = vec![0i64];
        let mut out = Vec::with_capacity(samples.len());
        for (i, &s) in samples.iter().enumerate() {
            let n = i + 1;
            cumulative.push(cumulative[n - 1] + s);
            if n >= window {
                out.push((cumulative[n] - cumulative[n - window]) / window as i64);
            } else {
                out.push(s);
            }
        }
        out
    }

    #[test]
    fn test_ramp_one_to_thirty() {
        let mut filter = MovingAverageFilter::new(15);
        let outputs: Vec<i64> = (1..=30).map(|v| filter.push(v)).collect();

        // No smoothing until the window fills
        for (i, &out) in outputs.iter().take(14).enumerate() {
            assert_eq!(out, i as i64 + 1);
        }
        assert_eq!(outputs[14], 8); // (1..=15).sum() / 15
        assert_eq!(outputs[15], 9); // (2..=16).sum() / 15
        assert_eq!(outputs[29], (16..=30).sum::<i64>() / 15);
        assert_eq!(filter.sample_count(), 30);
    }

    #[test]
    fn test_matches_prefix_sum_reference_on_noisy_signal() {
        // Stirring-like signal around 750 RPM with deterministic noise
        let samples: Vec<i64> = (0..200)
            .map(|i| 750 + ((i * 37) % 61) as i64 - 30)
            .collect();
        let expected = prefix_sum_average(&samples, 15);

        let mut filter = MovingAverageFilter::new(15);
        let actual: Vec<i64> = samples.iter().map(|&s| filter.push(s)).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_integer_division_truncates() {
        let mut filter = MovingAverageFilter::new(2);
        assert_eq!(filter.push(1), 1);
        assert_eq!(filter.push(2), 1); // 3 / 2
        assert_eq!(filter.push(4), 3); // 6 / 2
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let mut filter = MovingAverageFilter::new(1);
        for v in [700, 690, 712] {
            assert_eq!(filter.push(v), v);
        }
    }

    #[test]
    fn test_zero_window_is_promoted_to_one() {
        let filter = MovingAverageFilter::new(0);
        assert_eq!(filter.window_size(), 1);
    }

    #[test]
    fn test_memory_stays_bounded() {
        let mut filter = MovingAverageFilter::new(15);
        for v in 0..10_000 {
            filter.push(v);
        }
        assert!(filter.is_full());
        assert_eq!(filter.window_size(), 15);
        assert_eq!(filter.sample_count(), 10_000);
    }

    #[test]
    fn test_extreme_samples_do_not_overflow() {
        let mut filter = MovingAverageFilter::new(15);
        for _ in 0..15 {
            filter.push(i64::MAX);
        }
        assert_eq!(filter.push(i64::MAX), i64::MAX);

        let mut filter = MovingAverageFilter::new(15);
        for _ in 0..15 {
            filter.push(i64::MIN);
        }
        assert_eq!(filter.push(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_largest_decoded_stirring_over_a_full_window() {
        // Largest magnitude the telemetry decoder lets through
        let largest = 9_000_000_000_000_000_000i64;
        let mut filter = MovingAverageFilter::new(15);
        assert_eq!(filter.push(largest), largest);
        assert_eq!(filter.push(largest), largest);
        for _ in 2..15 {
            filter.push(largest);
        }
        assert!(filter.is_full());
        assert_eq!(filter.push(largest), largest);
        // Fourteen at `largest`, one at `-largest`
        assert_eq!(filter.push(-largest), 7_800_000_000_000_000_000);
    }
}
