//! One-dimensional profile analysis.
//!
//! Helpers shared by column detection and margin inference: occupancy
//! histograms, moving-average smoothing, prominence-based peak finding and
//! interpolated percentiles.
//!
//! Peaks follow the usual signal-processing conventions: a plateau counts as a
//! single peak located at its middle, a plateau touching either border is never
//! a peak, and prominence is measured against the higher of the two lowest points
//! reachable on each side before the signal climbs above the peak.

use crate::utils::safe_float_cmp;

/// Build an occupancy histogram over `[0, extent)`.
///
/// Each interval adds one to every bin it touches. Intervals are clipped to the
/// extent; empty or inverted intervals are ignored.
pub fn occupancy_histogram(intervals: &[(f32, f32)], extent: f32, bins: usize) -> Vec<f32> {
    let mut histogram = vec![0.0; bins];
    if bins == 0 || !(extent > 0.0) {
        return histogram;
    }

    let bin_width = extent / bins as f32;
    for &(start, end) in intervals {
        let start = start.clamp(0.0, extent);
        let end = end.clamp(0.0, extent);
        if !(end > start) {
            continue;
        }
        let first = ((start / bin_width).floor() as usize).min(bins - 1);
        let last = ((end / bin_width).ceil() as usize).saturating_sub(1).min(bins - 1);
        for bin in histogram.iter_mut().take(last + 1).skip(first) {
            *bin += 1.0;
        }
    }

    histogram
}

/// Centered moving average.
///
/// Near the borders the window shrinks to the samples available, so a flat
/// profile stays flat after smoothing.
pub fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    if window <= 1 || values.is_empty() {
        return values.to_vec();
    }

    let half = window / 2;
    let last = values.len() - 1;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(last);
            let slice = &values[lo..=hi];
            slice.iter().sum::<f32>() / slice.len() as f32
        })
        .collect()
}

/// A local maximum of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Index of the peak (middle of its plateau)
    pub index: usize,
    /// First index of the plateau
    pub plateau_start: usize,
    /// Last index of the plateau
    pub plateau_end: usize,
    /// Height of the peak above its higher base
    pub prominence: f32,
    /// Index of the lowest point on the left before the profile rises above the peak
    pub left_base: usize,
    /// Index of the lowest point on the right before the profile rises above the peak
    pub right_base: usize,
}

impl Peak {
    /// Interpolated `(left, right)` positions where the profile crosses
    /// `rel_height` of the prominence below the peak.
    ///
    /// Positions are fractional indices; `right - left` is the peak width.
    pub fn crossings(&self, values: &[f32], rel_height: f32) -> (f32, f32) {
        let height = values[self.index] - self.prominence * rel_height;

        let mut i = self.index;
        while self.left_base < i && height < values[i] {
            i -= 1;
        }
        let mut left = i as f32;
        if values[i] < height {
            let rise = values[i + 1] - values[i];
            if rise > 0.0 {
                left += (height - values[i]) / rise;
            }
        }

        let mut i = self.index;
        while i < self.right_base && height < values[i] {
            i += 1;
        }
        let mut right = i as f32;
        if values[i] < height {
            let rise = values[i - 1] - values[i];
            if rise > 0.0 {
                right -= (height - values[i]) / rise;
            }
        }

        (left, right)
    }

    /// Width of the peak at `rel_height` of its prominence, in samples.
    pub fn width(&self, values: &[f32], rel_height: f32) -> f32 {
        let (left, right) = self.crossings(values, rel_height);
        right - left
    }
}

/// Find all local maxima of `values`, with their prominence.
pub fn find_peaks(values: &[f32]) -> Vec<Peak> {
    let mut peaks = Vec::new();
    if values.len() < 3 {
        return peaks;
    }

    let last = values.len() - 1;
    let mut i = 1;
    while i < last {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < last && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                let plateau_start = i;
                let plateau_end = ahead - 1;
                let index = (plateau_start + plateau_end) / 2;
                let (prominence, left_base, right_base) = prominence(values, index);
                peaks.push(Peak {
                    index,
                    plateau_start,
                    plateau_end,
                    prominence,
                    left_base,
                    right_base,
                });
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

fn prominence(values: &[f32], peak: usize) -> (f32, usize, usize) {
    let top = values[peak];

    let mut left_base = peak;
    let mut left_min = top;
    let mut i = peak as isize;
    while i >= 0 && values[i as usize] <= top {
        if values[i as usize] < left_min {
            left_min = values[i as usize];
            left_base = i as usize;
        }
        i -= 1;
    }

    let mut right_base = peak;
    let mut right_min = top;
    let mut i = peak;
    while i < values.len() && values[i] <= top {
        if values[i] < right_min {
            right_min = values[i];
            right_base = i;
        }
        i += 1;
    }

    (top - left_min.max(right_min), left_base, right_base)
}

/// Percentile of `values` (0-100) with linear interpolation between ranks.
///
/// Returns `None` for an empty input.
pub fn percentile(values: &[f32], pct: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| safe_float_cmp(*a, *b));

    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_occupancy_histogram() {
        let h = occupancy_histogram(&[(0.0, 100.0), (300.0, 400.0)], 400.0, 100);
        assert_eq!(h.len(), 100);
        assert!(h[..25].iter().all(|v| *v == 1.0));
        assert!(h[25..75].iter().all(|v| *v == 0.0));
        assert!(h[75..].iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_occupancy_histogram_clips_and_skips() {
        let h = occupancy_histogram(&[(-50.0, 10.0), (390.0, 900.0), (20.0, 20.0)], 400.0, 100);
        assert_eq!(h[0], 1.0);
        assert_eq!(h[2], 1.0);
        assert_eq!(h[3], 0.0);
        assert_eq!(h[5], 0.0);
        assert_eq!(h[99], 1.0);
        assert!(occupancy_histogram(&[(0.0, 1.0)], 0.0, 10).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_moving_average() {
        let smoothed = moving_average(&[0.0, 3.0, 0.0, 3.0, 3.0], 3);
        assert_eq!(smoothed, vec![1.5, 1.0, 2.0, 2.0, 3.0]);
        assert_eq!(moving_average(&[1.0, 2.0], 1), vec![1.0, 2.0]);
        assert!(moving_average(&[], 3).is_empty());
    }

    #[test]
    fn test_single_peak_prominence() {
        let values = [0.0, 1.0, 4.0, 2.0, 3.0, 0.0];
        let peaks = find_peaks(&values);
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].index, 2);
        assert_eq!(peaks[0].prominence, 4.0);
        assert_eq!(peaks[1].index, 4);
        assert_eq!(peaks[1].prominence, 1.0);
        assert_eq!(peaks[1].left_base, 3);
    }

    #[test]
    fn test_plateau_peak_is_centered() {
        let values = [0.0, 2.0, 2.0, 2.0, 2.0, 0.0];
        let peaks = find_peaks(&values);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 2);
        assert_eq!(peaks[0].plateau_start, 1);
        assert_eq!(peaks[0].plateau_end, 4);
    }

    #[test]
    fn test_border_plateau_is_not_a_peak() {
        assert!(find_peaks(&[0.0, 1.0, 1.0, 1.0]).is_empty());
        assert!(find_peaks(&[1.0, 1.0, 0.0, 0.0]).is_empty());
        assert!(find_peaks(&[1.0, 0.0]).is_empty());
    }

    #[test]
    fn test_peak_width_interpolates() {
        let values = [-3.0, -3.0, -2.0, -1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -3.0, -3.0];
        let peaks = find_peaks(&values);
        assert_eq!(peaks.len(), 1);
        let peak = peaks[0];
        assert_eq!(peak.prominence, 3.0);
        let (left, right) = peak.crossings(&values, 0.5);
        assert!((left - 2.5).abs() < 1e-6);
        assert!((right - 7.5).abs() < 1e-6);
        assert!((peak.width(&values, 0.5) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [10.0, 0.0, 40.0, 30.0, 20.0];
        assert_eq!(percentile(&values, 0.0), Some(0.0));
        assert_eq!(percentile(&values, 50.0), Some(20.0));
        assert_eq!(percentile(&values, 100.0), Some(40.0));
        let p5 = percentile(&values, 5.0).unwrap();
        assert!((p5 - 2.0).abs() < 1e-5);
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[7.0], 95.0), Some(7.0));
    }

    proptest! {
        #[test]
        fn prop_prominence_non_negative(values in prop::collection::vec(0.0f32..10.0, 3..60)) {
            for peak in find_peaks(&values) {
                prop_assert!(peak.prominence >= 0.0);
                prop_assert!(peak.left_base <= peak.index && peak.index <= peak.right_base);
                prop_assert!(peak.index > 0 && peak.index < values.len() - 1);
            }
        }

        #[test]
        fn prop_percentile_within_range(values in prop::collection::vec(-100.0f32..100.0, 1..40), pct in 0.0f32..100.0) {
            let p = percentile(&values, pct).unwrap();
            let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            prop_assert!(p >= min - 1e-3 && p <= max + 1e-3);
        }
    }
}
