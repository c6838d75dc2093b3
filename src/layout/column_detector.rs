//! Histogram valley column detection.
//!
//! Every element contributes its horizontal extent to an occupancy histogram of
//! the page width. Column gutters are the deep, wide valleys of the smoothed
//! histogram; the columns are the segments between them.
//!
//! ```text
//! occupancy  ████████▇▅▂           ▂▅▇████████
//!            |   col 0   |  gap   |   col 1   |
//!            0                                W
//! ```
//!
//! Valleys are found as peaks of the negated histogram. A valley qualifies when
//! its prominence reaches `min_valley_prominence` of the histogram maximum and
//! its width at half prominence spans at least `min_gap_width` points.

use serde::{Deserialize, Serialize};

use crate::layout::histogram::{find_peaks, moving_average, occupancy_histogram};
use crate::pipeline::config::ColumnConfig;

/// Horizontal extent of one column, in reference-page points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    /// Left boundary
    pub start: f32,
    /// Right boundary
    pub end: f32,
}

impl ColumnRange {
    /// Create a new column range.
    pub fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Column width.
    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    /// Check if `x` lies within the column (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        x >= self.start && x <= self.end
    }

    fn distance(&self, x: f32) -> f32 {
        if x < self.start {
            self.start - x
        } else if x > self.end {
            x - self.end
        } else {
            0.0
        }
    }
}

/// Columns shared by every page of a document.
///
/// Boundaries are expressed on a reference page width; pages of a different
/// width are mapped proportionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnLayout {
    /// Width of the page the boundaries are expressed on
    pub reference_width: f32,
    /// Columns from left to right, never empty
    pub columns: Vec<ColumnRange>,
}

impl ColumnLayout {
    /// A single column spanning the whole page.
    pub fn single(width: f32) -> Self {
        Self {
            reference_width: width,
            columns: vec![ColumnRange::new(0.0, width)],
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a layout has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check if more than one column was detected.
    pub fn is_multi_column(&self) -> bool {
        self.columns.len() > 1
    }

    /// Check if a horizontal position on a page of `page_width` falls in a gutter
    /// between two columns or outside the outermost columns.
    pub fn is_in_margin(&self, x: f32, page_width: f32) -> bool {
        let x = self.to_reference(x, page_width);
        !self.columns.iter().any(|c| c.contains(x))
    }

    /// Index of the column for a horizontal position on a page of `page_width`.
    ///
    /// Positions inside a gutter go to the nearest column; ties go left.
    pub fn column_index(&self, x: f32, page_width: f32) -> usize {
        let x = self.to_reference(x, page_width);

        let mut best = 0;
        let mut best_distance = f32::INFINITY;
        for (i, column) in self.columns.iter().enumerate() {
            let distance = column.distance(x);
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        best
    }

    fn to_reference(&self, x: f32, page_width: f32) -> f32 {
        if page_width > 0.0 && self.reference_width > 0.0 {
            x * self.reference_width / page_width
        } else {
            x
        }
    }
}

/// Detect columns from horizontal occupancy intervals.
///
/// `intervals` are `(left, right)` element extents on a page of `reference_width`
/// points. With no intervals, or no qualifying valley, the page is one column.
pub fn detect_columns(
    intervals: &[(f32, f32)],
    reference_width: f32,
    config: &ColumnConfig,
) -> ColumnLayout {
    if intervals.is_empty() || !(reference_width > 0.0) || config.bins < 3 {
        return ColumnLayout::single(reference_width.max(0.0));
    }

    let raw = occupancy_histogram(intervals, reference_width, config.bins);
    let smoothed = moving_average(&raw, config.smoothing_window);
    let max = smoothed.iter().cloned().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return ColumnLayout::single(reference_width);
    }

    let bin_width = reference_width / config.bins as f32;
    let negated: Vec<f32> = smoothed.iter().map(|v| -v).collect();
    let min_prominence = config.min_valley_prominence * max;

    let mut gaps: Vec<(f32, f32)> = Vec::new();
    for valley in find_peaks(&negated) {
        if valley.prominence < min_prominence {
            continue;
        }
        let width = valley.width(&negated, 0.5) * bin_width;
        if width < config.min_gap_width {
            log::trace!(
                "Rejected valley at bin {}: width {:.1}pt < {:.1}pt",
                valley.index,
                width,
                config.min_gap_width
            );
            continue;
        }
        let (left, right) = valley.crossings(&negated, 0.5);
        let start = ((left + 0.5) * bin_width).clamp(0.0, reference_width);
        let end = ((right + 0.5) * bin_width).clamp(0.0, reference_width);
        gaps.push((start, end));
    }
    gaps.sort_by(|a, b| crate::utils::safe_float_cmp(a.0, b.0));

    let mut columns = Vec::with_capacity(gaps.len() + 1);
    let mut cursor = 0.0;
    for (start, end) in gaps {
        if start > cursor {
            columns.push(ColumnRange::new(cursor, start));
        }
        cursor = cursor.max(end);
    }
    if reference_width > cursor {
        columns.push(ColumnRange::new(cursor, reference_width));
    }
    if columns.is_empty() {
        return ColumnLayout::single(reference_width);
    }

    log::debug!(
        "Detected {} column(s) over {:.1}pt reference width",
        columns.len(),
        reference_width
    );

    ColumnLayout {
        reference_width,
        columns,
    }
}
