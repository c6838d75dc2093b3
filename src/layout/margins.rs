//! Document-wide margin inference and margin filtering.
//!
//! Margins and columns are global properties of a document: edges from every
//! page are pooled relative to their own page size and projected onto a single
//! reference page (the widest one). Each margin is a ratio of the page
//! dimension, clipped to a configurable band so a sparse or unusual page cannot
//! produce a degenerate content region.
//!
//! | margin | derived from |
//! |--------|--------------|
//! | left   | leftmost content edge |
//! | right  | rightmost content edge |
//! | top    | low percentile of top edges |
//! | bottom | high percentile of bottom edges |

use serde::{Deserialize, Serialize};

use crate::elements::{DocumentElementRecord, PageDimensions, RecordFlags};
use crate::geometry::Point;
use crate::layout::column_detector::{detect_columns, ColumnLayout};
use crate::layout::histogram::percentile;
use crate::pipeline::config::{ColumnConfig, MarginConfig};

/// Element edges pooled across all pages, in reference-page points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgePools {
    /// Width of the reference page
    pub reference_width: f32,
    /// Height of the reference page
    pub reference_height: f32,
    /// Horizontal `(left, right)` extent of every element
    pub horizontal: Vec<(f32, f32)>,
    /// Top edge of every element
    pub tops: Vec<f32>,
    /// Bottom edge of every element
    pub bottoms: Vec<f32>,
}

impl EdgePools {
    /// Pool the edges of `records`.
    ///
    /// The reference page is the widest page seen. Records whose coordinates could
    /// not be normalized are left out.
    pub fn collect(records: &[DocumentElementRecord]) -> Self {
        let reference = records
            .iter()
            .filter(|r| !r.flags.contains(RecordFlags::UNNORMALIZED))
            .map(|r| r.page_dimensions)
            .filter(|d| d.width_points > 0.0 && d.height_points > 0.0)
            .fold(None::<PageDimensions>, |best, d| match best {
                Some(b) if b.width_points >= d.width_points => Some(b),
                _ => Some(d),
            });

        let Some(reference) = reference else {
            return Self::default();
        };

        let mut pools = Self {
            reference_width: reference.width_points,
            reference_height: reference.height_points,
            ..Self::default()
        };

        for record in records {
            if record.flags.contains(RecordFlags::UNNORMALIZED) {
                continue;
            }
            let dims = record.page_dimensions;
            if !(dims.width_points > 0.0 && dims.height_points > 0.0) {
                continue;
            }
            let sx = reference.width_points / dims.width_points;
            let sy = reference.height_points / dims.height_points;
            let bbox = &record.bounding_box;
            pools.horizontal.push((bbox.x1 * sx, bbox.x2 * sx));
            pools.tops.push(bbox.y1 * sy);
            pools.bottoms.push(bbox.y2 * sy);
        }

        pools
    }

    /// Check if no edges were pooled.
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty()
    }
}

/// Margin sizes as ratios of the page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginSizes {
    /// Left margin / page width
    pub left: f32,
    /// Right margin / page width
    pub right: f32,
    /// Top margin / page height
    pub top: f32,
    /// Bottom margin / page height
    pub bottom: f32,
}

impl MarginSizes {
    /// The same ratio on all four sides.
    pub fn uniform(ratio: f32) -> Self {
        Self {
            left: ratio,
            right: ratio,
            top: ratio,
            bottom: ratio,
        }
    }

    /// Clip every ratio to `[min, max]`.
    pub fn clipped(self, min: f32, max: f32) -> Self {
        Self {
            left: self.left.clamp(min, max),
            right: self.right.clamp(min, max),
            top: self.top.clamp(min, max),
            bottom: self.bottom.clamp(min, max),
        }
    }

    /// Check if a point on a page of the given size lies in a margin.
    pub fn is_in_margin(&self, point: Point, width: f32, height: f32) -> bool {
        point.x < self.left * width
            || point.x > width - self.right * width
            || point.y < self.top * height
            || point.y > height - self.bottom * height
    }
}

/// Global layout of a document: margins plus columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Margin ratios shared by all pages
    pub margins: MarginSizes,
    /// Columns shared by all pages
    pub columns: ColumnLayout,
}

impl DocumentLayout {
    /// Layout used for a document without any elements.
    pub fn empty(config: &MarginConfig) -> Self {
        Self {
            margins: MarginSizes::uniform(config.min_ratio),
            columns: ColumnLayout::single(0.0),
        }
    }

    /// Check if the layout carries real column boundaries.
    pub fn has_columns(&self) -> bool {
        self.columns.reference_width > 0.0
    }
}

/// Infer margins and columns from all records of a document.
///
/// Must run once over the complete record set: a per-page call produces
/// per-page margins, which is not what downstream stages expect.
pub fn infer_layout(
    records: &[DocumentElementRecord],
    margin_config: &MarginConfig,
    column_config: &ColumnConfig,
) -> DocumentLayout {
    let pools = EdgePools::collect(records);
    if pools.is_empty() {
        log::debug!("No usable elements; using minimum margins and a single column");
        return DocumentLayout::empty(margin_config);
    }

    let width = pools.reference_width;
    let height = pools.reference_height;

    let content_left = pools
        .horizontal
        .iter()
        .map(|(l, _)| *l)
        .fold(f32::INFINITY, f32::min);
    let content_right = pools
        .horizontal
        .iter()
        .map(|(_, r)| *r)
        .fold(f32::NEG_INFINITY, f32::max);
    let top_edge = percentile(&pools.tops, margin_config.top_percentile).unwrap_or(0.0);
    let bottom_edge = percentile(&pools.bottoms, margin_config.bottom_percentile).unwrap_or(height);

    let margins = MarginSizes {
        left: content_left / width,
        right: (width - content_right) / width,
        top: top_edge / height,
        bottom: (height - bottom_edge) / height,
    }
    .clipped(margin_config.min_ratio, margin_config.max_ratio);

    let columns = detect_columns(&pools.horizontal, width, column_config);

    log::info!(
        "Inferred margins L={:.3} R={:.3} T={:.3} B={:.3}, {} column(s) from {} elements",
        margins.left,
        margins.right,
        margins.top,
        margins.bottom,
        columns.len(),
        pools.horizontal.len()
    );

    DocumentLayout { margins, columns }
}

/// Counts reported by the margin filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    /// Records examined
    pub processed: usize,
    /// Structured records dropped for sitting in a margin
    pub removed: usize,
}

/// Drop structured records whose center lies in a margin band or a column gutter.
///
/// Visual records are never dropped: figures and tables legitimately bleed into
/// margins. Relative order of the survivors is preserved.
pub fn filter_margins(
    records: Vec<DocumentElementRecord>,
    layout: &DocumentLayout,
    config: &MarginConfig,
) -> (Vec<DocumentElementRecord>, FilterSummary) {
    let processed = records.len();
    if !config.filter_enabled {
        return (
            records,
            FilterSummary {
                processed,
                removed: 0,
            },
        );
    }

    let kept: Vec<DocumentElementRecord> = records
        .into_iter()
        .filter(|record| {
            if record.is_visual() {
                return true;
            }
            let dims = record.page_dimensions;
            let center = record.center();
            let in_margin = layout
                .margins
                .is_in_margin(center, dims.width_points, dims.height_points)
                || (layout.has_columns() && layout.columns.is_in_margin(center.x, dims.width_points));
            if in_margin {
                log::trace!(
                    "Page {}: dropping {:?} in margin at ({:.1}, {:.1})",
                    record.page,
                    record.element_type,
                    center.x,
                    center.y
                );
            }
            !in_margin
        })
        .collect();

    let summary = FilterSummary {
        processed,
        removed: processed - kept.len(),
    };
    log::debug!(
        "Margin filter: {} processed, {} removed",
        summary.processed,
        summary.removed
    );
    (kept, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementType, OrderId, Source};
    use crate::geometry::BoundingBox;
    use proptest::prelude::*;

    fn record_on(
        dims: PageDimensions,
        source: Source,
        rect: (f32, f32, f32, f32),
    ) -> DocumentElementRecord {
        let bbox = BoundingBox::new(1, rect.0, rect.1, rect.2, rect.3).unwrap();
        DocumentElementRecord::new(bbox, ElementType::Text, source, dims)
            .with_order_id(OrderId::Native(0))
    }

    fn letter(source: Source, rect: (f32, f32, f32, f32)) -> DocumentElementRecord {
        record_on(PageDimensions::from_points(612.0, 792.0), source, rect)
    }

    #[test]
    fn test_single_element_margins() {
        let records = vec![letter(Source::StructuredExtractor, (72.0, 72.0, 540.0, 100.0))];
        let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());

        assert!((layout.margins.left - 72.0 / 612.0).abs() < 1e-5);
        assert!((layout.margins.right - 72.0 / 612.0).abs() < 1e-5);
        assert!((layout.margins.top - 72.0 / 792.0).abs() < 1e-5);
        assert_eq!(layout.margins.bottom, 0.15);
        assert_eq!(layout.columns.len(), 1);
    }

    #[test]
    fn test_empty_document_uses_minimum() {
        let layout = infer_layout(&[], &MarginConfig::default(), &ColumnConfig::default());
        assert_eq!(layout.margins, MarginSizes::uniform(0.05));
        assert_eq!(layout.columns.len(), 1);
    }

    #[test]
    fn test_two_column_document() {
        let dims = PageDimensions::from_points(400.0, 600.0);
        let mut records = Vec::new();
        for i in 0..6 {
            let y = 60.0 + i as f32 * 80.0;
            records.push(record_on(dims, Source::StructuredExtractor, (0.0, y, 100.0, y + 40.0)));
            records.push(record_on(dims, Source::StructuredExtractor, (300.0, y, 400.0, y + 40.0)));
        }
        let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());
        assert_eq!(layout.columns.len(), 2);
        assert_eq!(layout.margins.left, 0.05);
        assert_eq!(layout.margins.right, 0.05);
    }

    #[test]
    fn test_edges_pooled_relative_to_page() {
        let small = PageDimensions::from_points(306.0, 396.0);
        let records = vec![
            letter(Source::StructuredExtractor, (72.0, 72.0, 540.0, 700.0)),
            record_on(small, Source::StructuredExtractor, (36.0, 36.0, 270.0, 350.0)),
        ];
        let pools = EdgePools::collect(&records);
        assert_eq!(pools.reference_width, 612.0);
        assert_eq!(pools.horizontal[1], (72.0, 540.0));
        assert_eq!(pools.tops[1], 72.0);
    }

    #[test]
    fn test_unnormalized_records_not_pooled() {
        let mut stray = letter(Source::VisualLayoutDetector, (0.0, 0.0, 1800.0, 2300.0));
        stray.flags |= RecordFlags::UNNORMALIZED;
        let records = vec![stray, letter(Source::StructuredExtractor, (72.0, 72.0, 540.0, 100.0))];
        let pools = EdgePools::collect(&records);
        assert_eq!(pools.horizontal.len(), 1);
    }

    #[test]
    fn test_filter_drops_structured_header_only() {
        let records = vec![
            letter(Source::StructuredExtractor, (200.0, 10.0, 400.0, 25.0)),
            letter(Source::VisualLayoutDetector, (200.0, 10.0, 400.0, 25.0)),
            letter(Source::StructuredExtractor, (72.0, 200.0, 540.0, 240.0)),
        ];
        let layout = DocumentLayout {
            margins: MarginSizes::uniform(0.1),
            columns: ColumnLayout::single(612.0),
        };
        let (kept, summary) = filter_margins(records, &layout, &MarginConfig::default());
        assert_eq!(summary, FilterSummary { processed: 3, removed: 1 });
        assert_eq!(kept.len(), 2);
        assert!(kept[0].is_visual());
        assert!(kept[1].is_structured());
    }

    #[test]
    fn test_filter_disabled_keeps_everything() {
        let records = vec![letter(Source::StructuredExtractor, (200.0, 10.0, 400.0, 25.0))];
        let layout = DocumentLayout::empty(&MarginConfig::default());
        let config = MarginConfig {
            filter_enabled: false,
            ..MarginConfig::default()
        };
        let (kept, summary) = filter_margins(records, &layout, &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(summary.removed, 0);
    }

    proptest! {
        #[test]
        fn prop_margins_always_clipped(
            rects in prop::collection::vec((0.0f32..600.0, 0.0f32..780.0, 1.0f32..300.0, 1.0f32..300.0), 1..20)
        ) {
            let records: Vec<_> = rects
                .into_iter()
                .map(|(x, y, w, h)| letter(Source::StructuredExtractor, (x, y, x + w, y + h)))
                .collect();
            let config = MarginConfig::default();
            let layout = infer_layout(&records, &config, &ColumnConfig::default());
            for ratio in [layout.margins.left, layout.margins.right, layout.margins.top, layout.margins.bottom] {
                prop_assert!((config.min_ratio..=config.max_ratio).contains(&ratio));
            }
            prop_assert!(!layout.columns.is_empty());
        }
    }
}
