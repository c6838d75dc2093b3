#![allow(dead_code)]
//! Integration tests for the layout stages.
//!
//! These tests chain reconciliation, margin and column inference, filtering and
//! reading order over hand-built records simulating realistic page layouts.

use layout_fusion::elements::{
    DocumentElementRecord, ElementType, OrderId, PageDimensions, RecordFlags, Source,
};
use layout_fusion::geometry::BoundingBox;
use layout_fusion::layout::{filter_margins, infer_layout, reconcile, MarginSizes};
use layout_fusion::pipeline::{
    ColumnConfig, ColumnOrderStrategy, DetectorOrderStrategy, MarginConfig, OverlapConfig,
    ReadingOrderContext, ReadingOrderStrategy,
};

// ============================================================================
// Helper Functions for Creating Mock Records
// ============================================================================

fn letter() -> PageDimensions {
    PageDimensions::from_points(612.0, 792.0)
}

fn record(
    page: u32,
    source: Source,
    element_type: ElementType,
    rect: (f32, f32, f32, f32),
    dims: PageDimensions,
) -> DocumentElementRecord {
    let bbox = BoundingBox::new(page, rect.0, rect.1, rect.2, rect.3).unwrap();
    DocumentElementRecord::new(bbox, element_type, source, dims)
}

fn paragraph(page: u32, rect: (f32, f32, f32, f32), order: u32) -> DocumentElementRecord {
    record(page, Source::StructuredExtractor, ElementType::Text, rect, letter())
        .with_order_id(OrderId::Native(order))
        .with_text(format!("p{}-{}", page, order))
}

fn visual(page: u32, element_type: ElementType, rect: (f32, f32, f32, f32)) -> DocumentElementRecord {
    record(page, Source::VisualLayoutDetector, element_type, rect, letter())
}

/// Give records document-wide detection indices in their current order.
fn indexed(records: Vec<DocumentElementRecord>) -> Vec<DocumentElementRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.with_detection_index(i))
        .collect()
}

/// Two-column page: three paragraphs per column, left column first in native order.
fn two_column_page(page: u32) -> Vec<DocumentElementRecord> {
    let mut records = Vec::new();
    for (col, (x1, x2)) in [(72.0, 270.0), (342.0, 540.0)].into_iter().enumerate() {
        for row in 0..3 {
            let y = 100.0 + row as f32 * 200.0;
            records.push(paragraph(page, (x1, y, x2, y + 150.0), (col * 3 + row) as u32));
        }
    }
    records
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_reconciliation_is_page_scoped() {
    let records = indexed(vec![
        paragraph(1, (100.0, 300.0, 500.0, 400.0), 0),
        paragraph(2, (100.0, 300.0, 500.0, 400.0), 0),
        visual(2, ElementType::Image, (90.0, 290.0, 510.0, 410.0)),
    ]);

    let (kept, summary) = reconcile(records, &OverlapConfig::default());

    assert_eq!(summary.removed, 1);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].page, 1);
    assert!(kept[0].is_structured());
    assert_eq!(kept[1].page, 2);
    assert_eq!(kept[1].element_type, ElementType::Image);
    assert_eq!(kept[1].order_id, OrderId::Native(0));
}

#[test]
fn test_visual_region_takes_earliest_covered_order() {
    let records = indexed(vec![
        paragraph(1, (72.0, 72.0, 540.0, 100.0), 0),
        paragraph(1, (72.0, 200.0, 300.0, 220.0), 1),
        paragraph(1, (72.0, 230.0, 300.0, 250.0), 2),
        paragraph(1, (72.0, 600.0, 540.0, 700.0), 3),
        visual(1, ElementType::Table, (60.0, 190.0, 320.0, 260.0)),
    ]);

    let (kept, summary) = reconcile(records, &OverlapConfig::default());

    assert_eq!(summary.removed, 2);
    assert_eq!(summary.transfers, 1);
    let orders: Vec<OrderId> = kept.iter().map(|r| r.order_id).collect();
    assert_eq!(orders, vec![OrderId::Native(0), OrderId::Native(1), OrderId::Native(3)]);
    assert!(kept[1].flags.contains(RecordFlags::ORDER_TRANSFERRED));
}

#[test]
fn test_partial_overlap_keeps_both() {
    // Intersection 50x100 over a min area of 100x100 is exactly one half.
    let records = indexed(vec![
        paragraph(1, (100.0, 100.0, 200.0, 200.0), 0),
        visual(1, ElementType::Image, (150.0, 100.0, 350.0, 300.0)),
    ]);

    let (kept, summary) = reconcile(records, &OverlapConfig::default());

    assert_eq!(summary.removed, 0);
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[1].order_id, OrderId::Unordered);
}

// ============================================================================
// Margins and Columns
// ============================================================================

#[test]
fn test_two_column_document_layout() {
    let mut records = two_column_page(1);
    records.extend(two_column_page(2));
    let records = indexed(records);

    let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());

    assert_eq!(layout.columns.len(), 2);
    assert!(layout.columns.columns[0].end > 270.0 && layout.columns.columns[0].end < 306.0);
    assert!(layout.columns.columns[1].start > 306.0 && layout.columns.columns[1].start < 342.0);
    assert!((layout.margins.left - 72.0 / 612.0).abs() < 1e-4);
    assert!((layout.margins.right - 72.0 / 612.0).abs() < 1e-4);

    let (kept, summary) = filter_margins(records, &layout, &MarginConfig::default());
    assert_eq!(summary.processed, 12);
    assert_eq!(summary.removed, 0);

    let context = ReadingOrderContext::new().with_columns(layout.columns.clone());
    let ordered = ColumnOrderStrategy.apply(kept, &context).unwrap();

    let lefts: Vec<f32> = ordered[..6].iter().map(|r| r.bounding_box.x1).collect();
    assert_eq!(lefts, vec![72.0, 72.0, 72.0, 342.0, 342.0, 342.0]);
    assert!(ordered[..6].iter().all(|r| r.page == 1));
    assert_eq!(ordered[11].reading_order, Some(11));
}

#[test]
fn test_gutter_content_is_filtered_in_multi_column_documents() {
    let mut records = two_column_page(1);
    records.extend(two_column_page(2));
    records.push(paragraph(1, (290.0, 720.0, 322.0, 730.0), 6));
    records.push(visual(1, ElementType::Image, (290.0, 400.0, 322.0, 440.0)));
    let records = indexed(records);

    let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());
    assert!(layout.columns.is_multi_column());

    let (kept, summary) = filter_margins(records, &layout, &MarginConfig::default());

    assert_eq!(summary.removed, 1);
    assert_eq!(kept.len(), 13);
    assert!(kept.iter().any(|r| r.element_type == ElementType::Image));
}

#[test]
fn test_margins_pool_pages_of_different_sizes() {
    let half = PageDimensions::from_points(306.0, 396.0);
    let records = indexed(vec![
        paragraph(1, (72.0, 72.0, 540.0, 700.0), 0),
        record(2, Source::StructuredExtractor, ElementType::Text, (36.0, 36.0, 270.0, 350.0), half)
            .with_order_id(OrderId::Native(0)),
    ]);

    let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());

    assert_eq!(layout.columns.reference_width, 612.0);
    assert!((layout.margins.left - 72.0 / 612.0).abs() < 1e-4);
    assert!((layout.margins.right - 72.0 / 612.0).abs() < 1e-4);
    assert!((layout.margins.top - 72.0 / 792.0).abs() < 1e-4);
    assert!((layout.margins.bottom - 92.0 / 792.0).abs() < 1e-4);
}

#[test]
fn test_margins_are_clipped() {
    // Full-bleed content and a tiny central block.
    let records = indexed(vec![
        paragraph(1, (0.0, 0.0, 612.0, 792.0), 0),
        paragraph(2, (300.0, 390.0, 310.0, 400.0), 0),
    ]);

    let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());

    assert_eq!(layout.margins.left, 0.05);
    assert_eq!(layout.margins.right, 0.05);
    assert!(layout.margins.top >= 0.05 && layout.margins.top <= 0.15);
    assert!(layout.margins.bottom >= 0.05 && layout.margins.bottom <= 0.15);
}

#[test]
fn test_unnormalized_records_do_not_shape_margins() {
    let mut stray = paragraph(1, (0.0, 0.0, 10.0, 10.0), 1);
    stray.flags |= RecordFlags::UNNORMALIZED;
    let records = indexed(vec![paragraph(1, (72.0, 72.0, 540.0, 700.0), 0), stray]);

    let layout = infer_layout(&records, &MarginConfig::default(), &ColumnConfig::default());

    assert!((layout.margins.left - 72.0 / 612.0).abs() < 1e-4);
}

#[test]
fn test_empty_document_layout() {
    let layout = infer_layout(&[], &MarginConfig::default(), &ColumnConfig::default());
    assert_eq!(layout.margins, MarginSizes::uniform(0.05));
    assert!(!layout.has_columns());
}

// ============================================================================
// Reading Order
// ============================================================================

#[test]
fn test_detector_order_spans_pages() {
    let records = indexed(vec![
        paragraph(2, (72.0, 100.0, 540.0, 200.0), 0),
        visual(1, ElementType::Image, (72.0, 400.0, 540.0, 600.0)),
        paragraph(1, (72.0, 100.0, 540.0, 200.0), 1),
        paragraph(1, (72.0, 250.0, 540.0, 350.0), 0),
    ]);

    let context = ReadingOrderContext::new().with_structured(true);
    let ordered = DetectorOrderStrategy.apply(records, &context).unwrap();

    let keys: Vec<(u32, OrderId)> = ordered.iter().map(|r| (r.page, r.order_id)).collect();
    assert_eq!(
        keys,
        vec![
            (1, OrderId::Native(0)),
            (1, OrderId::Native(1)),
            (1, OrderId::Unordered),
            (2, OrderId::Native(0)),
        ]
    );
    let positions: Vec<Option<usize>> = ordered.iter().map(|r| r.reading_order).collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2), Some(3)]);
}
