//! Detector-native reading order strategy.

use crate::elements::DocumentElementRecord;
use crate::error::Result;
use crate::layout::sort_by_page_and_order;

use super::{assign_sequence, ReadingOrderContext, ReadingOrderStrategy};

/// Reading order taken from the detector-native order ids.
///
/// Records are stable-sorted by `(page, order_id, detection_index)`. Records
/// without a native id sort after every ordered record of their page, in
/// detection order.
pub struct DetectorOrderStrategy;

impl ReadingOrderStrategy for DetectorOrderStrategy {
    fn apply(
        &self,
        mut records: Vec<DocumentElementRecord>,
        _context: &ReadingOrderContext,
    ) -> Result<Vec<DocumentElementRecord>> {
        sort_by_page_and_order(&mut records);
        assign_sequence(&mut records);
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "DetectorOrderStrategy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementType, OrderId, PageDimensions, Source};
    use crate::geometry::BoundingBox;

    fn make_record(page: u32, order: OrderId, index: usize) -> DocumentElementRecord {
        let bbox = BoundingBox::new(page, 72.0, 72.0, 300.0, 90.0).unwrap();
        DocumentElementRecord::new(
            bbox,
            ElementType::Text,
            Source::StructuredExtractor,
            PageDimensions::from_points(612.0, 792.0),
        )
        .with_order_id(order)
        .with_detection_index(index)
    }

    #[test]
    fn test_native_order_with_unordered_last() {
        let records = vec![
            make_record(2, OrderId::Native(0), 0),
            make_record(1, OrderId::Unordered, 1),
            make_record(1, OrderId::Native(1), 2),
            make_record(1, OrderId::Native(0), 3),
            make_record(1, OrderId::Unordered, 4),
        ];
        let ordered = DetectorOrderStrategy
            .apply(records, &ReadingOrderContext::new())
            .unwrap();

        let indices: Vec<usize> = ordered.iter().map(|r| r.detection_index).collect();
        assert_eq!(indices, vec![3, 2, 1, 4, 0]);
        let positions: Vec<Option<usize>> = ordered.iter().map(|r| r.reading_order).collect();
        assert_eq!(positions, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_equal_order_ids_tie_break_on_detection() {
        let records = vec![
            make_record(1, OrderId::Native(1), 7),
            make_record(1, OrderId::Native(1), 5),
        ];
        let ordered = DetectorOrderStrategy
            .apply(records, &ReadingOrderContext::new())
            .unwrap();
        assert_eq!(ordered[0].detection_index, 5);
    }

    #[test]
    fn test_empty_input() {
        let ordered = DetectorOrderStrategy
            .apply(Vec::new(), &ReadingOrderContext::new())
            .unwrap();
        assert!(ordered.is_empty());
    }
}
