//! Column-aware reading order strategy.

use crate::elements::DocumentElementRecord;
use crate::error::Result;
use crate::utils::safe_float_cmp;

use super::{assign_sequence, ReadingOrderContext, ReadingOrderStrategy};

/// Column-first reading order for documents without native order ids.
///
/// Within each page, records are assigned to the column containing their center
/// (or the nearest one when the center sits in a gutter). Columns are read left
/// to right, each from top to bottom.
///
/// Without a column layout in the context every record falls into one column,
/// which degrades to plain top-to-bottom order.
pub struct ColumnOrderStrategy;

impl ReadingOrderStrategy for ColumnOrderStrategy {
    fn apply(
        &self,
        records: Vec<DocumentElementRecord>,
        context: &ReadingOrderContext,
    ) -> Result<Vec<DocumentElementRecord>> {
        let mut keyed: Vec<(usize, DocumentElementRecord)> = records
            .into_iter()
            .map(|record| {
                let column = context
                    .columns
                    .as_ref()
                    .map(|layout| {
                        layout.column_index(record.center().x, record.page_dimensions.width_points)
                    })
                    .unwrap_or(0);
                (column, record)
            })
            .collect();

        keyed.sort_by(|(col_a, a), (col_b, b)| {
            a.page
                .cmp(&b.page)
                .then(col_a.cmp(col_b))
                .then_with(|| safe_float_cmp(a.bounding_box.y1, b.bounding_box.y1))
                .then(a.detection_index.cmp(&b.detection_index))
        });

        let mut ordered: Vec<DocumentElementRecord> =
            keyed.into_iter().map(|(_, record)| record).collect();
        assign_sequence(&mut ordered);

        log::debug!(
            "Column order over {} records ({} column(s))",
            ordered.len(),
            context.columns.as_ref().map_or(1, |c| c.len())
        );
        Ok(ordered)
    }

    fn name(&self) -> &'static str {
        "ColumnOrderStrategy"
    }
}
