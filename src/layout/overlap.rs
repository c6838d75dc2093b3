//! Cross-detector overlap reconciliation.
//!
//! When the visual detector reports a region (a table, a figure, a formula) that
//! the structured extractor also covered with paragraphs, the paragraphs are
//! duplicates: the visual region is kept and the paragraphs are removed. The
//! visual region inherits the earliest native order id of anything it subsumes,
//! so it lands where the extractor would have placed that content.
//!
//! Only structured records are ever removed. Surviving records only change by
//! the order id transfer, and a structured table also takes over the text of
//! the cell paragraphs it absorbs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::{DocumentElementRecord, ElementType};
use crate::geometry::mutual_overlap;
use crate::pipeline::config::OverlapConfig;

/// Counts reported by a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// Records examined
    pub examined: usize,
    /// Structured records removed as duplicates
    pub removed: usize,
    /// Order ids that moved onto a surviving record
    pub transfers: usize,
}

impl ReconcileSummary {
    /// Add another summary's counts to this one.
    pub fn merge(&mut self, other: ReconcileSummary) {
        self.examined += other.examined;
        self.removed += other.removed;
        self.transfers += other.transfers;
    }
}

/// Stable sort by `(page, order_id, detection_index)`.
///
/// Idempotent: sorting an already sorted slice leaves it unchanged.
pub fn sort_by_page_and_order(records: &mut [DocumentElementRecord]) {
    records.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.order_id.cmp(&b.order_id))
            .then(a.detection_index.cmp(&b.detection_index))
    });
}

/// Remove structured paragraphs whose spans all lie inside a structured table.
///
/// Such paragraphs are the table's own cell text. The table adopts the smallest
/// order id among the paragraphs it absorbs, and their content, in span order and
/// one paragraph per line, becomes the table's text.
pub fn suppress_table_paragraphs(records: &mut Vec<DocumentElementRecord>) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    let tables: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_structured() && r.element_type.is_table())
        .filter(|(_, r)| !r.spans.is_empty())
        .map(|(i, _)| i)
        .collect();
    if tables.is_empty() {
        return summary;
    }

    let mut remove = vec![false; records.len()];
    // (table index, first span offset, cell text)
    let mut cells: Vec<(usize, usize, String)> = Vec::new();
    for idx in 0..records.len() {
        let record = &records[idx];
        if !record.is_structured() || record.element_type != ElementType::Text {
            continue;
        }
        if record.spans.is_empty() {
            continue;
        }
        let owner = tables.iter().copied().find(|&t| {
            records[t].page == record.page
                && record
                    .spans
                    .iter()
                    .all(|s| records[t].spans.iter().any(|ts| ts.contains(s)))
        });
        if let Some(t) = owner {
            let order = record.order_id;
            let offset = record.spans.iter().map(|s| s.offset).min().unwrap_or(0);
            if let Some(text) = record.text.as_deref().filter(|s| !s.trim().is_empty()) {
                cells.push((t, offset, text.to_string()));
            }
            remove[idx] = true;
            if records[t].adopt_order(order) {
                summary.transfers += 1;
            }
        }
    }

    cells.sort_by_key(|(t, offset, _)| (*t, *offset));
    for &t in &tables {
        let text: Vec<&str> = cells
            .iter()
            .filter(|(owner, ..)| *owner == t)
            .map(|(_, _, text)| text.as_str())
            .collect();
        if text.is_empty() {
            continue;
        }
        let joined = text.join("\n");
        records[t].text = Some(match records[t].text.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{}\n{}", existing, joined),
            _ => joined,
        });
    }

    summary.examined = records.len();
    let mut keep = remove.iter().map(|r| !r);
    records.retain(|_| keep.next().unwrap_or(true));
    summary.removed = remove.iter().filter(|r| **r).count();
    if summary.removed > 0 {
        log::debug!(
            "Suppressed {} structured paragraphs contained in table spans",
            summary.removed
        );
    }
    summary
}

/// Reconcile the records of a single page.
///
/// Every (structured, visual) pair whose mutual overlap exceeds the threshold marks
/// the structured record for removal; the visual record adopts the structured order
/// id when it is strictly smaller than its own. Surviving structured records and
/// all visual records are returned sorted by `(page, order_id)`.
pub fn reconcile_page(
    mut records: Vec<DocumentElementRecord>,
    config: &OverlapConfig,
) -> (Vec<DocumentElementRecord>, ReconcileSummary) {
    let mut summary = ReconcileSummary::default();
    if config.suppress_table_paragraphs {
        summary.merge(suppress_table_paragraphs(&mut records));
    }

    let (mut structured, mut visual): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|r| r.is_structured());

    let mut remove = vec![false; structured.len()];
    for (si, s) in structured.iter().enumerate() {
        for v in visual.iter_mut() {
            let ratio = mutual_overlap(&s.bounding_box, &v.bounding_box);
            if ratio > config.threshold {
                remove[si] = true;
                if v.adopt_order(s.order_id) {
                    summary.transfers += 1;
                }
                log::trace!(
                    "Page {}: structured #{} covered by {:?} (overlap {:.2})",
                    s.page,
                    s.detection_index,
                    v.element_type,
                    ratio
                );
            }
        }
    }

    summary.examined += structured.len() + visual.len();
    let removed = remove.iter().filter(|r| **r).count();
    summary.removed += removed;

    let mut keep = remove.into_iter().map(|r| !r);
    structured.retain(|_| keep.next().unwrap_or(true));
    structured.append(&mut visual);
    sort_by_page_and_order(&mut structured);
    (structured, summary)
}

/// Reconcile a whole document, page by page, and sort the result globally.
pub fn reconcile(
    records: Vec<DocumentElementRecord>,
    config: &OverlapConfig,
) -> (Vec<DocumentElementRecord>, ReconcileSummary) {
    let mut by_page: BTreeMap<u32, Vec<DocumentElementRecord>> = BTreeMap::new();
    for record in records {
        by_page.entry(record.page).or_default().push(record);
    }

    let mut summary = ReconcileSummary::default();
    let mut out = Vec::new();
    for (_, page_records) in by_page {
        let (kept, page_summary) = reconcile_page(page_records, config);
        summary.merge(page_summary);
        out.extend(kept);
    }
    sort_by_page_and_order(&mut out);
    (out, summary)
}
