//! The typed element table handed to rendering.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elements::DocumentElementRecord;
use crate::error::Result;
use crate::layout::{ColumnLayout, DocumentLayout, FilterSummary, MarginSizes, ReconcileSummary};
use crate::pipeline::config::MarginConfig;
use crate::pipeline::extraction::ExtractionStats;

/// A page that lost some or all of its elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFailure {
    /// Page number (1-based)
    pub page: u32,
    /// Which detector's output was lost (`structured`, `visual`, or `page`)
    pub stage: String,
    /// Error message
    pub reason: String,
}

/// Audit counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Pages in the document
    pub pages: usize,
    /// Page-scoped failures; the rest of the document was still processed
    pub failed_pages: Vec<PageFailure>,
    /// Raw elements dropped during normalization
    pub skipped: usize,
    /// Overlap reconciliation counters
    pub reconcile: ReconcileSummary,
    /// Margin filter counters
    pub filter: FilterSummary,
    /// Crop extraction counters
    pub extraction: ExtractionStats,
    /// Reading order strategy that produced the final order
    pub strategy: String,
}

impl PipelineReport {
    /// Check if any page failed.
    pub fn has_failures(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

/// Reconciled elements of a document in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTable {
    /// Records in reading order
    pub records: Vec<DocumentElementRecord>,
    /// Document-wide margins
    pub margins: MarginSizes,
    /// Document-wide columns
    pub columns: ColumnLayout,
    /// What happened along the way
    pub report: PipelineReport,
}

impl Default for ElementTable {
    fn default() -> Self {
        let layout = DocumentLayout::empty(&MarginConfig::default());
        Self {
            records: Vec::new(),
            margins: layout.margins,
            columns: layout.columns,
            report: PipelineReport::default(),
        }
    }
}

impl ElementTable {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records grouped by page, in reading order.
    pub fn pages(&self) -> Vec<(u32, &[DocumentElementRecord])> {
        self.records
            .chunk_by(|a, b| a.page == b.page)
            .filter_map(|chunk| chunk.first().map(|first| (first.page, chunk)))
            .collect()
    }

    /// Records of one page, in reading order.
    pub fn page(&self, page: u32) -> impl Iterator<Item = &DocumentElementRecord> {
        self.records.iter().filter(move |r| r.page == page)
    }

    /// Text of every record in reading order, one element per paragraph.
    pub fn plain_text(&self) -> String {
        self.records
            .iter()
            .map(|r| r.text_or_empty().trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the table as JSON to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
