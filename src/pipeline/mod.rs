//! Element reconciliation pipeline with clean phase boundaries.
//!
//! This module drives a document through both detectors and reconciles their
//! output into one typed element table:
//!
//! ```text
//! DocumentSource (page geometry, page images)
//!     ↓
//! Phase A, per page: [StructuredExtractor] + [VisualLayoutDetector] → normalize
//!     ↓
//! Phase B, per page: overlap reconciliation (order id transfer)
//!     ↓
//! Phase C, barrier:  document-wide margins + columns
//!     ↓
//! Phase D, per page: margin filter → [ReadingOrderStrategy] → crop extraction
//!     ↓
//! ElementTable
//! ```
//!
//! # Key Design Principles
//!
//! 1. **Single record type**: [`DocumentElementRecord`] is the only representation
//!    between detector adapters and the element table.
//!
//! 2. **Page-scoped failures**: a page whose detector fails loses only that
//!    detector's elements; the failure is listed in [`PipelineReport::failed_pages`].
//!    Errors that are not [page scoped](Error::is_page_scoped) abort the run.
//!
//! Page images are not held across the barrier. Phase D renders a page again
//! only when one of its records needs a crop.
//!
//! 3. **One barrier**: pages are independent except for margin and column
//!    inference, which needs every page at once.
//!
//! 4. **Unified Configuration**: All settings in [`PipelineConfig`].

pub mod config;
pub mod extraction;
pub mod reading_order;
pub mod table;

// Re-export main types
pub use config::{
    ColumnConfig, ExtractionConfig, LogLevel, MarginConfig, NormalizationConfig, OverlapConfig,
    PipelineConfig, ReadingOrderConfig, ReadingOrderStrategyType, VisualTextPolicy,
};
pub use extraction::{crop_region, extract_with_retry, CropProcessor, ExtractionStats};
pub use reading_order::{
    create_strategy, ColumnOrderStrategy, DetectorOrderStrategy, ReadingOrderContext,
    ReadingOrderStrategy,
};
pub use table::{ElementTable, PageFailure, PipelineReport};

use std::sync::Arc;

use rayon::prelude::*;

use crate::detectors::{
    CropTextExtractor, DocumentSource, StructuredExtractor, TableOcr, VisualLayoutDetector,
};
use crate::elements::{DocumentElementRecord, PageGeometry};
use crate::error::{Error, Result};
use crate::layout::{
    filter_margins, infer_layout, normalize_structured_page, normalize_visual_page,
    reconcile_page, FilterSummary, NormalizedPage, ReconcileSummary,
};

/// Everything Phase A produced for one page.
struct PageOutput {
    page: u32,
    records: Vec<DocumentElementRecord>,
    failures: Vec<PageFailure>,
    skipped: usize,
}

impl PageOutput {
    fn new(page: u32) -> Self {
        Self {
            page,
            records: Vec::new(),
            failures: Vec::new(),
            skipped: 0,
        }
    }

    /// Record a page-scoped error as a failure; anything else is returned.
    fn fail(&mut self, stage: &str, error: Error) -> Result<()> {
        if !error.is_page_scoped() {
            return Err(error);
        }
        log::warn!("Page {}: {} output dropped: {}", self.page, stage, error);
        self.failures.push(PageFailure {
            page: self.page,
            stage: stage.to_string(),
            reason: error.to_string(),
        });
        Ok(())
    }
}

/// The reconciliation pipeline - orchestrates the full flow.
///
/// Built with [`ElementPipeline::builder`]. At least one of the two detectors
/// must be present.
pub struct ElementPipeline {
    config: PipelineConfig,
    source: Arc<dyn DocumentSource>,
    structured: Option<Arc<dyn StructuredExtractor>>,
    visual: Option<Arc<dyn VisualLayoutDetector>>,
    crop_text: Option<Arc<dyn CropTextExtractor>>,
    table_ocr: Option<Arc<dyn TableOcr>>,
}

impl ElementPipeline {
    /// Start building a pipeline over `source`.
    pub fn builder(source: Arc<dyn DocumentSource>) -> ElementPipelineBuilder {
        ElementPipelineBuilder::new(source)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check if a structured extractor participates (hybrid mode).
    pub fn is_hybrid(&self) -> bool {
        self.structured.is_some() && self.visual.is_some()
    }

    /// Run every phase over the whole document.
    ///
    /// Page- and element-scoped errors are logged and reported in
    /// [`ElementTable::report`]; any other error fails the run.
    pub fn process(&self) -> Result<ElementTable> {
        if self.config.max_threads == 0 {
            return self.run();
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_threads)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot build thread pool: {}", e)))?;
        pool.install(|| self.run())
    }

    fn run(&self) -> Result<ElementTable> {
        let page_count = self.source.page_count();
        log::info!(
            "Processing {} page(s) ({})",
            page_count,
            match (self.structured.is_some(), self.visual.is_some()) {
                (true, true) => "hybrid",
                (true, false) => "structured only",
                _ => "visual only",
            }
        );

        // Phase A: detection and normalization
        let mut pages: Vec<PageOutput> = (1..=page_count as u32)
            .into_par_iter()
            .map(|page| self.detect_page(page))
            .collect::<Result<_>>()?;

        let mut report = PipelineReport {
            pages: page_count,
            ..PipelineReport::default()
        };
        let mut detection_index = 0;
        for page in pages.iter_mut() {
            for record in page.records.iter_mut() {
                record.detection_index = detection_index;
                detection_index += 1;
            }
            report.skipped += page.skipped;
            report.failed_pages.append(&mut page.failures);
        }
        log::debug!("Phase A produced {} records", detection_index);

        // Phase B: overlap reconciliation
        let overlap = &self.config.overlap;
        let summaries: Vec<ReconcileSummary> = pages
            .par_iter_mut()
            .map(|page| {
                let (kept, summary) = reconcile_page(std::mem::take(&mut page.records), overlap);
                page.records = kept;
                summary
            })
            .collect();
        for summary in summaries {
            report.reconcile.merge(summary);
        }
        log::info!(
            "Overlap reconciliation: {} removed, {} order transfers",
            report.reconcile.removed,
            report.reconcile.transfers
        );

        // Phase C: the only barrier
        let all: Vec<DocumentElementRecord> =
            pages.iter_mut().flat_map(|p| std::mem::take(&mut p.records)).collect();
        let layout = infer_layout(&all, &self.config.margins, &self.config.columns);
        for (page, records) in pages.iter_mut().zip(split_by_page(all, page_count)) {
            page.records = records;
        }

        // Phase D: filter, order, extract
        let margin_config = &self.config.margins;
        let filters: Vec<FilterSummary> = pages
            .par_iter_mut()
            .map(|page| {
                let (kept, summary) =
                    filter_margins(std::mem::take(&mut page.records), &layout, margin_config);
                page.records = kept;
                summary
            })
            .collect();
        for summary in filters {
            report.filter.processed += summary.processed;
            report.filter.removed += summary.removed;
        }
        log::info!(
            "Margin filter: {} processed, {} removed",
            report.filter.processed,
            report.filter.removed
        );

        let context = ReadingOrderContext::new()
            .with_columns(layout.columns.clone())
            .with_structured(self.structured.is_some());
        let strategy = create_strategy(&self.config.reading_order, &context);
        report.strategy = strategy.name().to_string();
        let remaining: Vec<DocumentElementRecord> =
            pages.iter_mut().flat_map(|p| std::mem::take(&mut p.records)).collect();
        let ordered = strategy.apply(remaining, &context)?;

        let mut groups = split_by_page(ordered, page_count);

        let processor = CropProcessor::new(&self.config.extraction, self.config.normalization.zoom)
            .with_text_extractor(self.crop_text.as_deref())
            .with_table_ocr(self.table_ocr.as_deref());
        let outcomes: Vec<(ExtractionStats, Option<PageFailure>)> = groups
            .par_iter_mut()
            .map(|records| self.extract_page(&processor, records))
            .collect();
        for (stats, failure) in outcomes {
            report.extraction.merge(stats);
            report.failed_pages.extend(failure);
        }

        let records: Vec<DocumentElementRecord> = groups.into_iter().flatten().collect();
        log::info!(
            "Assembled {} records with {} ({} extraction failure(s), {} page failure(s))",
            records.len(),
            report.strategy,
            report.extraction.failed,
            report.failed_pages.len()
        );

        Ok(ElementTable {
            records,
            margins: layout.margins,
            columns: layout.columns,
            report,
        })
    }

    fn detect_page(&self, page: u32) -> Result<PageOutput> {
        let mut out = PageOutput::new(page);

        let geometry = match self.source.page_geometry(page) {
            Ok(g) if g.is_valid() => g,
            Ok(g) => {
                let error = Error::DegenerateGeometry {
                    page,
                    reason: format!("page size {}x{}", g.width_points, g.height_points),
                };
                out.fail("page", error)?;
                return Ok(out);
            },
            Err(e) => {
                out.fail("page", e)?;
                return Ok(out);
            },
        };

        if let Some(extractor) = &self.structured {
            let normalized = extractor.extract_page(page).and_then(|raw| {
                normalize_structured_page(&raw, page, geometry, &self.config.normalization)
            });
            match normalized {
                Ok(normalized) => {
                    out.skipped += normalized.skipped;
                    out.records.extend(normalized.records);
                },
                Err(e) => out.fail("structured", e)?,
            }
        }

        if let Some(detector) = &self.visual {
            match self.detect_visual(detector.as_ref(), page, geometry) {
                Ok(normalized) => {
                    out.skipped += normalized.skipped;
                    out.records.extend(normalized.records);
                },
                Err(e) => out.fail("visual", e)?,
            }
        }

        log::debug!("Page {}: {} records after normalization", page, out.records.len());
        Ok(out)
    }

    fn detect_visual(
        &self,
        detector: &dyn VisualLayoutDetector,
        page: u32,
        geometry: PageGeometry,
    ) -> Result<NormalizedPage> {
        let normalization = &self.config.normalization;
        let image = self.source.render_page(page, normalization.zoom)?;
        let raw = detector.detect(page, &image)?;
        let keep_text = match normalization.visual_text_policy {
            VisualTextPolicy::All => true,
            VisualTextPolicy::NonTextOnly => false,
            VisualTextPolicy::Auto => self.structured.is_none(),
        };
        normalize_visual_page(&raw, page, geometry, normalization, keep_text)
    }

    /// Render one page again and run crop extraction over its ordered records.
    ///
    /// A page that cannot be rendered keeps its records; those waiting for text
    /// are flagged and the page is reported.
    fn extract_page(
        &self,
        processor: &CropProcessor<'_>,
        records: &mut [DocumentElementRecord],
    ) -> (ExtractionStats, Option<PageFailure>) {
        let Some(page) = records.first().map(|r| r.page) else {
            return (ExtractionStats::default(), None);
        };
        if !processor.has_work(records) {
            return (ExtractionStats::default(), None);
        }

        match self.source.render_page(page, self.config.normalization.zoom) {
            Ok(image) => (processor.process_page(records, &image), None),
            Err(e) => {
                log::warn!("Page {}: cannot render page for crop extraction: {}", page, e);
                let failure = PageFailure {
                    page,
                    stage: "extraction".to_string(),
                    reason: e.to_string(),
                };
                (processor.fail_page(records), Some(failure))
            },
        }
    }
}

/// Split page-sorted records into one vector per page `1..=page_count`.
fn split_by_page(records: Vec<DocumentElementRecord>, page_count: usize) -> Vec<Vec<DocumentElementRecord>> {
    let mut groups: Vec<Vec<DocumentElementRecord>> = (0..page_count).map(|_| Vec::new()).collect();
    for record in records {
        let idx = (record.page as usize).saturating_sub(1);
        if idx >= groups.len() {
            groups.resize_with(idx + 1, Vec::new);
        }
        groups[idx].push(record);
    }
    groups
}

/// Builder for [`ElementPipeline`].
pub struct ElementPipelineBuilder {
    config: PipelineConfig,
    source: Arc<dyn DocumentSource>,
    structured: Option<Arc<dyn StructuredExtractor>>,
    visual: Option<Arc<dyn VisualLayoutDetector>>,
    crop_text: Option<Arc<dyn CropTextExtractor>>,
    table_ocr: Option<Arc<dyn TableOcr>>,
}

impl ElementPipelineBuilder {
    /// Create a builder with default configuration and no detectors.
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            config: PipelineConfig::default(),
            source,
            structured: None,
            visual: None,
            crop_text: None,
            table_ocr: None,
        }
    }

    /// Use a custom configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Add the structured extractor.
    pub fn structured_extractor(mut self, extractor: Arc<dyn StructuredExtractor>) -> Self {
        self.structured = Some(extractor);
        self
    }

    /// Add the visual layout detector.
    pub fn visual_detector(mut self, detector: Arc<dyn VisualLayoutDetector>) -> Self {
        self.visual = Some(detector);
        self
    }

    /// Add the text-from-crop collaborator.
    pub fn crop_text_extractor(mut self, extractor: Arc<dyn CropTextExtractor>) -> Self {
        self.crop_text = Some(extractor);
        self
    }

    /// Add the table OCR fallback.
    pub fn table_ocr(mut self, ocr: Arc<dyn TableOcr>) -> Self {
        self.table_ocr = Some(ocr);
        self
    }

    /// Validate the configuration and build the pipeline.
    pub fn build(self) -> Result<ElementPipeline> {
        self.config.validate()?;
        if self.structured.is_none() && self.visual.is_none() {
            return Err(Error::InvalidConfig(
                "at least one detector (structured or visual) is required".to_string(),
            ));
        }

        Ok(ElementPipeline {
            config: self.config,
            source: self.source,
            structured: self.structured,
            visual: self.visual,
            crop_text: self.crop_text,
            table_ocr: self.table_ocr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::recorded::RecordedDocument;
    use crate::elements::{ElementType, OrderId};

    const ONE_PAGE: &str = r#"{
        "pages": [{
            "page_number": 1,
            "geometry": { "width_points": 612.0, "height_points": 792.0 },
            "structured": {
                "page_number": 1, "width": 8.5, "height": 11.0, "unit": "inch",
                "paragraphs": [
                    { "content": "Heading", "role": "sectionHeading",
                      "bounding_regions": [{ "page_number": 1, "polygon": [1.0, 1.5, 7.5, 1.5, 7.5, 2.0, 1.0, 2.0] }] },
                    { "content": "Body", "bounding_regions": [{ "page_number": 1, "polygon": [1.0, 2.5, 7.5, 2.5, 7.5, 4.0, 1.0, 4.0] }] }
                ]
            },
            "visual": [
                { "label": "figure", "confidence": 0.9, "box_px": [216.0, 1080.0, 1620.0, 1944.0] }
            ]
        }]
    }"#;

    fn recorded() -> Arc<RecordedDocument> {
        Arc::new(RecordedDocument::from_json(ONE_PAGE).unwrap())
    }

    #[test]
    fn test_requires_a_detector() {
        let result = ElementPipeline::builder(recorded()).build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let doc = recorded();
        let result = ElementPipeline::builder(doc.clone())
            .visual_detector(doc)
            .config(PipelineConfig::default().with_zoom(0.0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_hybrid_single_page() {
        let doc = recorded();
        let pipeline = ElementPipeline::builder(doc.clone())
            .structured_extractor(doc.clone())
            .visual_detector(doc)
            .build()
            .unwrap();
        assert!(pipeline.is_hybrid());

        let table = pipeline.process().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.report.strategy, "DetectorOrderStrategy");
        assert_eq!(table.records[0].text.as_deref(), Some("Heading"));
        assert_eq!(table.records[1].order_id, OrderId::Native(1));
        assert_eq!(table.records[2].element_type, ElementType::Image);
        let positions: Vec<Option<usize>> = table.records.iter().map(|r| r.reading_order).collect();
        assert_eq!(positions, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_dedicated_thread_pool() {
        let doc = recorded();
        let pipeline = ElementPipeline::builder(doc.clone())
            .visual_detector(doc)
            .config(PipelineConfig::default().with_max_threads(2))
            .build()
            .unwrap();
        let table = pipeline.process().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.report.strategy, "ColumnOrderStrategy");
    }

    #[test]
    fn test_split_by_page() {
        let groups = split_by_page(Vec::new(), 3);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.is_empty()));
    }
}
