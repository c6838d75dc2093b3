//! Text extraction for visual element crops.
//!
//! Visual regions (tables, formulas, captions) carry no text of their own. Their
//! crops are sent to a [`CropTextExtractor`] with a bounded retry; a table whose
//! crop still yields nothing gets exactly one [`TableOcr`] attempt. Figures are
//! saved as PNG crops instead.
//!
//! Failures never remove an element: it is kept with empty text and flagged.

use std::path::Path;
use std::time::Duration;

use image::DynamicImage;

use crate::detectors::{CropTextExtractor, TableOcr};
use crate::elements::{DocumentElementRecord, RecordFlags};
use crate::error::{Error, Result};
use crate::geometry::BoundingBox;
use crate::pipeline::config::ExtractionConfig;

/// Per-run extraction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExtractionStats {
    /// Crops sent to the text extractor
    pub attempted: usize,
    /// Crops that produced text
    pub succeeded: usize,
    /// Total extractor calls, retries included
    pub calls: usize,
    /// Tables recovered by the OCR fallback
    pub ocr_fallbacks: usize,
    /// Elements kept without text
    pub failed: usize,
    /// Figure crops written to disk
    pub images_saved: usize,
}

impl ExtractionStats {
    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: ExtractionStats) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.calls += other.calls;
        self.ocr_fallbacks += other.ocr_fallbacks;
        self.failed += other.failed;
        self.images_saved += other.images_saved;
    }
}

/// Crop the pixels under `bbox` from a page image rendered at `zoom`.
///
/// The pixel rectangle is widened to whole pixels and clamped to the image.
pub fn crop_region(page_image: &DynamicImage, bbox: &BoundingBox, zoom: f32) -> Result<DynamicImage> {
    let (img_w, img_h) = (page_image.width(), page_image.height());
    let x1 = ((bbox.x1 * zoom).floor().max(0.0) as u32).min(img_w);
    let y1 = ((bbox.y1 * zoom).floor().max(0.0) as u32).min(img_h);
    let x2 = ((bbox.x2 * zoom).ceil().max(0.0) as u32).min(img_w);
    let y2 = ((bbox.y2 * zoom).ceil().max(0.0) as u32).min(img_h);

    if x2 <= x1 || y2 <= y1 {
        return Err(Error::DegenerateGeometry {
            page: bbox.page,
            reason: format!(
                "crop ({}, {})-({}, {}) is empty in a {}x{} image",
                x1, y1, x2, y2, img_w, img_h
            ),
        });
    }

    Ok(page_image.crop_imm(x1, y1, x2 - x1, y2 - y1))
}

/// Call `extractor` on `crop` up to `config.max_attempts` times.
///
/// An empty or whitespace-only result counts as a failure. Returns the text and
/// the number of calls made.
pub fn extract_with_retry(
    extractor: &dyn CropTextExtractor,
    crop: &DynamicImage,
    config: &ExtractionConfig,
) -> (Result<String>, u32) {
    let attempts = config.max_attempts.max(1);
    let mut reason = String::new();

    for attempt in 1..=attempts {
        match extractor.extract_text(crop) {
            Ok(text) if !text.trim().is_empty() => return (Ok(text), attempt),
            Ok(_) => reason = "empty result".to_string(),
            Err(e) => reason = e.to_string(),
        }
        log::warn!("Crop extraction attempt {}/{} failed: {}", attempt, attempts, reason);
        if attempt < attempts && config.retry_delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(config.retry_delay_ms));
        }
    }

    (Err(Error::ExtractionFailure { attempts, reason }), attempts)
}

/// Runs crop extraction over the records of one page.
pub struct CropProcessor<'a> {
    text_extractor: Option<&'a dyn CropTextExtractor>,
    table_ocr: Option<&'a dyn TableOcr>,
    config: &'a ExtractionConfig,
    zoom: f32,
}

impl<'a> CropProcessor<'a> {
    /// Create a processor for crops of pages rendered at `zoom`.
    pub fn new(config: &'a ExtractionConfig, zoom: f32) -> Self {
        Self {
            text_extractor: None,
            table_ocr: None,
            config,
            zoom,
        }
    }

    /// Set the text-from-image collaborator.
    pub fn with_text_extractor(mut self, extractor: Option<&'a dyn CropTextExtractor>) -> Self {
        self.text_extractor = extractor;
        self
    }

    /// Set the table OCR fallback.
    pub fn with_table_ocr(mut self, ocr: Option<&'a dyn TableOcr>) -> Self {
        self.table_ocr = ocr;
        self
    }

    /// Check if a record needs its text extracted from a crop.
    pub fn needs_text(record: &DocumentElementRecord) -> bool {
        record.is_visual()
            && !record.element_type.is_image()
            && record.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }

    /// Check if any record of a page needs the rendered page image.
    pub fn has_work(&self, records: &[DocumentElementRecord]) -> bool {
        records.iter().any(|r| {
            if r.is_visual() && r.element_type.is_image() {
                self.config.image_output_dir.is_some()
            } else {
                self.text_extractor.is_some() && Self::needs_text(r)
            }
        })
    }

    /// Flag every record still waiting for text when its page image is unavailable.
    pub fn fail_page(&self, records: &mut [DocumentElementRecord]) -> ExtractionStats {
        let mut stats = ExtractionStats::default();
        if self.text_extractor.is_none() {
            return stats;
        }
        for record in records.iter_mut().filter(|r| Self::needs_text(r)) {
            record.text = Some(String::new());
            record.flags |= RecordFlags::EXTRACTION_FAILED;
            stats.failed += 1;
        }
        stats
    }

    /// Process every record of one page, in order.
    ///
    /// Figures are numbered from 1 per page in the order they are met.
    pub fn process_page(
        &self,
        records: &mut [DocumentElementRecord],
        page_image: &DynamicImage,
    ) -> ExtractionStats {
        let mut stats = ExtractionStats::default();
        let mut figure_number = 0;

        for record in records.iter_mut() {
            if record.is_visual() && record.element_type.is_image() {
                figure_number += 1;
                if self.save_figure(record, page_image, figure_number) {
                    stats.images_saved += 1;
                }
            } else if Self::needs_text(record) {
                self.extract_record(record, page_image, &mut stats);
            }
        }

        stats
    }

    fn extract_record(
        &self,
        record: &mut DocumentElementRecord,
        page_image: &DynamicImage,
        stats: &mut ExtractionStats,
    ) {
        let Some(extractor) = self.text_extractor else {
            return;
        };

        let crop = match crop_region(page_image, &record.bounding_box, self.zoom) {
            Ok(crop) => crop,
            Err(e) => {
                log::debug!("Skipping crop for {:?}: {}", record.element_type, e);
                record.text = Some(String::new());
                record.flags |= RecordFlags::EXTRACTION_FAILED;
                stats.failed += 1;
                return;
            },
        };

        stats.attempted += 1;
        let (result, calls) = extract_with_retry(extractor, &crop, self.config);
        stats.calls += calls as usize;

        let err = match result {
            Ok(text) => {
                record.text = Some(text);
                stats.succeeded += 1;
                return;
            },
            Err(e) => e,
        };

        if record.element_type.is_table() && self.config.table_ocr_fallback {
            if let Some(ocr) = self.table_ocr {
                match ocr.ocr(&crop) {
                    Ok(text) if !text.trim().is_empty() => {
                        log::info!("Page {}: table recovered by OCR fallback", record.page);
                        record.text = Some(text);
                        record.flags |= RecordFlags::OCR_FALLBACK;
                        stats.ocr_fallbacks += 1;
                        return;
                    },
                    Ok(_) => log::warn!("Page {}: table OCR returned nothing", record.page),
                    Err(e) => log::warn!("Page {}: table OCR failed: {}", record.page, e),
                }
            }
        }

        log::warn!("Page {}: keeping {:?} without text ({})", record.page, record.element_type, err);
        record.text = Some(String::new());
        record.flags |= RecordFlags::EXTRACTION_FAILED;
        stats.failed += 1;
    }

    fn save_figure(
        &self,
        record: &mut DocumentElementRecord,
        page_image: &DynamicImage,
        figure_number: usize,
    ) -> bool {
        let Some(dir) = self.config.image_output_dir.as_ref() else {
            return false;
        };

        let path = dir.join(format!("page{}_img{}.png", record.page, figure_number));
        match self.write_crop(page_image, &record.bounding_box, &path) {
            Ok(()) => {
                log::debug!("Saved figure crop to {}", path.display());
                record.image_path = Some(path);
                true
            },
            Err(e) => {
                log::warn!("Page {}: could not save figure {}: {}", record.page, figure_number, e);
                false
            },
        }
    }

    fn write_crop(&self, page_image: &DynamicImage, bbox: &BoundingBox, path: &Path) -> Result<()> {
        let crop = crop_region(page_image, bbox, self.zoom)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        crop.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
