//! Contracts with the external collaborators.
//!
//! The pipeline never talks to a model or a rendering engine directly. Each
//! collaborator is a trait so that production adapters, recorded snapshots
//! ([`recorded::RecordedDocument`]) and test doubles plug in the same way.
//!
//! ```text
//! DocumentSource ──► page geometry, rendered page image
//! StructuredExtractor ──► RawStructuredPage (inches, native order)
//! VisualLayoutDetector ──► RawVisualElement[] (pixels of the rendered image)
//! CropTextExtractor ──► text for a cropped region (may fail)
//! TableOcr ──► best-effort text for a table crop
//! ```

pub mod recorded;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::elements::{PageGeometry, TextSpan};
use crate::error::Result;

/// A region of a structured element on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    /// Page number (1-based)
    pub page_number: u32,
    /// Flat polygon `[x1, y1, x2, y2, ...]` in the page's declared unit
    pub polygon: Vec<f32>,
}

/// A paragraph reported by the structured extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStructuredElement {
    /// Text content
    pub content: String,
    /// Semantic role (`title`, `sectionHeading`, `pageHeader`, ...)
    #[serde(default)]
    pub role: Option<String>,
    /// Regions the paragraph occupies
    pub bounding_regions: Vec<BoundingRegion>,
    /// Character ranges in the extractor's content stream
    #[serde(default)]
    pub spans: Vec<TextSpan>,
}

/// A table reported by the structured extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStructuredTable {
    /// Regions the table occupies
    pub bounding_regions: Vec<BoundingRegion>,
    /// Character ranges covered by the table's cells
    #[serde(default)]
    pub spans: Vec<TextSpan>,
    /// Number of rows
    #[serde(default)]
    pub row_count: usize,
    /// Number of columns
    #[serde(default)]
    pub column_count: usize,
}

/// Everything the structured extractor reports for one page.
///
/// `width`, `height` and `unit` are the extractor's self-reported geometry. Only
/// the unit is trusted; the page size comes from [`DocumentSource::page_geometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStructuredPage {
    /// Page number (1-based)
    pub page_number: u32,
    /// Self-reported width in `unit`
    pub width: f32,
    /// Self-reported height in `unit`
    pub height: f32,
    /// Declared unit (`inch` is the only accepted value)
    pub unit: String,
    /// Paragraphs in native reading order
    #[serde(default)]
    pub paragraphs: Vec<RawStructuredElement>,
    /// Tables in native order
    #[serde(default)]
    pub tables: Vec<RawStructuredTable>,
}

/// A region reported by the visual layout detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVisualElement {
    /// Detector class label
    pub label: String,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f32,
    /// Box `[x1, y1, x2, y2]` in pixels of the rendered page image
    pub box_px: [f32; 4],
}

/// Source of authoritative page geometry and rendered page images.
pub trait DocumentSource: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Authoritative size of a page (1-based), in points.
    fn page_geometry(&self, page: u32) -> Result<PageGeometry>;

    /// Render a page (1-based) at `zoom` times its size in points.
    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage>;
}

/// Structured text-extraction service.
pub trait StructuredExtractor: Send + Sync {
    /// Extract paragraphs and tables of a page (1-based).
    fn extract_page(&self, page: u32) -> Result<RawStructuredPage>;
}

/// Image-based layout detector.
pub trait VisualLayoutDetector: Send + Sync {
    /// Detect regions in the rendered image of a page (1-based).
    fn detect(&self, page: u32, page_image: &DynamicImage) -> Result<Vec<RawVisualElement>>;
}

/// Text-from-image service used for visual element crops.
pub trait CropTextExtractor: Send + Sync {
    /// Extract text from a cropped region. May fail transiently.
    fn extract_text(&self, crop: &DynamicImage) -> Result<String>;
}

/// Best-effort OCR used only for table crops once the primary extractor gave up.
pub trait TableOcr: Send + Sync {
    /// Recognize text in a table crop.
    fn ocr(&self, crop: &DynamicImage) -> Result<String>;
}
