//! Recorded detector output.
//!
//! A [`RecordedDocument`] is a JSON snapshot of what both detectors reported for a
//! document, plus the authoritative page sizes. It implements the collaborator
//! traits so the pipeline can be replayed without a renderer or a model.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::{
    DocumentSource, RawStructuredPage, RawVisualElement, StructuredExtractor,
    VisualLayoutDetector,
};
use crate::elements::PageGeometry;
use crate::error::{Error, Result};

/// Recorded detector output for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPage {
    /// Page number (1-based)
    pub page_number: u32,
    /// Authoritative page size in points
    pub geometry: PageGeometry,
    /// Structured extractor output, if it ran
    #[serde(default)]
    pub structured: Option<RawStructuredPage>,
    /// Visual detector output, if it ran
    #[serde(default)]
    pub visual: Option<Vec<RawVisualElement>>,
}

/// Recorded detector output for a whole document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordedDocument {
    /// Pages in document order
    pub pages: Vec<RecordedPage>,
}

impl RecordedDocument {
    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check if any page carries structured extractor output.
    pub fn has_structured(&self) -> bool {
        self.pages.iter().any(|p| p.structured.is_some())
    }

    /// Check if any page carries visual detector output.
    pub fn has_visual(&self) -> bool {
        self.pages.iter().any(|p| p.visual.is_some())
    }

    fn page(&self, page: u32) -> Result<&RecordedPage> {
        self.pages
            .iter()
            .find(|p| p.page_number == page)
            .ok_or_else(|| Error::Collaborator(format!("page {} not recorded", page)))
    }
}

impl DocumentSource for RecordedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_geometry(&self, page: u32) -> Result<PageGeometry> {
        Ok(self.page(page)?.geometry)
    }

    /// Recorded snapshots carry no pixels; a blank page of the right size stands in.
    fn render_page(&self, page: u32, zoom: f32) -> Result<DynamicImage> {
        let geometry = self.page_geometry(page)?;
        let width = (geometry.width_points * zoom).ceil().max(1.0) as u32;
        let height = (geometry.height_points * zoom).ceil().max(1.0) as u32;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb([255, 255, 255]),
        )))
    }
}

impl StructuredExtractor for RecordedDocument {
    fn extract_page(&self, page: u32) -> Result<RawStructuredPage> {
        self.page(page)?.structured.clone().ok_or_else(|| {
            Error::Collaborator(format!("no structured output recorded for page {}", page))
        })
    }
}

impl VisualLayoutDetector for RecordedDocument {
    fn detect(&self, page: u32, _page_image: &DynamicImage) -> Result<Vec<RawVisualElement>> {
        self.page(page)?.visual.clone().ok_or_else(|| {
            Error::Collaborator(format!("no visual output recorded for page {}", page))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    const SNAPSHOT: &str = r#"{
        "pages": [
            {
                "page_number": 1,
                "geometry": { "width_points": 612.0, "height_points": 792.0 },
                "structured": {
                    "page_number": 1,
                    "width": 8.5,
                    "height": 11.0,
                    "unit": "inch",
                    "paragraphs": [
                        {
                            "content": "Hello",
                            "bounding_regions": [
                                { "page_number": 1, "polygon": [1.0, 1.0, 3.0, 1.0, 3.0, 1.5, 1.0, 1.5] }
                            ],
                            "spans": [{ "offset": 0, "length": 5 }]
                        }
                    ]
                },
                "visual": [
                    { "label": "figure", "confidence": 0.93, "box_px": [300.0, 600.0, 900.0, 1200.0] }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let doc = RecordedDocument::from_json(SNAPSHOT).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.has_structured());
        assert!(doc.has_visual());

        let structured = doc.extract_page(1).unwrap();
        assert_eq!(structured.paragraphs.len(), 1);
        assert!(structured.tables.is_empty());
        assert_eq!(structured.paragraphs[0].role, None);
    }

    #[test]
    fn test_render_blank_page() {
        let doc = RecordedDocument::from_json(SNAPSHOT).unwrap();
        let image = doc.render_page(1, 0.5).unwrap();
        assert_eq!(image.dimensions(), (306, 396));
    }

    #[test]
    fn test_missing_page_is_collaborator_error() {
        let doc = RecordedDocument::from_json(SNAPSHOT).unwrap();
        assert!(matches!(doc.page_geometry(9), Err(Error::Collaborator(_))));
        let image = doc.render_page(1, 0.1).unwrap();
        assert_eq!(doc.detect(1, &image).unwrap().len(), 1);
        assert!(doc.detect(2, &image).is_err());
    }
}
