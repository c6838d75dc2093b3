//! Typed document elements shared by every stage of the pipeline.
//!
//! ## Design
//!
//! Both detectors are funnelled into a single closed record type,
//! [`DocumentElementRecord`]. Optional attributes (role, confidence, spans, text)
//! are explicit fields rather than a loose metadata bag, and the "no native order"
//! case is an explicit [`OrderId::Unordered`] tag.
//!
//! ## Example
//!
//! ```
//! use layout_fusion::elements::{
//!     DocumentElementRecord, ElementType, OrderId, PageDimensions, Source,
//! };
//! use layout_fusion::geometry::BoundingBox;
//!
//! let page = PageDimensions::from_points(612.0, 792.0);
//! let bbox = BoundingBox::new(1, 72.0, 72.0, 540.0, 100.0).unwrap();
//! let record = DocumentElementRecord::new(bbox, ElementType::Text, Source::StructuredExtractor, page)
//!     .with_text("Introduction")
//!     .with_order_id(OrderId::Native(0));
//!
//! assert!(record.is_structured());
//! assert_eq!(record.order_id, OrderId::Native(0));
//! ```

mod order;
mod page;
mod record;

pub use order::OrderId;
pub use page::{PageDimensions, PageGeometry, POINTS_PER_INCH};
pub use record::{DocumentElementRecord, RecordFlags, TextSpan};

use serde::{Deserialize, Serialize};

/// Kind of a document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    /// Running text, headings and titles
    Text,
    /// Figure or picture region
    Image,
    /// Table region
    Table,
    /// Display formula
    Formula,
    /// Caption attached to a figure
    ImageCaption,
    /// Caption or footnote attached to a table
    TableCaption,
    /// Caption attached to a formula
    FormulaCaption,
}

impl ElementType {
    /// Map a visual layout detector label to an element type and optional role.
    ///
    /// Returns `None` for labels that carry no content (`abandon`, used by the
    /// detector for page furniture) and for unknown labels.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_fusion::elements::ElementType;
    ///
    /// assert_eq!(ElementType::from_visual_label("table"), Some((ElementType::Table, None)));
    /// assert_eq!(ElementType::from_visual_label("title"), Some((ElementType::Text, Some("title"))));
    /// assert_eq!(ElementType::from_visual_label("abandon"), None);
    /// ```
    pub fn from_visual_label(label: &str) -> Option<(ElementType, Option<&'static str>)> {
        match label.trim().to_ascii_lowercase().as_str() {
            "title" => Some((ElementType::Text, Some("title"))),
            "plain text" | "plain_text" | "text" => Some((ElementType::Text, None)),
            "figure" => Some((ElementType::Image, None)),
            "figure_caption" => Some((ElementType::ImageCaption, None)),
            "table" => Some((ElementType::Table, None)),
            "table_caption" | "table_footnote" => Some((ElementType::TableCaption, None)),
            "isolate_formula" | "formula" => Some((ElementType::Formula, None)),
            "formula_caption" => Some((ElementType::FormulaCaption, None)),
            _ => None,
        }
    }

    /// Check if this is running text.
    pub fn is_text(&self) -> bool {
        matches!(self, ElementType::Text)
    }

    /// Check if this is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, ElementType::Table)
    }

    /// Check if this is a figure.
    pub fn is_image(&self) -> bool {
        matches!(self, ElementType::Image)
    }
}

/// Which detector produced an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Structured text-extraction service (native reading order, inch coordinates)
    StructuredExtractor,
    /// Image-based layout detector (pixel coordinates, no native text)
    VisualLayoutDetector,
}

impl Source {
    /// Get source name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Source::StructuredExtractor => "structured",
            Source::VisualLayoutDetector => "visual",
        }
    }
}
