//! The document element record.

use std::path::PathBuf;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::{ElementType, OrderId, PageDimensions, Source};
use crate::geometry::{BoundingBox, Point};

bitflags! {
    /// Processing notes attached to a record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RecordFlags: u8 {
        /// Coordinates were passed through from an unknown coordinate space
        const UNNORMALIZED = 1 << 0;
        /// Text-from-crop extraction exhausted every attempt
        const EXTRACTION_FAILED = 1 << 1;
        /// Text came from the table OCR fallback
        const OCR_FALLBACK = 1 << 2;
        /// Order id was adopted from a subsumed structured element
        const ORDER_TRANSFERRED = 1 << 3;
    }
}

mod flag_bits {
    use super::RecordFlags;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flags: &RecordFlags, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(flags.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordFlags, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(RecordFlags::from_bits_truncate(bits))
    }
}

/// A character range `(offset, length)` in the structured extractor's content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    /// Offset of the first character
    pub offset: usize,
    /// Number of characters
    pub length: usize,
}

impl TextSpan {
    /// Create a new span.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// One past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Check if `other` lies entirely inside this span.
    pub fn contains(&self, other: &TextSpan) -> bool {
        other.offset >= self.offset && other.end() <= self.end()
    }
}

/// One typed element of the reconciled document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentElementRecord {
    /// Page number (1-based)
    pub page: u32,
    /// Canonical bounding box in points
    pub bounding_box: BoundingBox,
    /// Element kind
    pub element_type: ElementType,
    /// Extracted text, if any
    pub text: Option<String>,
    /// Saved figure crop, if any
    pub image_path: Option<PathBuf>,
    /// Semantic role reported by a detector (`title`, `sectionHeading`, ...)
    pub role: Option<String>,
    /// Detector confidence, if reported
    pub confidence: Option<f32>,
    /// Character ranges in the structured extractor's content
    pub spans: Vec<TextSpan>,
    /// Detector-native sequence position
    pub order_id: OrderId,
    /// Which detector produced this record
    pub source: Source,
    /// Size of the page the record lives on
    pub page_dimensions: PageDimensions,
    /// Document-wide creation sequence; breaks every ordering tie
    pub detection_index: usize,
    /// Final position in the reading sequence, once assigned
    pub reading_order: Option<usize>,
    /// Processing notes
    #[serde(with = "flag_bits")]
    pub flags: RecordFlags,
}

impl DocumentElementRecord {
    /// Create a record with no text, no native order and no flags.
    pub fn new(
        bounding_box: BoundingBox,
        element_type: ElementType,
        source: Source,
        page_dimensions: PageDimensions,
    ) -> Self {
        Self {
            page: bounding_box.page,
            bounding_box,
            element_type,
            text: None,
            image_path: None,
            role: None,
            confidence: None,
            spans: Vec::new(),
            order_id: OrderId::Unordered,
            source,
            page_dimensions,
            detection_index: 0,
            reading_order: None,
            flags: RecordFlags::empty(),
        }
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the semantic role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the detector confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the content spans.
    pub fn with_spans(mut self, spans: Vec<TextSpan>) -> Self {
        self.spans = spans;
        self
    }

    /// Set the native order id.
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = order_id;
        self
    }

    /// Set the detection index.
    pub fn with_detection_index(mut self, index: usize) -> Self {
        self.detection_index = index;
        self
    }

    /// Check if the structured extractor produced this record.
    pub fn is_structured(&self) -> bool {
        self.source == Source::StructuredExtractor
    }

    /// Check if the visual layout detector produced this record.
    pub fn is_visual(&self) -> bool {
        self.source == Source::VisualLayoutDetector
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point {
        self.bounding_box.center()
    }

    /// Text content, or the empty string.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Adopt `candidate` as the order id if it is strictly earlier than the current one.
    ///
    /// Returns true when the order id changed.
    pub fn adopt_order(&mut self, candidate: OrderId) -> bool {
        if candidate < self.order_id {
            self.order_id = candidate;
            self.flags |= RecordFlags::ORDER_TRANSFERRED;
            true
        } else {
            false
        }
    }
}
