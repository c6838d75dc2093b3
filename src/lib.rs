// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Layout Fusion
//!
//! Layout reconciliation and reading order for documents seen by two detectors.
//!
//! A structured text extractor reports paragraphs and tables in physical units with
//! a native reading order; an image-based layout detector reports figures, tables
//! and formulas in pixels of a rendered page. This crate merges both into one
//! typed, deduplicated, reading-ordered element table.
//!
//! ## Core Features
//!
//! - **Coordinate Normalization**: inches and rendered pixels → page points
//! - **Overlap Reconciliation**: mutual-overlap deduplication with order id transfer
//! - **Margins & Columns**: document-wide inference from pooled element edges
//! - **Reading Order**: 2 pluggable strategies (detector-native, column-aware)
//! - **Crop Extraction**: bounded retry with a table OCR fallback
//!
//! ## Architecture
//! - **Pluggable Collaborators**: detectors, renderer and OCR are traits
//! - **Page Parallelism**: rayon over pages, one barrier for global layout
//! - **Serializable Output**: the element table round-trips through JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use layout_fusion::detectors::recorded::RecordedDocument;
//! use layout_fusion::pipeline::{ElementPipeline, PipelineConfig};
//!
//! # fn main() -> layout_fusion::Result<()> {
//! let doc = Arc::new(RecordedDocument::load("detections.json")?);
//! let pipeline = ElementPipeline::builder(doc.clone())
//!     .structured_extractor(doc.clone())
//!     .visual_detector(doc)
//!     .config(PipelineConfig::default().with_overlap_threshold(0.6))
//!     .build()?;
//!
//! let table = pipeline.process()?;
//! for record in &table.records {
//!     println!("{:?} {}", record.element_type, record.text_or_empty());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Geometry and the typed record model
pub mod elements;
pub mod geometry;

// Collaborator contracts
pub mod detectors;

// Layout analysis
pub mod layout;

// Pipeline architecture
pub mod pipeline;

// Re-exports
pub use elements::{DocumentElementRecord, ElementType, OrderId, PageDimensions, Source};
pub use error::{Error, Result};
pub use geometry::{mutual_overlap, BoundingBox};
pub use pipeline::{ElementPipeline, ElementTable, PipelineConfig};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values.
    /// This ensures that sorting operations never panic due to NaN comparisons.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// # use std::cmp::Ordering;
    /// # use layout_fusion::utils::safe_float_cmp;
    /// assert_eq!(safe_float_cmp(1.0, 2.0), Ordering::Less);
    /// assert_eq!(safe_float_cmp(2.0, 1.0), Ordering::Greater);
    /// assert_eq!(safe_float_cmp(1.0, 1.0), Ordering::Equal);
    ///
    /// // NaN handling
    /// assert_eq!(safe_float_cmp(f32::NAN, f32::NAN), Ordering::Equal);
    /// assert_eq!(safe_float_cmp(f32::NAN, 1.0), Ordering::Greater);
    /// assert_eq!(safe_float_cmp(1.0, f32::NAN), Ordering::Less);
    /// ```
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater, // NaN > all numbers
            (false, true) => Ordering::Less,    // all numbers < NaN
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
