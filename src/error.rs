//! Error types for layout reconciliation.
//!
//! Most failures in this crate are scoped: a dimension mismatch only affects one
//! page's structured elements, a degenerate box only affects one element, and an
//! extraction failure only affects one crop. The pipeline logs these and keeps going;
//! see [`crate::pipeline::ElementPipeline`].

/// Result type alias for layout reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reconciling detector output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A detector reported page geometry in an unexpected unit.
    #[error("Dimension mismatch on page {page}: expected unit '{expected}', found '{found}'")]
    DimensionMismatch {
        /// Page number (1-based)
        page: u32,
        /// Unit the normalizer expected
        expected: String,
        /// Unit the detector declared
        found: String,
    },

    /// A bounding box with zero or negative area, or non-finite coordinates.
    #[error("Degenerate geometry on page {page}: {reason}")]
    DegenerateGeometry {
        /// Page number (1-based)
        page: u32,
        /// What was wrong with the box
        reason: String,
    },

    /// The text-from-image collaborator failed or returned nothing.
    #[error("Text extraction failed after {attempts} attempt(s): {reason}")]
    ExtractionFailure {
        /// Number of attempts made
        attempts: u32,
        /// Last failure reason
        reason: String,
    },

    /// Configuration values are out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external collaborator (renderer, detector, geometry source) failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding or decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Whether this error only invalidates a single page (as opposed to the whole run).
    pub fn is_page_scoped(&self) -> bool {
        matches!(
            self,
            Error::DimensionMismatch { .. }
                | Error::DegenerateGeometry { .. }
                | Error::Collaborator(_)
                | Error::Image(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_error() {
        let err = Error::DimensionMismatch {
            page: 3,
            expected: "inch".to_string(),
            found: "pixel".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("inch"));
        assert!(msg.contains("pixel"));
        assert!(err.is_page_scoped());
    }

    #[test]
    fn test_degenerate_geometry_error() {
        let err = Error::DegenerateGeometry {
            page: 1,
            reason: "zero width".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Degenerate geometry"));
        assert!(msg.contains("zero width"));
    }

    #[test]
    fn test_extraction_failure_error() {
        let err = Error::ExtractionFailure {
            attempts: 3,
            reason: "empty result".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("3 attempt"));
        assert!(!err.is_page_scoped());
    }

    #[test]
    fn test_invalid_config_error() {
        let err = Error::InvalidConfig("zoom must be positive".to_string());
        assert!(format!("{}", err).contains("zoom must be positive"));
        assert!(!err.is_page_scoped());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
