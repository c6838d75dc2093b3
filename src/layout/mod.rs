//! Layout reconciliation algorithms.
//!
//! This module turns raw detector output into a single coherent element set:
//! - Coordinate normalization (inches / pixels → points)
//! - Cross-detector overlap reconciliation with order transfer
//! - Document-wide margin inference and filtering
//! - Histogram valley column detection

pub mod column_detector;
pub mod histogram;
pub mod margins;
pub mod normalizer;
pub mod overlap;

// Re-export main types
pub use column_detector::{detect_columns, ColumnLayout, ColumnRange};
pub use margins::{filter_margins, infer_layout, DocumentLayout, EdgePools, FilterSummary, MarginSizes};
pub use normalizer::{
    normalize_box, normalize_record, normalize_structured_page, normalize_visual_page,
    CoordinateSpace, NormalizedBox, NormalizedPage,
};
pub use overlap::{reconcile, reconcile_page, sort_by_page_and_order, ReconcileSummary};
