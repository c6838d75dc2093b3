//! Reading order strategies for reconciled elements.
//!
//! This module provides pluggable strategies for assigning the final reading
//! sequence of a document's elements.
//!
//! # Available Strategies
//!
//! - [`DetectorOrderStrategy`]: Trusts the detector-native order ids (hybrid mode)
//! - [`ColumnOrderStrategy`]: Column assignment, then top-to-bottom (visual-only mode)

mod columns;
mod detector;

pub use columns::ColumnOrderStrategy;
pub use detector::DetectorOrderStrategy;

use crate::elements::DocumentElementRecord;
use crate::error::Result;
use crate::layout::ColumnLayout;
use crate::pipeline::config::{ReadingOrderConfig, ReadingOrderStrategyType};

/// Trait for determining the reading order of reconciled records.
///
/// Implementations return the records in reading order with
/// [`DocumentElementRecord::reading_order`] set to a dense, document-wide
/// sequence starting at zero. Every tie must be broken by
/// `detection_index` so the result is reproducible.
pub trait ReadingOrderStrategy: Send + Sync {
    /// Apply reading order to all records of a document.
    fn apply(
        &self,
        records: Vec<DocumentElementRecord>,
        context: &ReadingOrderContext,
    ) -> Result<Vec<DocumentElementRecord>>;

    /// Return the name of this strategy for debugging.
    fn name(&self) -> &'static str;
}

/// Context information for reading order determination.
#[derive(Debug, Clone, Default)]
pub struct ReadingOrderContext {
    /// Document-wide columns, if they were inferred.
    pub columns: Option<ColumnLayout>,

    /// Whether a structured extractor contributed native order ids.
    pub has_structured: bool,
}

impl ReadingOrderContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document columns.
    pub fn with_columns(mut self, columns: ColumnLayout) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Set whether structured order ids are available.
    pub fn with_structured(mut self, has_structured: bool) -> Self {
        self.has_structured = has_structured;
        self
    }
}

/// Number records in their current order.
pub(crate) fn assign_sequence(records: &mut [DocumentElementRecord]) {
    for (position, record) in records.iter_mut().enumerate() {
        record.reading_order = Some(position);
    }
}

/// Create a reading order strategy based on configuration.
///
/// `Auto` picks [`DetectorOrderStrategy`] when structured order ids exist and
/// [`ColumnOrderStrategy`] otherwise.
pub fn create_strategy(
    config: &ReadingOrderConfig,
    context: &ReadingOrderContext,
) -> Box<dyn ReadingOrderStrategy> {
    match config.strategy {
        ReadingOrderStrategyType::DetectorNative => Box::new(DetectorOrderStrategy),
        ReadingOrderStrategyType::Columns => Box::new(ColumnOrderStrategy),
        ReadingOrderStrategyType::Auto if context.has_structured => Box::new(DetectorOrderStrategy),
        ReadingOrderStrategyType::Auto => Box::new(ColumnOrderStrategy),
    }
}
