//! Unified configuration for the reconciliation pipeline.
//!
//! Every tunable of every phase lives here and is passed explicitly into the
//! phase that needs it. The overlap threshold and the margin clip range are
//! hand-tuned defaults, not universal constants; override them per corpus.
//!
//! Configurations can be loaded from JSON. Missing fields take their defaults:
//!
//! ```
//! use layout_fusion::pipeline::PipelineConfig;
//!
//! let config = PipelineConfig::from_json(r#"{ "overlap": { "threshold": 0.7 } }"#).unwrap();
//! assert_eq!(config.overlap.threshold, 0.7);
//! assert_eq!(config.margins.min_ratio, 0.05);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Logging detail level for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Only critical errors are logged
    Error,
    /// Warnings and errors are logged
    Warn,
    /// General information (default level)
    #[default]
    Info,
    /// Detailed debug information for troubleshooting
    Debug,
    /// Per-element trace information
    Trace,
}

impl LogLevel {
    /// Equivalent `log` crate filter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Which visual detector regions survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VisualTextPolicy {
    /// `NonTextOnly` when a structured extractor participates, `All` otherwise
    #[default]
    Auto,
    /// Keep every region
    All,
    /// Drop plain text regions; keep figures, tables, formulas and captions
    NonTextOnly,
}

/// Coordinate normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Zoom factor the page image was rendered at, relative to points
    pub zoom: f32,
    /// Unit the structured extractor must declare
    pub structured_unit: String,
    /// Visual detections below this confidence are dropped
    pub min_visual_confidence: f32,
    /// Which visual regions to keep
    pub visual_text_policy: VisualTextPolicy,
    /// Structured paragraph roles treated as page furniture and dropped
    pub skip_roles: Vec<String>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            zoom: 3.0,
            structured_unit: "inch".to_string(),
            min_visual_confidence: 0.0,
            visual_text_policy: VisualTextPolicy::Auto,
            skip_roles: vec![
                "pageHeader".to_string(),
                "pageFooter".to_string(),
                "pageNumber".to_string(),
            ],
        }
    }
}

/// Overlap reconciliation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapConfig {
    /// Mutual overlap ratio above which a structured element is a duplicate
    pub threshold: f32,
    /// Remove structured paragraphs whose spans fall inside a structured table
    pub suppress_table_paragraphs: bool,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            suppress_table_paragraphs: true,
        }
    }
}

/// Margin inference and filtering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    /// Lower clip bound for every margin ratio
    pub min_ratio: f32,
    /// Upper clip bound for every margin ratio
    pub max_ratio: f32,
    /// Percentile of top edges that sets the top margin
    pub top_percentile: f32,
    /// Percentile of bottom edges that sets the bottom margin
    pub bottom_percentile: f32,
    /// Drop structured elements that fall into margins or column gaps
    pub filter_enabled: bool,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            min_ratio: 0.05,
            max_ratio: 0.15,
            top_percentile: 5.0,
            bottom_percentile: 95.0,
            filter_enabled: true,
        }
    }
}

/// Column detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Number of histogram bins across the page width
    pub bins: usize,
    /// Moving-average window (in bins)
    pub smoothing_window: usize,
    /// Minimum width of a column gap, in points
    pub min_gap_width: f32,
    /// Minimum valley prominence as a fraction of the histogram maximum
    pub min_valley_prominence: f32,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            bins: 100,
            smoothing_window: 3,
            min_gap_width: 50.0,
            min_valley_prominence: 0.25,
        }
    }
}

/// Text-from-crop extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Attempts per crop before giving up
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Try the table OCR fallback once all attempts failed on a table
    pub table_ocr_fallback: bool,
    /// Directory for figure crops; figures keep no image when unset
    pub image_output_dir: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 0,
            table_ocr_fallback: true,
            image_output_dir: None,
        }
    }
}

/// Reading order strategy type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReadingOrderStrategyType {
    /// Detector-native order when a structured extractor participates, columns otherwise
    #[default]
    Auto,
    /// Stable sort by (page, order id)
    DetectorNative,
    /// Column assignment, then top-to-bottom within each column
    Columns,
}

/// Reading order configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingOrderConfig {
    /// Which strategy to use
    pub strategy: ReadingOrderStrategyType,
}

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Coordinate normalization
    pub normalization: NormalizationConfig,
    /// Overlap reconciliation
    pub overlap: OverlapConfig,
    /// Margin inference and filtering
    pub margins: MarginConfig,
    /// Column detection
    pub columns: ColumnConfig,
    /// Text-from-crop extraction
    pub extraction: ExtractionConfig,
    /// Reading order
    pub reading_order: ReadingOrderConfig,
    /// Worker threads for page phases (0 = rayon default)
    pub max_threads: usize,
    /// Logging detail level
    pub log_level: LogLevel,
}

impl PipelineConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value for range and consistency.
    pub fn validate(&self) -> Result<()> {
        let n = &self.normalization;
        if !(n.zoom.is_finite() && n.zoom > 0.0) {
            return Err(Error::InvalidConfig(format!("zoom must be positive, got {}", n.zoom)));
        }
        if !(0.0..=1.0).contains(&self.overlap.threshold) {
            return Err(Error::InvalidConfig(format!(
                "overlap threshold must be within [0, 1], got {}",
                self.overlap.threshold
            )));
        }
        let m = &self.margins;
        if !(0.0 <= m.min_ratio && m.min_ratio <= m.max_ratio && m.max_ratio < 0.5) {
            return Err(Error::InvalidConfig(format!(
                "margin clip range [{}, {}] must satisfy 0 <= min <= max < 0.5",
                m.min_ratio, m.max_ratio
            )));
        }
        if !(0.0 <= m.top_percentile
            && m.top_percentile < m.bottom_percentile
            && m.bottom_percentile <= 100.0)
        {
            return Err(Error::InvalidConfig(format!(
                "edge percentiles ({}, {}) must be increasing within [0, 100]",
                m.top_percentile, m.bottom_percentile
            )));
        }
        let c = &self.columns;
        if c.bins < 3 {
            return Err(Error::InvalidConfig(format!("need at least 3 bins, got {}", c.bins)));
        }
        if c.smoothing_window == 0 {
            return Err(Error::InvalidConfig("smoothing window must be at least 1".to_string()));
        }
        if c.min_gap_width < 0.0 || c.min_valley_prominence < 0.0 {
            return Err(Error::InvalidConfig(
                "column gap width and prominence must not be negative".to_string(),
            ));
        }
        if self.extraction.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Set the render zoom factor.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.normalization.zoom = zoom;
        self
    }

    /// Set the overlap threshold.
    pub fn with_overlap_threshold(mut self, threshold: f32) -> Self {
        self.overlap.threshold = threshold;
        self
    }

    /// Set the margin clip range.
    pub fn with_margin_range(mut self, min_ratio: f32, max_ratio: f32) -> Self {
        self.margins.min_ratio = min_ratio;
        self.margins.max_ratio = max_ratio;
        self
    }

    /// Set the reading order strategy.
    pub fn with_reading_order(mut self, strategy: ReadingOrderStrategyType) -> Self {
        self.reading_order.strategy = strategy;
        self
    }

    /// Set the number of attempts per crop.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.extraction.max_attempts = attempts;
        self
    }

    /// Set the directory figure crops are written to.
    pub fn with_image_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extraction.image_output_dir = Some(dir.into());
        self
    }

    /// Set the number of worker threads.
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Set the logging detail level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}
