//! Coordinate normalization into canonical page space.
//!
//! The structured extractor reports inches; the visual detector reports pixels of
//! an image rendered at a known zoom. Both are mapped into points so that boxes
//! from the two detectors on the same page can be compared directly.

use crate::detectors::{RawStructuredPage, RawVisualElement};
use crate::elements::{
    DocumentElementRecord, ElementType, OrderId, PageDimensions, PageGeometry, RecordFlags,
    Source, POINTS_PER_INCH,
};
use crate::error::{Error, Result};
use crate::geometry::BoundingBox;
use crate::pipeline::config::NormalizationConfig;

/// Coordinate system a raw box is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateSpace {
    /// Already canonical
    Points,
    /// Physical inches
    Inches,
    /// Pixels of an image rendered at `zoom` times the page size in points
    Pixels {
        /// Render zoom factor
        zoom: f32,
    },
    /// Provenance unknown; coordinates are passed through and flagged
    Unknown,
}

/// A box mapped into canonical space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    /// Canonical box (or the raw box, when `flagged`)
    pub bbox: BoundingBox,
    /// True when the source space was unknown and the box was passed through
    pub flagged: bool,
}

/// Map a raw box into canonical page space.
///
/// # Examples
///
/// ```
/// use layout_fusion::geometry::BoundingBox;
/// use layout_fusion::layout::normalizer::{normalize_box, CoordinateSpace};
///
/// let px = BoundingBox::new(1, 300.0, 150.0, 600.0, 450.0).unwrap();
/// let pt = normalize_box(&px, CoordinateSpace::Pixels { zoom: 3.0 });
/// assert_eq!((pt.bbox.x1, pt.bbox.y1, pt.bbox.x2, pt.bbox.y2), (100.0, 50.0, 200.0, 150.0));
/// assert!(!pt.flagged);
/// ```
pub fn normalize_box(raw: &BoundingBox, space: CoordinateSpace) -> NormalizedBox {
    let bbox = match space {
        CoordinateSpace::Points => *raw,
        CoordinateSpace::Inches => raw.scaled(POINTS_PER_INCH),
        CoordinateSpace::Pixels { zoom } => BoundingBox {
            page: raw.page,
            x1: raw.x1 / zoom,
            y1: raw.y1 / zoom,
            x2: raw.x2 / zoom,
            y2: raw.y2 / zoom,
        },
        CoordinateSpace::Unknown => {
            return NormalizedBox {
                bbox: *raw,
                flagged: true,
            }
        },
    };
    NormalizedBox {
        bbox,
        flagged: false,
    }
}

/// Rewrite a record's box into canonical space in place.
///
/// Records in an unknown space keep their coordinates and gain
/// [`RecordFlags::UNNORMALIZED`]; they are never dropped.
pub fn normalize_record(record: &mut DocumentElementRecord, space: CoordinateSpace) {
    let normalized = normalize_box(&record.bounding_box, space);
    record.bounding_box = normalized.bbox;
    if normalized.flagged {
        log::warn!(
            "Page {}: {} element with unknown coordinate space passed through unnormalized",
            record.page,
            record.source.name()
        );
        record.flags |= RecordFlags::UNNORMALIZED;
    }
}

/// Records produced for one page by one detector, plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct NormalizedPage {
    /// Canonical records
    pub records: Vec<DocumentElementRecord>,
    /// Elements dropped (degenerate geometry, furniture roles, unusable labels)
    pub skipped: usize,
}

/// Normalize one page of structured extractor output.
///
/// Fails with [`Error::DimensionMismatch`] when the page's declared unit is not
/// the configured one; nothing from the page is kept in that case.
///
/// Native order ids follow the extractor's content stream: when every element
/// carries spans, order is by first span offset (a table precedes the paragraphs
/// that start at the same offset); otherwise paragraphs keep their list order and
/// tables follow them.
pub fn normalize_structured_page(
    raw: &RawStructuredPage,
    page: u32,
    geometry: PageGeometry,
    config: &NormalizationConfig,
) -> Result<NormalizedPage> {
    if !raw.unit.trim().eq_ignore_ascii_case(&config.structured_unit) {
        return Err(Error::DimensionMismatch {
            page,
            expected: config.structured_unit.clone(),
            found: raw.unit.clone(),
        });
    }

    let dims = PageDimensions::from(geometry);
    let mut out = NormalizedPage::default();

    // (first span offset, table-first rank, list position, record)
    let mut pending: Vec<(Option<usize>, u8, usize, DocumentElementRecord)> = Vec::new();

    for (idx, para) in raw.paragraphs.iter().enumerate() {
        if let Some(role) = &para.role {
            if config.skip_roles.iter().any(|r| r == role) {
                log::debug!("Page {}: skipping structured paragraph with role '{}'", page, role);
                out.skipped += 1;
                continue;
            }
        }
        let record = region_union(&para.bounding_regions, page)
            .map(|bbox| {
                DocumentElementRecord::new(bbox, ElementType::Text, Source::StructuredExtractor, dims)
            })
            .and_then(|record| into_page_space(record, CoordinateSpace::Inches));
        let mut record = match record {
            Ok(record) => record
                .with_text(para.content.clone())
                .with_spans(para.spans.clone()),
            Err(e) => {
                log::debug!("Page {}: skipping paragraph {}: {}", page, idx, e);
                out.skipped += 1;
                continue;
            },
        };
        record.role = para.role.clone();
        let first = para.spans.iter().map(|s| s.offset).min();
        pending.push((first, 1, idx, record));
    }

    let para_count = raw.paragraphs.len();
    for (idx, table) in raw.tables.iter().enumerate() {
        let record = region_union(&table.bounding_regions, page)
            .map(|bbox| {
                DocumentElementRecord::new(bbox, ElementType::Table, Source::StructuredExtractor, dims)
            })
            .and_then(|record| into_page_space(record, CoordinateSpace::Inches));
        let record = match record {
            Ok(record) => record.with_spans(table.spans.clone()),
            Err(e) => {
                log::debug!("Page {}: skipping table {}: {}", page, idx, e);
                out.skipped += 1;
                continue;
            },
        };
        let first = table.spans.iter().map(|s| s.offset).min();
        pending.push((first, 0, para_count + idx, record));
    }

    if pending.iter().all(|(first, ..)| first.is_some()) {
        pending.sort_by_key(|(first, rank, pos, _)| (*first, *rank, *pos));
    } else {
        pending.sort_by_key(|(_, _, pos, _)| *pos);
    }

    out.records = pending
        .into_iter()
        .enumerate()
        .map(|(i, (_, _, _, record))| record.with_order_id(OrderId::Native(i as u32)))
        .collect();
    Ok(out)
}

/// Union of a structured element's regions on `page`, still in the declared unit.
fn region_union(regions: &[crate::detectors::BoundingRegion], page: u32) -> Result<BoundingBox> {
    let mut union: Option<BoundingBox> = None;
    for region in regions.iter().filter(|r| r.page_number == page) {
        let bbox = BoundingBox::from_polygon(page, &region.polygon)?;
        union = Some(match union {
            None => bbox,
            Some(u) => BoundingBox {
                page,
                x1: u.x1.min(bbox.x1),
                y1: u.y1.min(bbox.y1),
                x2: u.x2.max(bbox.x2),
                y2: u.y2.max(bbox.y2),
            },
        });
    }
    union.ok_or_else(|| Error::DegenerateGeometry {
        page,
        reason: "no bounding region on this page".to_string(),
    })
}

/// Map a freshly built record into canonical space and clamp it to its page.
///
/// Unnormalized records are not clamped; their coordinates mean nothing in
/// page space.
fn into_page_space(
    mut record: DocumentElementRecord,
    space: CoordinateSpace,
) -> Result<DocumentElementRecord> {
    normalize_record(&mut record, space);
    if !record.flags.contains(RecordFlags::UNNORMALIZED) {
        record.bounding_box = clamp_to_page(&record.bounding_box, &record.page_dimensions)?;
    }
    Ok(record)
}

fn clamp_to_page(bbox: &BoundingBox, dims: &PageDimensions) -> Result<BoundingBox> {
    let c = bbox.clamped(dims.width_points, dims.height_points);
    BoundingBox::new(c.page, c.x1, c.y1, c.x2, c.y2)
}

/// Normalize one page of visual detector output.
///
/// `keep_text` decides whether plain text regions survive; labels without content
/// (`abandon`) and unknown labels are dropped.
pub fn normalize_visual_page(
    raw: &[RawVisualElement],
    page: u32,
    geometry: PageGeometry,
    config: &NormalizationConfig,
    keep_text: bool,
) -> Result<NormalizedPage> {
    if !(config.zoom.is_finite() && config.zoom > 0.0) {
        return Err(Error::InvalidConfig(format!("zoom must be positive, got {}", config.zoom)));
    }
    let dims = PageDimensions::from(geometry);
    let space = CoordinateSpace::Pixels { zoom: config.zoom };
    let mut out = NormalizedPage::default();

    for (idx, element) in raw.iter().enumerate() {
        let Some((element_type, role)) = ElementType::from_visual_label(&element.label) else {
            if element.label.trim().eq_ignore_ascii_case("abandon") {
                log::debug!("Page {}: dropping abandoned region {}", page, idx);
            } else {
                log::warn!("Page {}: unknown visual label '{}'", page, element.label);
            }
            out.skipped += 1;
            continue;
        };
        if element.confidence < config.min_visual_confidence {
            log::trace!(
                "Page {}: dropping {:?} at confidence {:.2}",
                page,
                element_type,
                element.confidence
            );
            out.skipped += 1;
            continue;
        }
        if element_type.is_text() && !keep_text {
            out.skipped += 1;
            continue;
        }

        let [x1, y1, x2, y2] = element.box_px;
        let record = BoundingBox::new(page, x1, y1, x2, y2)
            .map(|px| DocumentElementRecord::new(px, element_type, Source::VisualLayoutDetector, dims))
            .and_then(|record| into_page_space(record, space));
        let mut record = match record {
            Ok(record) => record.with_confidence(element.confidence),
            Err(e) => {
                log::debug!("Page {}: skipping visual region {}: {}", page, idx, e);
                out.skipped += 1;
                continue;
            },
        };
        if let Some(role) = role {
            record = record.with_role(role);
        }
        out.records.push(record);
    }

    Ok(out)
}
