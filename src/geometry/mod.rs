//! Geometric primitives for layout reconciliation.
//!
//! All boxes live in canonical page space: points (1/72 inch), origin at the
//! top-left corner of the page, y growing downward.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_fusion::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box on a specific page.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`. Use [`BoundingBox::new`] to build a box
/// from untrusted coordinates; it rejects degenerate (zero-area) boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Page number (1-based)
    pub page: u32,
    /// Left edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
    /// Right edge
    pub x2: f32,
    /// Bottom edge
    pub y2: f32,
}

impl BoundingBox {
    /// Create a validated bounding box.
    ///
    /// Corners may be given in any order; they are sorted so that `x1 <= x2` and
    /// `y1 <= y2`. Fails with [`Error::DegenerateGeometry`] for non-finite
    /// coordinates or zero area.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_fusion::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(1, 110.0, 70.0, 10.0, 20.0).unwrap();
    /// assert_eq!(bbox.x1, 10.0);
    /// assert_eq!(bbox.y2, 70.0);
    ///
    /// assert!(BoundingBox::new(1, 10.0, 10.0, 10.0, 50.0).is_err());
    /// ```
    pub fn new(page: u32, x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(Error::DegenerateGeometry {
                page,
                reason: format!("non-finite coordinates ({x1}, {y1}, {x2}, {y2})"),
            });
        }
        let bbox = Self {
            page,
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        };
        if bbox.area() <= 0.0 {
            return Err(Error::DegenerateGeometry {
                page,
                reason: format!(
                    "zero-area box ({:.2}, {:.2}, {:.2}, {:.2})",
                    bbox.x1, bbox.y1, bbox.x2, bbox.y2
                ),
            });
        }
        Ok(bbox)
    }

    /// Smallest box enclosing a flat polygon `[x1, y1, x2, y2, ...]`.
    ///
    /// Polygons with fewer than two points are rejected as degenerate.
    pub fn from_polygon(page: u32, polygon: &[f32]) -> Result<Self> {
        if polygon.len() < 4 || polygon.len() % 2 != 0 {
            return Err(Error::DegenerateGeometry {
                page,
                reason: format!("polygon with {} coordinates", polygon.len()),
            });
        }
        let xs = polygon.iter().step_by(2);
        let ys = polygon.iter().skip(1).step_by(2);
        let (min_x, max_x) = xs.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        let (min_y, max_y) = ys.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        Self::new(page, min_x, min_y, max_x, max_y)
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Area of the box. Never negative.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Center point of the box.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_fusion::geometry::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(1, 0.0, 0.0, 100.0, 50.0).unwrap();
    /// let center = bbox.center();
    /// assert_eq!(center.x, 50.0);
    /// assert_eq!(center.y, 25.0);
    /// ```
    pub fn center(&self) -> Point {
        Point {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }

    /// Scale every coordinate by `factor`, keeping the page.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            page: self.page,
            x1: self.x1 * factor,
            y1: self.y1 * factor,
            x2: self.x2 * factor,
            y2: self.y2 * factor,
        }
    }

    /// Clamp the box into `[0, width] x [0, height]`.
    ///
    /// The result may be degenerate if the box lies entirely outside the page.
    pub fn clamped(&self, width: f32, height: f32) -> Self {
        Self {
            page: self.page,
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    /// Area of the intersection with `other`; zero when disjoint or on another page.
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        if self.page != other.page {
            return 0.0;
        }
        let w = self.x2.min(other.x2) - self.x1.max(other.x1);
        let h = self.y2.min(other.y2) - self.y1.max(other.y1);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

/// Mutual overlap ratio: intersection area divided by the smaller box's area.
///
/// Unlike IoU, a small box lying entirely inside a much larger one scores 1.0.
/// Zero-area boxes, disjoint boxes and boxes on different pages score 0.0.
///
/// # Examples
///
/// ```
/// use layout_fusion::geometry::{mutual_overlap, BoundingBox};
///
/// let table = BoundingBox::new(1, 0.0, 0.0, 400.0, 300.0).unwrap();
/// let cell = BoundingBox::new(1, 10.0, 10.0, 60.0, 30.0).unwrap();
/// assert_eq!(mutual_overlap(&table, &cell), 1.0);
/// ```
pub fn mutual_overlap(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let smaller = a.area().min(b.area());
    if smaller <= 0.0 {
        return 0.0;
    }
    (a.intersection_area(b) / smaller).clamp(0.0, 1.0)
}
