//! Page geometry in physical units and points.

use serde::{Deserialize, Serialize};

/// Points per inch, the fixed ratio between physical units and canonical space.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Authoritative page size, read from the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page width in points
    pub width_points: f32,
    /// Page height in points
    pub height_points: f32,
}

impl PageGeometry {
    /// Create page geometry from a size in points.
    pub fn new(width_points: f32, height_points: f32) -> Self {
        Self {
            width_points,
            height_points,
        }
    }

    /// Check that both sides are finite and positive.
    pub fn is_valid(&self) -> bool {
        self.width_points.is_finite()
            && self.height_points.is_finite()
            && self.width_points > 0.0
            && self.height_points > 0.0
    }
}

/// Page size in both physical units (inches) and points.
///
/// One instance per page; every record on the page carries a copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    /// Page width in inches
    pub width_units: f32,
    /// Page height in inches
    pub height_units: f32,
    /// Page width in points
    pub width_points: f32,
    /// Page height in points
    pub height_points: f32,
}

impl PageDimensions {
    /// Build dimensions from a size in points.
    ///
    /// # Examples
    ///
    /// ```
    /// use layout_fusion::elements::PageDimensions;
    ///
    /// let letter = PageDimensions::from_points(612.0, 792.0);
    /// assert_eq!(letter.width_units, 8.5);
    /// assert_eq!(letter.height_units, 11.0);
    /// ```
    pub fn from_points(width_points: f32, height_points: f32) -> Self {
        Self {
            width_units: width_points / POINTS_PER_INCH,
            height_units: height_points / POINTS_PER_INCH,
            width_points,
            height_points,
        }
    }
}

impl From<PageGeometry> for PageDimensions {
    fn from(geometry: PageGeometry) -> Self {
        Self::from_points(geometry.width_points, geometry.height_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_and_points_agree() {
        let a4 = PageDimensions::from(PageGeometry::new(595.44, 841.68));
        assert!((a4.width_units - 8.27).abs() < 1e-4);
        assert!((a4.height_units - 11.69).abs() < 1e-4);
        assert_eq!(a4.width_points, 595.44);
    }

    #[test]
    fn test_geometry_validity() {
        assert!(PageGeometry::new(612.0, 792.0).is_valid());
        assert!(!PageGeometry::new(0.0, 792.0).is_valid());
        assert!(!PageGeometry::new(f32::NAN, 792.0).is_valid());
    }
}
