//! Geographic and projected coordinate types.
//!
//! `GeoPoint` is a WGS-84 latitude/longitude pair.  `XyPoint` lives in the
//! simulation's projected plane (metres, network offset applied).  Both use
//! `f64`: the projected plane spans hundreds of kilometres of UTM easting
//! before the offset is removed, and single precision would lose the
//! sub-metre resolution the distance threshold relies on.

use std::fmt;

/// A WGS-84 geographic coordinate in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// `true` if both components are finite and within the WGS-84 ranges.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// A point in the simulation's projected plane, in metres.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XyPoint {
    pub x: f64,
    pub y: f64,
}

impl XyPoint {
    pub const ORIGIN: XyPoint = XyPoint { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance.
    #[inline]
    pub fn distance_2(self, other: XyPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance in metres.
    ///
    /// Always computed as `distance_2(..).sqrt()` so every caller (brute
    /// force scan, R-tree walk, tracker range check) rounds identically.
    #[inline]
    pub fn distance(self, other: XyPoint) -> f64 {
        self.distance_2(other).sqrt()
    }
}

impl fmt::Display for XyPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Axis-aligned bounding box in the projected plane.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: XyPoint,
    pub max: XyPoint,
}

impl Bounds {
    pub fn new(min: XyPoint, max: XyPoint) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// A box is usable for sampling when both extents are finite and
    /// non-negative.
    pub fn is_valid(&self) -> bool {
        self.width().is_finite() && self.height().is_finite()
            && self.width() >= 0.0 && self.height() >= 0.0
    }

    #[inline]
    pub fn contains(&self, p: XyPoint) -> bool {
        (self.min.x..=self.max.x).contains(&p.x) && (self.min.y..=self.max.y).contains(&p.y)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} .. {}]", self.min, self.max)
    }
}
