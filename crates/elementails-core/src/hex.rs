//! Hex coordinate system for battle maps.
//!
//! Uses axial `(q, r)` coordinates on a flat-top layout, with the implicit
//! cube coordinate `s = -q - r`. Pixel positions are derived from a
//! [`HexLayout`], which carries the two free parameters of a map: the hex
//! radius and the pixel origin of axial `(0, 0)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axial offsets of the six neighbors, clockwise starting from east.
pub const AXIAL_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Axial coordinates for a flat-top hex grid.
///
/// In this coordinate system:
/// - `q` steps one column to the right (1.5 radii horizontally)
/// - `r` steps one hex straight down (sqrt(3) radii vertically)
/// - `s = -q - r` is implicit
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct AxialCoord {
    pub q: i32,
    pub r: i32,
}

impl PartialOrd for AxialCoord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AxialCoord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Row-major ordering for deterministic iteration
        (self.r, self.q).cmp(&(other.r, other.q))
    }
}

impl AxialCoord {
    /// Create a new axial coordinate.
    #[inline]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third cube coordinate.
    #[inline]
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Get all 6 neighboring hexes in clockwise order starting from east.
    pub fn neighbors(&self) -> [AxialCoord; 6] {
        AXIAL_DIRECTIONS.map(|(dq, dr)| AxialCoord::new(self.q + dq, self.r + dr))
    }

    /// Distance to another hex in hex steps.
    pub fn distance(&self, other: &AxialCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        dq.max(dr).max(ds) as u32
    }

    /// Convert to cube coordinates `(x, y, z)` with `x = q`, `z = r`.
    pub const fn to_cube(&self) -> (i32, i32, i32) {
        (self.q, -self.q - self.r, self.r)
    }

    /// Create from cube coordinates.
    ///
    /// Note: Input must satisfy x + y + z = 0
    pub const fn from_cube(x: i32, _y: i32, z: i32) -> Self {
        Self { q: x, r: z }
    }

    /// Check if this coordinate indexes a `cols x rows` rectangle.
    pub fn in_bounds(&self, cols: usize, rows: usize) -> bool {
        self.q >= 0 && self.r >= 0 && (self.q as usize) < cols && (self.r as usize) < rows
    }

    /// Linear index `r * cols + q`, or `None` outside a `cols x rows` rectangle.
    pub fn linear_index(&self, cols: usize, rows: usize) -> Option<usize> {
        if self.in_bounds(cols, rows) {
            Some(self.r as usize * cols + self.q as usize)
        } else {
            None
        }
    }

    /// Hexes on the straight line from `self` to `other`, both ends included.
    ///
    /// Samples `distance + 1` evenly spaced points in cube space and rounds
    /// each one. Both ends are nudged by a tiny epsilon so samples that land
    /// exactly on a hex edge always round to the same side.
    pub fn line_to(&self, other: &AxialCoord) -> Vec<AxialCoord> {
        let n = self.distance(other);
        if n == 0 {
            return vec![*self];
        }

        let (ax, ay, az) = nudged_cube(self);
        let (bx, by, bz) = nudged_cube(other);
        (0..=n)
            .map(|i| {
                let t = f64::from(i) / f64::from(n);
                cube_round(lerp(ax, bx, t), lerp(ay, by, t), lerp(az, bz, t))
            })
            .collect()
    }
}

impl std::fmt::Display for AxialCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

fn nudged_cube(coord: &AxialCoord) -> (f64, f64, f64) {
    let (x, y, z) = coord.to_cube();
    (
        f64::from(x) + 1e-6,
        f64::from(y) + 1e-6,
        f64::from(z) - 2e-6,
    )
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Round fractional cube coordinates to the nearest valid hex.
///
/// Each axis is rounded on its own, then the axis with the largest rounding
/// error is recomputed from the other two so that `x + y + z = 0` holds.
pub fn cube_round(x: f64, y: f64, z: f64) -> AxialCoord {
    let mut rx = x.round();
    let mut ry = y.round();
    let mut rz = z.round();

    let x_diff = (rx - x).abs();
    let y_diff = (ry - y).abs();
    let z_diff = (rz - z).abs();

    if x_diff > y_diff && x_diff > z_diff {
        rx = -ry - rz;
    } else if y_diff > z_diff {
        ry = -rx - rz;
    } else {
        rz = -rx - ry;
    }

    AxialCoord::from_cube(rx as i32, ry as i32, rz as i32)
}

/// A point in image or screen space.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Invalid layout parameters.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    #[error("hex radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("layout origin must be finite, got ({0}, {1})")]
    NonFiniteOrigin(f64, f64),
}

/// Flat-top layout: maps axial coordinates to pixels and back.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct HexLayout {
    radius: f64,
    origin: PixelPoint,
}

impl HexLayout {
    /// Create a layout, rejecting degenerate parameters up front.
    pub fn new(radius: f64, origin: PixelPoint) -> Result<Self, LayoutError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(LayoutError::InvalidRadius(radius));
        }
        if !origin.is_finite() {
            return Err(LayoutError::NonFiniteOrigin(origin.x, origin.y));
        }
        Ok(Self { radius, origin })
    }

    /// Center-to-corner radius in pixels.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Pixel center of axial `(0, 0)`.
    pub fn origin(&self) -> PixelPoint {
        self.origin
    }

    /// Horizontal distance between adjacent columns.
    pub fn step_x(&self) -> f64 {
        1.5 * self.radius
    }

    /// Vertical distance between adjacent rows.
    pub fn step_y(&self) -> f64 {
        SQRT_3 * self.radius
    }

    /// Pixel center of an axial coordinate.
    pub fn axial_to_pixel(&self, coord: AxialCoord) -> PixelPoint {
        let q = f64::from(coord.q);
        let r = f64::from(coord.r);
        PixelPoint::new(
            self.origin.x + self.radius * 1.5 * q,
            self.origin.y + self.radius * SQRT_3 * (r + q / 2.0),
        )
    }

    /// Axial coordinate of the hex containing a pixel.
    ///
    /// Always returns a coordinate; callers bounds-check against their grid.
    pub fn pixel_to_axial(&self, point: PixelPoint) -> AxialCoord {
        let px = point.x - self.origin.x;
        let py = point.y - self.origin.y;
        let qf = (2.0 / 3.0) * px / self.radius;
        let rf = ((-1.0 / 3.0) * px + (SQRT_3 / 3.0) * py) / self.radius;
        cube_round(qf, -qf - rf, rf)
    }

    /// The six corners around a center, at 0, 60, ..., 300 degrees.
    pub fn corners_at(&self, center: PixelPoint) -> [PixelPoint; 6] {
        std::array::from_fn(|i| {
            let angle = (60.0 * i as f64).to_radians();
            PixelPoint::new(
                center.x + self.radius * angle.cos(),
                center.y + self.radius * angle.sin(),
            )
        })
    }

    /// Corners of the hex at an axial coordinate.
    pub fn corners(&self, coord: AxialCoord) -> [PixelPoint; 6] {
        self.corners_at(self.axial_to_pixel(coord))
    }

    /// Point-in-hexagon test against the rendered polygon of a cell.
    pub fn contains(&self, coord: AxialCoord, point: PixelPoint) -> bool {
        polygon_contains(&self.corners(coord), point)
    }

    /// Same layout with a different radius.
    pub fn with_radius(&self, radius: f64) -> Result<Self, LayoutError> {
        Self::new(radius, self.origin)
    }
}

/// Even-odd ray casting test for a closed polygon.
pub fn polygon_contains(polygon: &[PixelPoint], point: PixelPoint) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, a) in polygon.iter().enumerate() {
        let b = &polygon[j];
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
