//! Tile coordinate type definitions

use std::fmt;

/// Highest zoom level a [`TilePos`] may carry.
pub const MAX_ZOOM: u8 = 30;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Identity of one tile in the XYZ (slippy map) quadtree.
///
/// Equality and hashing are structural over `(zoom, x, y)`, so a `TilePos`
/// can be used directly as a map key. Values are immutable once built and
/// always satisfy `zoom <= 30` and `x, y < 2^zoom`.
///
/// # Example
///
/// ```
/// use tilecache::coord::TilePos;
///
/// let pos = TilePos::new(3, 2, 4).unwrap();
/// assert_eq!(pos.zoom(), 3);
/// assert_eq!(pos.x(), 2);
/// assert_eq!(pos.y(), 4);
/// assert!(TilePos::new(3, 8, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    zoom: u8,
    x: u32,
    y: u32,
}

impl TilePos {
    /// Create a validated tile position.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }
        let limit = Self::tiles_per_axis(zoom);
        if u64::from(x) >= limit || u64::from(y) >= limit {
            return Err(CoordError::OutOfRange { zoom, x, y });
        }
        Ok(Self { zoom, x, y })
    }

    /// Number of tiles along one axis at `zoom`.
    #[inline]
    pub fn tiles_per_axis(zoom: u8) -> u64 {
        1u64 << zoom
    }

    /// Zoom level.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Column, west to east.
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row, north to south.
    pub fn y(&self) -> u32 {
        self.y
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic bounds of a tile in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRect {
    /// Latitude of the northern edge
    pub north: f64,
    /// Longitude of the western edge
    pub west: f64,
    /// Latitude of the southern edge
    pub south: f64,
    /// Longitude of the eastern edge
    pub east: f64,
}

impl GeoRect {
    /// Returns true if the point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lon)
    }
}

/// Coordinate validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    /// Zoom level is above [`MAX_ZOOM`]
    InvalidZoom(u8),
    /// x or y is outside `0..2^zoom`
    OutOfRange { zoom: u8, x: u32, y: u32 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between 0 and {})",
                    zoom, MAX_ZOOM
                )
            }
            CoordError::OutOfRange { zoom, x, y } => {
                write!(
                    f,
                    "Tile ({}, {}) out of range at zoom {} (must be below {})",
                    x,
                    y,
                    zoom,
                    TilePos::tiles_per_axis(*zoom)
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
