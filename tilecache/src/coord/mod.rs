//! Tile coordinates.
//!
//! Provides the [`TilePos`] tile identity and the Web Mercator conversion from
//! a tile to its geographic bounds, which the coordinator attaches to every
//! delivered tile.

mod types;

pub use types::{CoordError, GeoRect, TilePos, MAX_LAT, MAX_ZOOM, MIN_LAT};

use std::f64::consts::PI;

/// Converts a tile corner (in tile units at `zoom`) to latitude/longitude.
///
/// `x` and `y` may equal `2^zoom` to address the far (east/south) edge.
#[inline]
pub fn tile_corner_to_lat_lon(x: u64, y: u64, zoom: u8) -> (f64, f64) {
    let n = TilePos::tiles_per_axis(zoom) as f64;

    let lon = x as f64 / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

impl TilePos {
    /// Geographic bounds covered by this tile.
    pub fn geo_rect(&self) -> GeoRect {
        let zoom = self.zoom();
        let (north, west) = tile_corner_to_lat_lon(u64::from(self.x()), u64::from(self.y()), zoom);
        let (south, east) =
            tile_corner_to_lat_lon(u64::from(self.x()) + 1, u64::from(self.y()) + 1, zoom);
        GeoRect {
            north,
            west,
            south,
            east,
        }
    }

    /// Bing Maps quadkey for this tile; empty at zoom 0.
    pub fn quadkey(&self) -> String {
        (1..=self.zoom())
            .rev()
            .map(|level| {
                let mask = 1u32 << (level - 1);
                let mut digit = b'0';
                if self.x() & mask != 0 {
                    digit += 1;
                }
                if self.y() & mask != 0 {
                    digit += 2;
                }
                digit as char
            })
            .collect()
    }
}
