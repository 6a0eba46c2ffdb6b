//! Slippy-map tile grid.
//!
//! Tiles use the Web Mercator scheme: at zoom `z` the world is a
//! `2^z × 2^z` grid, `x` growing eastward from the antimeridian and `y`
//! growing southward from about 85.05°N.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::TileError;

/// Highest zoom level tile servers publish.
pub const MAX_ZOOM: u8 = 19;

/// Latitude limit of the Web Mercator projection.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Kilometres per degree of latitude.
const KM_PER_DEGREE: f64 = 111.044;

/// A point on the earth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Address of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// A tile address, if `x` and `y` lie on the grid at zoom `z`.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, TileError> {
        let key = Self { z, x, y };
        if z > MAX_ZOOM || x >= key.grid_size() || y >= key.grid_size() {
            return Err(TileError::InvalidKey(key.to_string()));
        }
        Ok(key)
    }

    /// Tiles per side at this key's zoom.
    pub fn grid_size(&self) -> u32 {
        1u32 << self.z.min(MAX_ZOOM)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

impl FromStr for TileKey {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TileError::InvalidKey(s.to_string());
        let mut parts = s.trim_end_matches(".png").split('/');
        let (Some(z), Some(x), Some(y), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        TileKey::new(
            z.parse().map_err(|_| invalid())?,
            x.parse().map_err(|_| invalid())?,
            y.parse().map_err(|_| invalid())?,
        )
    }
}

/// The tile containing `point` at `zoom`, clamped onto the grid.
pub fn lat_lng_to_tile(point: LatLng, zoom: u8) -> TileKey {
    let z = zoom.min(MAX_ZOOM);
    let n = f64::from(1u32 << z);
    let max_index = (1u32 << z) - 1;

    let x = ((point.lng + 180.0) / 360.0 * n).floor();

    let lat_rad = point.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    TileKey {
        z,
        x: clamp_index(x, max_index),
        y: clamp_index(y, max_index),
    }
}

fn clamp_index(v: f64, max_index: u32) -> u32 {
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= f64::from(max_index) {
        max_index
    } else {
        v as u32
    }
}

/// A latitude/longitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    fn corners(&self) -> [LatLng; 4] {
        [
            LatLng::new(self.north, self.west),
            LatLng::new(self.north, self.east),
            LatLng::new(self.south, self.west),
            LatLng::new(self.south, self.east),
        ]
    }
}

/// A circular area to keep offline, over a set of zoom levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub center: LatLng,
    pub radius_km: f64,
    pub zooms: Vec<u8>,
}

impl Region {
    pub fn new(center: LatLng, radius_km: f64, zooms: impl IntoIterator<Item = u8>) -> Self {
        Self {
            center,
            radius_km,
            zooms: zooms.into_iter().collect(),
        }
    }

    /// Greater Boston: 40 miles around downtown, zooms 9 to 15.
    pub fn boston() -> Self {
        Self::new(LatLng::new(42.3601, -71.0589), 40.0 * 1.60934, 9..=15)
    }

    /// Flat-earth bounding box of the region.
    pub fn bounds(&self) -> Bounds {
        let lat_deg = self.radius_km / KM_PER_DEGREE;
        let lng_deg = self.radius_km / (KM_PER_DEGREE * self.center.lat.to_radians().cos());

        Bounds {
            north: self.center.lat + lat_deg,
            south: self.center.lat - lat_deg,
            east: self.center.lng + lng_deg,
            west: self.center.lng - lng_deg,
        }
    }

    /// Every tile covering the region, ordered by zoom, then x, then y,
    /// with no duplicates. Zooms past [`MAX_ZOOM`] count as [`MAX_ZOOM`].
    pub fn tiles(&self) -> Vec<TileKey> {
        let corners = self.bounds().corners();

        let mut zooms: Vec<u8> = self.zooms.iter().map(|&z| z.min(MAX_ZOOM)).collect();
        zooms.sort_unstable();
        zooms.dedup();

        let mut tiles = Vec::new();
        for z in zooms {
            let keys = corners.map(|c| lat_lng_to_tile(c, z));
            let (Some(min_x), Some(max_x)) = (
                keys.iter().map(|k| k.x).min(),
                keys.iter().map(|k| k.x).max(),
            ) else {
                continue;
            };
            let (Some(min_y), Some(max_y)) = (
                keys.iter().map(|k| k.y).min(),
                keys.iter().map(|k| k.y).max(),
            ) else {
                continue;
            };

            for x in min_x..=max_x {
                for y in min_y..=max_y {
                    tiles.push(TileKey { z, x, y });
                }
            }
        }

        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::{BTreeMap, HashSet};

    #[test]
    fn known_tiles() {
        let boston = LatLng::new(42.3601, -71.0589);
        assert_eq!(lat_lng_to_tile(boston, 0), TileKey { z: 0, x: 0, y: 0 });
        assert_eq!(lat_lng_to_tile(boston, 12), TileKey { z: 12, x: 1239, y: 1514 });
    }

    #[test]
    fn extreme_points_are_clamped() {
        let key = lat_lng_to_tile(LatLng::new(89.9, 180.0), 10);
        assert_eq!((key.x, key.y), (1023, 0));

        let key = lat_lng_to_tile(LatLng::new(-89.9, -180.0), 10);
        assert_eq!((key.x, key.y), (0, 1023));
    }

    #[test]
    fn key_parsing() {
        let key: TileKey = "12/1239/1514".parse().unwrap();
        assert_eq!(key, TileKey { z: 12, x: 1239, y: 1514 });
        assert_eq!(key.to_string(), "12/1239/1514");
        assert_eq!("3/1/2.png".parse::<TileKey>().unwrap(), TileKey { z: 3, x: 1, y: 2 });

        assert!("12/1239".parse::<TileKey>().is_err());
        assert!("12/1239/1514/1".parse::<TileKey>().is_err());
        assert!("2/4/0".parse::<TileKey>().is_err());
        assert!("a/b/c".parse::<TileKey>().is_err());
        assert!("20/0/0".parse::<TileKey>().is_err());
    }

    #[test]
    fn boston_bounds_are_symmetric() {
        let region = Region::boston();
        let bounds = region.bounds();

        assert!((bounds.north - 42.3601 - 64.3736 / 111.044).abs() < 1e-9);
        assert!((bounds.north - 42.3601 - (42.3601 - bounds.south)).abs() < 1e-9);
        assert!(bounds.east - bounds.west > bounds.north - bounds.south);
    }

    #[test]
    fn boston_region_is_nonempty_at_every_zoom() {
        let tiles = Region::boston().tiles();
        let zooms: HashSet<u8> = tiles.iter().map(|t| t.z).collect();
        assert_eq!(zooms, (9..=15).collect::<HashSet<u8>>());
    }

    #[test]
    fn repeated_zooms_do_not_duplicate_tiles() {
        let once = Region::new(LatLng::new(42.3601, -71.0589), 10.0, [11, 12]).tiles();
        let twice = Region::new(LatLng::new(42.3601, -71.0589), 10.0, [12, 11, 12]).tiles();
        assert_eq!(once, twice);
    }

    #[test]
    fn zooms_past_max_are_clamped_once() {
        let clamped = Region::new(LatLng::new(42.3601, -71.0589), 1.0, [19, 20]).tiles();
        let max_only = Region::new(LatLng::new(42.3601, -71.0589), 1.0, [19]).tiles();

        let unique: HashSet<TileKey> = clamped.iter().copied().collect();
        assert_eq!(unique.len(), clamped.len());
        assert!(clamped.iter().all(|t| t.z == MAX_ZOOM));
        assert_eq!(clamped, max_only);
    }

    /// Group tiles by zoom and check each zoom forms a full rectangle.
    fn assert_contiguous(tiles: &[TileKey]) -> Result<(), TestCaseError> {
        let mut by_zoom: BTreeMap<u8, Vec<TileKey>> = BTreeMap::new();
        for t in tiles {
            by_zoom.entry(t.z).or_default().push(*t);
        }
        for (z, keys) in by_zoom {
            let min_x = keys.iter().map(|k| k.x).min().unwrap();
            let max_x = keys.iter().map(|k| k.x).max().unwrap();
            let min_y = keys.iter().map(|k| k.y).min().unwrap();
            let max_y = keys.iter().map(|k| k.y).max().unwrap();
            let expected = ((max_x - min_x + 1) * (max_y - min_y + 1)) as usize;
            prop_assert_eq!(keys.len(), expected, "zoom {} is not a full rectangle", z);
            prop_assert!(keys.iter().all(|k| k.x < k.grid_size() && k.y < k.grid_size()));
        }
        Ok(())
    }

    #[test]
    fn boston_100km_precompute() {
        let region = Region::new(LatLng::new(42.3601, -71.0589), 100.0, 9..=15);
        let tiles = region.tiles();

        let unique: HashSet<TileKey> = tiles.iter().copied().collect();
        assert_eq!(unique.len(), tiles.len());
        assert_contiguous(&tiles).unwrap();

        let centre = lat_lng_to_tile(region.center, 15);
        assert!(tiles.contains(&centre));
    }

    proptest! {
        #[test]
        fn precompute_is_contiguous_and_unique(
            lat in -70.0f64..70.0,
            lng in -179.0f64..179.0,
            radius_km in 0.5f64..100.0,
            low in 0u8..12,
            span in 0u8..4,
        ) {
            let region = Region::new(LatLng::new(lat, lng), radius_km, low..=low + span);
            let tiles = region.tiles();

            let unique: HashSet<TileKey> = tiles.iter().copied().collect();
            prop_assert_eq!(unique.len(), tiles.len());
            assert_contiguous(&tiles)?;
        }
    }
}
