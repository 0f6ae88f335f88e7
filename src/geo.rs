//! Geodesic helpers and the named region table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in km (haversine).
///
/// NaN inputs propagate to a NaN result.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub long: f64,
}

/// Anything that sits at a point on the map.
pub trait Positioned {
    /// `(lat, long)` in degrees.
    fn position(&self) -> (f64, f64);
}

impl Positioned for Location {
    fn position(&self) -> (f64, f64) {
        (self.lat, self.long)
    }
}

/// Rectangular lat/long region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub long_min: f64,
    pub long_max: f64,
}

impl BoundingBox {
    /// Inclusive on all four edges.
    pub fn contains(&self, lat: f64, long: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && long >= self.long_min && long <= self.long_max
    }
}

/// A named region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRegion {
    pub name: String,
    pub bounding_box: BoundingBox,
}

/// Read-only lookup of regions by lowercase name.
#[derive(Debug, Clone)]
pub struct RegionTable {
    regions: HashMap<String, GeoRegion>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RegionTable {
    /// Regions the gateway ships with.
    pub fn standard() -> Self {
        Self::from_regions([GeoRegion {
            name: "penang".to_string(),
            bounding_box: BoundingBox {
                lat_min: 5.2,
                lat_max: 5.5,
                long_min: 100.2,
                long_max: 100.4,
            },
        }])
    }

    /// Build a table; names are stored lowercase.
    pub fn from_regions(regions: impl IntoIterator<Item = GeoRegion>) -> Self {
        let regions = regions
            .into_iter()
            .map(|mut r| {
                r.name = r.name.to_lowercase();
                (r.name.clone(), r)
            })
            .collect();
        Self { regions }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&GeoRegion> {
        self.regions.get(&name.to_lowercase())
    }

    /// Region names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.regions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine() {
        // New York to Los Angeles (approximate)
        let d = distance_km(40.7128, -74.0060, 34.0522, -118.2437);
        // Should be around 3940 km
        assert!((d - 3940.0).abs() < 100.0);
    }

    #[test]
    fn test_distance_symmetric_and_zero() {
        let pairs = [
            (5.4141, 100.3288, 3.1390, 101.6869),
            (-33.8688, 151.2093, 51.5074, -0.1278),
            (0.0, 179.9, 0.0, -179.9),
        ];
        for (a, b, c, d) in pairs {
            assert_relative_eq!(distance_km(a, b, c, d), distance_km(c, d, a, b));
            assert_eq!(distance_km(a, b, a, b), 0.0);
        }
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(d, EARTH_RADIUS_KM * 1f64.to_radians(), epsilon = 1e-9);
    }

    #[test]
    fn test_distance_nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 1.0, 1.0).is_nan());
    }

    #[test]
    fn test_bounding_box_edges_inclusive() {
        let table = RegionTable::standard();
        let bb = table.get("penang").unwrap().bounding_box;
        assert!(bb.contains(5.2, 100.2));
        assert!(bb.contains(5.5, 100.4));
        assert!(bb.contains(5.35, 100.3));
        assert!(!bb.contains(5.19, 100.3));
        assert!(!bb.contains(5.35, 100.41));
    }

    #[test]
    fn test_region_lookup_case_insensitive() {
        let table = RegionTable::standard();
        assert!(table.get("Penang").is_some());
        assert!(table.get("PENANG").is_some());
        assert!(table.get("kuala lumpur").is_none());
        assert_eq!(table.names(), vec!["penang"]);
    }

    #[test]
    fn test_bounding_box_serde_field_names() {
        let table = RegionTable::standard();
        let json = serde_json::to_value(table.get("penang").unwrap()).unwrap();
        assert_eq!(json["boundingBox"]["latMin"], 5.2);
        assert_eq!(json["boundingBox"]["longMax"], 100.4);
    }
}
