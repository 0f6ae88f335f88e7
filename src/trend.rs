//! Daily trends, threshold alerts and radius filtering.

use crate::error::{Result, ValidationError};
use crate::geo::{distance_km, GeoRegion, Location, Positioned, RegionTable};
use crate::simulator::SensorReading;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Range of simulated daily trend values (`[low, high)`).
pub const TREND_VALUE_RANGE: std::ops::Range<u32> = 50..150;

/// One day of a trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Calendar day, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub value: u32,
}

/// Parse a request date.
///
/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (reduced to its UTC date).
pub fn parse_date(field: &str, input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::MissingField(field.to_string()).into());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(input)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| ValidationError::invalid(field, format!("'{input}' is not a date")).into())
}

/// One simulated point per calendar day from `start` to `end` inclusive.
///
/// An inverted range yields no points.
pub fn generate_trend<R: Rng + ?Sized>(start: NaiveDate, end: NaiveDate, rng: &mut R) -> Vec<TrendPoint> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|date| TrendPoint {
            date,
            value: rng.gen_range(TREND_VALUE_RANGE),
        })
        .collect()
}

/// A reading that crossed a threshold, without its sensor id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exceedance {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub location: Location,
}

/// Readings of `sensor_id` above `threshold` inside `region` (edges included).
///
/// Readings without a value never exceed.
pub fn filter_exceedances(
    readings: &[SensorReading],
    sensor_id: &str,
    threshold: f64,
    region: &GeoRegion,
) -> Vec<Exceedance> {
    readings
        .iter()
        .filter(|r| r.sensor == sensor_id)
        .filter(|r| region.bounding_box.contains(r.lat, r.long))
        .filter_map(|r| match r.value {
            Some(value) if value > threshold => Some(Exceedance {
                value,
                timestamp: r.timestamp,
                location: Location {
                    lat: r.lat,
                    long: r.long,
                },
            }),
            _ => None,
        })
        .collect()
}

/// [`filter_exceedances`] with the region looked up by name.
pub fn find_alerts(
    readings: &[SensorReading],
    sensor_id: &str,
    threshold: f64,
    location: &str,
    regions: &RegionTable,
) -> Result<Vec<Exceedance>> {
    let region = regions
        .get(location)
        .ok_or_else(|| ValidationError::UnknownRegion(location.to_string()))?;
    Ok(filter_exceedances(readings, sensor_id, threshold, region))
}

/// Items within `radius_km` of the center (boundary included).
pub fn filter_by_radius<T: Positioned + Clone>(
    items: &[T],
    center_lat: f64,
    center_long: f64,
    radius_km: f64,
) -> Vec<T> {
    items
        .iter()
        .filter(|item| {
            let (lat, long) = item.position();
            distance_km(center_lat, center_long, lat, long) <= radius_km
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorGateError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn reading(sensor: &str, value: Option<f64>, lat: f64, long: f64) -> SensorReading {
        SensorReading {
            sensor: sensor.to_string(),
            value,
            timestamp: DateTime::parse_from_rfc3339("2025-06-30T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            lat,
            long,
        }
    }

    #[test]
    fn test_trend_single_day() {
        let mut rng = StdRng::seed_from_u64(42);
        let trend = generate_trend(date("2025-06-30"), date("2025-06-30"), &mut rng);
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].date, date("2025-06-30"));
        assert!(TREND_VALUE_RANGE.contains(&trend[0].value));
    }

    #[test]
    fn test_trend_inverted_range_is_empty() {
        let mut rng = StdRng::seed_from_u64(42);
        assert!(generate_trend(date("2025-07-02"), date("2025-06-30"), &mut rng).is_empty());
    }

    #[test]
    fn test_trend_spans_month_boundary() {
        let mut rng = StdRng::seed_from_u64(1);
        let trend = generate_trend(date("2025-06-29"), date("2025-07-02"), &mut rng);
        let days: Vec<String> = trend.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(days, vec!["2025-06-29", "2025-06-30", "2025-07-01", "2025-07-02"]);
        assert!(trend.iter().all(|p| TREND_VALUE_RANGE.contains(&p.value)));
    }

    #[test]
    fn test_trend_point_serializes_plain_date() {
        let point = TrendPoint {
            date: date("2025-06-30"),
            value: 77,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"date":"2025-06-30","value":77}"#);
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date("start", "2025-06-30").unwrap(), date("2025-06-30"));
        assert_eq!(
            parse_date("start", "2025-06-30T23:30:00-02:00").unwrap(),
            date("2025-07-01")
        );
        let err = parse_date("end", "yesterday").unwrap_err();
        assert!(err.to_string().contains("end"));
        assert!(matches!(
            parse_date("start", "  "),
            Err(SensorGateError::Validation(ValidationError::MissingField(f))) if f == "start"
        ));
    }

    #[test]
    fn test_exceedances_filters_all_three_ways() {
        let regions = RegionTable::standard();
        let penang = regions.get("penang").unwrap();
        let readings = vec![
            reading("pm10", Some(120.0), 5.3, 100.3),  // kept
            reading("pm10", Some(80.0), 5.3, 100.3),   // below threshold
            reading("pm10", Some(100.0), 5.3, 100.3),  // equal is not above
            reading("co2", Some(900.0), 5.3, 100.3),   // other sensor
            reading("pm10", Some(150.0), 3.1, 101.6),  // outside region
            reading("pm10", Some(130.0), 5.5, 100.2),  // on the corner, kept
            reading("pm10", None, 5.3, 100.3),         // no value
        ];

        let hits = filter_exceedances(&readings, "pm10", 100.0, penang);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].value, 120.0);
        assert_eq!(hits[1].location, Location { lat: 5.5, long: 100.2 });
    }

    #[test]
    fn test_exceedance_drops_sensor_field() {
        let regions = RegionTable::standard();
        let hits = filter_exceedances(
            &[reading("pm10", Some(120.0), 5.3, 100.3)],
            "pm10",
            50.0,
            regions.get("penang").unwrap(),
        );
        let json = serde_json::to_value(&hits[0]).unwrap();
        assert!(json.get("sensor").is_none());
        assert_eq!(json["location"]["lat"], 5.3);
    }

    #[test]
    fn test_find_alerts_unknown_region() {
        let regions = RegionTable::standard();
        let err = find_alerts(&[], "pm10", 1.0, "atlantis", &regions).unwrap_err();
        assert_eq!(
            err,
            SensorGateError::Validation(ValidationError::UnknownRegion("atlantis".into()))
        );
        assert!(find_alerts(&[], "pm10", 1.0, "Penang", &regions).unwrap().is_empty());
    }

    #[test]
    fn test_radius_boundary_inclusive() {
        let center = (5.4, 100.3);
        let near = reading("pm10", Some(1.0), 5.41, 100.3);
        let far = reading("pm10", Some(1.0), 3.14, 101.69);
        let exact = distance_km(center.0, center.1, near.lat, near.long);

        let kept = filter_by_radius(&[near.clone(), far], center.0, center.1, exact);
        assert_eq!(kept, vec![near]);
    }

    #[test]
    fn test_radius_over_locations() {
        let points = [
            Location { lat: 0.0, long: 0.0 },
            Location { lat: 0.0, long: 2.0 },
        ];
        assert_eq!(filter_by_radius(&points, 0.0, 0.0, 150.0).len(), 1);
        assert_eq!(filter_by_radius(&points, 0.0, 0.0, 500.0).len(), 2);
        assert!(filter_by_radius(&points, 0.0, 0.0, -1.0).is_empty());
    }
}
