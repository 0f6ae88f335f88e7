//! Simulated sensor readings.
//!
//! Every supported sensor has a [`SensorProfile`]: a uniform range and an
//! output precision. One generic routine draws from the profile. Draws are
//! independent; there is no smoothing between calls.

use crate::catalog::Domain;
use crate::geo::Positioned;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a drawn value is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Round to this many decimal places.
    Decimals(u8),
    /// Truncate to an integer category index.
    Category,
}

/// Uniform range and precision for one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorProfile {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Width of the range; values fall in `[min, min + span)` before rounding.
    pub span: f64,
    /// Output precision.
    pub precision: Precision,
}

impl SensorProfile {
    const fn decimals(min: f64, span: f64, places: u8) -> Self {
        Self {
            min,
            span,
            precision: Precision::Decimals(places),
        }
    }

    const fn category(count: f64) -> Self {
        Self {
            min: 0.0,
            span: count,
            precision: Precision::Category,
        }
    }

    /// Upper bound of the range (exclusive before rounding).
    pub fn max(&self) -> f64 {
        self.min + self.span
    }

    /// Draw one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let raw = rng.gen::<f64>() * self.span + self.min;
        match self.precision {
            Precision::Decimals(places) => round_to(raw, places),
            Precision::Category => raw.floor(),
        }
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u8) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

const AIR_PROFILES: &[(&str, SensorProfile)] = &[
    ("pm10", SensorProfile::decimals(10.0, 150.0, 1)),
    ("pm2.5", SensorProfile::decimals(10.0, 150.0, 1)),
    ("co", SensorProfile::decimals(0.5, 9.0, 2)),
    ("co2", SensorProfile::decimals(400.0, 1600.0, 0)),
    ("temperature", SensorProfile::decimals(25.0, 10.0, 1)),
    ("humidity", SensorProfile::decimals(30.0, 60.0, 0)),
    ("no2", SensorProfile::decimals(5.0, 100.0, 1)),
    ("so2", SensorProfile::decimals(5.0, 100.0, 1)),
];

const WATER_PROFILES: &[(&str, SensorProfile)] = &[
    ("total_dissolved_solids", SensorProfile::decimals(10.0, 150.0, 1)),
    ("odor", SensorProfile::decimals(0.5, 9.0, 2)),
    ("turbidity", SensorProfile::decimals(400.0, 1600.0, 0)),
    ("chloride", SensorProfile::decimals(25.0, 10.0, 1)),
    ("time_of_day", SensorProfile::decimals(30.0, 60.0, 0)),
    ("color", SensorProfile::category(5.0)),
];

/// Profile for a sensor, if the simulator knows it.
pub fn profile(sensor_id: &str, domain: Domain) -> Option<SensorProfile> {
    let table = match domain {
        Domain::Air => AIR_PROFILES,
        Domain::Water => WATER_PROFILES,
    };
    table
        .iter()
        .find(|(id, _)| *id == sensor_id)
        .map(|(_, p)| *p)
}

/// Draw a plausible value for a sensor. Unknown sensors yield `None`.
pub fn simulate_value<R: Rng + ?Sized>(sensor_id: &str, domain: Domain, rng: &mut R) -> Option<f64> {
    profile(sensor_id, domain).map(|p| p.sample(rng))
}

/// A single simulated reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor: String,
    pub value: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub long: f64,
}

impl Positioned for SensorReading {
    fn position(&self) -> (f64, f64) {
        (self.lat, self.long)
    }
}

/// Simulate a reading at a position and time.
pub fn simulate_reading<R: Rng + ?Sized>(
    sensor_id: &str,
    domain: Domain,
    lat: f64,
    long: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> SensorReading {
    SensorReading {
        sensor: sensor_id.to_string(),
        value: simulate_value(sensor_id, domain, rng),
        timestamp: now,
        lat,
        long,
    }
}

/// Status bucket for a raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Moderate,
    Unhealthy,
    Hazardous,
}

/// Bucket a raw value. Only the number matters, not the sensor or its unit.
pub fn classify_status(value: f64) -> Status {
    if value < 50.0 {
        Status::Good
    } else if value < 100.0 {
        Status::Moderate
    } else if value < 150.0 {
        Status::Unhealthy
    } else {
        Status::Hazardous
    }
}
