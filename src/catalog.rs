//! Sensor catalog
//!
//! The catalog lists every sensor id the gateway accepts, with its unit,
//! partitioned by monitoring domain. It is built once at startup and shared
//! read-only; every other component validates sensor ids against it.

use crate::error::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monitoring domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Air,
    Water,
}

impl Domain {
    /// Get domain name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Air => "air",
            Domain::Water => "water",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "air" => Ok(Domain::Air),
            "water" => Ok(Domain::Water),
            _ => Err(ValidationError::UnknownDomain(s.to_string())),
        }
    }
}

/// One supported sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorCatalogEntry {
    /// Sensor identifier, matched exactly.
    #[serde(rename = "sensor")]
    pub sensor_id: String,
    /// Monitoring domain.
    pub domain: Domain,
    /// Unit of measurement (empty for unitless or categorical sensors).
    pub unit: String,
}

impl SensorCatalogEntry {
    fn new(sensor_id: &str, domain: Domain, unit: &str) -> Self {
        Self {
            sensor_id: sensor_id.to_string(),
            domain,
            unit: unit.to_string(),
        }
    }
}

/// Air sensors and their units.
const AIR_SENSORS: &[(&str, &str)] = &[
    ("pm10", "µg/m³"),
    ("pm2.5", "µg/m³"),
    ("co", "ppm"),
    ("co2", "ppm"),
    ("temperature", "°C"),
    ("humidity", "%"),
    ("no2", "ppb"),
    ("so2", "ppb"),
];

/// Water sensors and their units.
const WATER_SENSORS: &[(&str, &str)] = &[
    ("total_dissolved_solids", "mg/L"),
    ("odor", ""),
    ("turbidity", "NTU"),
    ("chloride", "mg/L"),
    ("time_of_day", ""),
    ("color", ""),
];

/// Immutable table of supported sensors.
#[derive(Debug, Clone)]
pub struct SensorCatalog {
    entries: Vec<SensorCatalogEntry>,
}

impl Default for SensorCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl SensorCatalog {
    /// The catalog of air and water sensors the gateway ships with.
    pub fn standard() -> Self {
        let entries = AIR_SENSORS
            .iter()
            .map(|(id, unit)| SensorCatalogEntry::new(id, Domain::Air, unit))
            .chain(
                WATER_SENSORS
                    .iter()
                    .map(|(id, unit)| SensorCatalogEntry::new(id, Domain::Water, unit)),
            )
            .collect();
        Self { entries }
    }

    /// Build a catalog from explicit entries.
    ///
    /// Later duplicates of a `(sensor_id, domain)` pair are ignored.
    pub fn from_entries(entries: impl IntoIterator<Item = SensorCatalogEntry>) -> Self {
        let mut deduped: Vec<SensorCatalogEntry> = Vec::new();
        for entry in entries {
            let exists = deduped
                .iter()
                .any(|e| e.domain == entry.domain && e.sensor_id == entry.sensor_id);
            if !exists {
                deduped.push(entry);
            }
        }
        Self { entries: deduped }
    }

    /// Exact, case-sensitive membership test.
    pub fn is_supported(&self, sensor_id: &str, domain: Domain) -> bool {
        self.get(sensor_id, domain).is_some()
    }

    /// Like [`is_supported`](Self::is_supported) but as a validation result.
    pub fn validate(&self, sensor_id: &str, domain: Domain) -> Result<()> {
        if self.is_supported(sensor_id, domain) {
            Ok(())
        } else {
            Err(ValidationError::UnsupportedSensor {
                sensor: sensor_id.to_string(),
                domain: domain.to_string(),
            }
            .into())
        }
    }

    /// Look up a catalog entry.
    pub fn get(&self, sensor_id: &str, domain: Domain) -> Option<&SensorCatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.domain == domain && e.sensor_id == sensor_id)
    }

    /// Unit of a supported sensor.
    pub fn unit(&self, sensor_id: &str, domain: Domain) -> Option<&str> {
        self.get(sensor_id, domain).map(|e| e.unit.as_str())
    }

    /// Sensors of one domain, in catalog order.
    pub fn sensors(&self, domain: Domain) -> impl Iterator<Item = &SensorCatalogEntry> {
        self.entries.iter().filter(move |e| e.domain == domain)
    }

    /// Number of entries across all domains.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
