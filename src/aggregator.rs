//! Per-company hourly series.
//!
//! For one company and date, every requested sensor gets an hour-by-hour
//! simulated series from midnight up to the current local hour, capped at
//! [`MAX_SERIES_HOURS`] points.

use crate::catalog::{Domain, SensorCatalog};
use crate::error::{Result, ValidationError};
use crate::simulator::simulate_value;
use chrono::{DateTime, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed local offset used to derive the current hour (UTC+8).
pub const UTC_OFFSET_HOURS: i32 = 8;

/// Upper bound on points per series.
pub const MAX_SERIES_HOURS: u32 = 19;

/// Aggregator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Offset from UTC of the local clock, in hours.
    pub utc_offset_hours: i32,
    /// Series never extend past this many hours.
    pub max_hours: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: UTC_OFFSET_HOURS,
            max_hours: MAX_SERIES_HOURS,
        }
    }
}

impl AggregatorConfig {
    /// Local hour of day for a UTC instant, in `0..24`.
    pub fn current_hour(&self, now: DateTime<Utc>) -> u32 {
        (now.hour() as i32 + self.utc_offset_hours).rem_euclid(24) as u32
    }

    /// Points per series at a given local hour.
    pub fn series_len(&self, current_hour: u32) -> u32 {
        current_hour.min(self.max_hours)
    }
}

/// Bulk request for one company. Absent fields deserialize empty and fail validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRequest {
    pub sensors: Vec<String>,
    pub date: String,
    pub company: String,
}

/// One hourly value. `time` is `"HH:00"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: String,
    pub value: Option<f64>,
}

/// Series for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySensorSeries {
    pub sensor: String,
    pub data: Vec<TimeSeriesPoint>,
}

/// Aggregated result for one company and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAggregate {
    pub company: String,
    pub date: String,
    pub now: DateTime<Utc>,
    pub current_hour: u32,
    pub sensors: Vec<CompanySensorSeries>,
}

impl CompanyAggregate {
    /// Total number of points across all series.
    pub fn point_count(&self) -> usize {
        self.sensors.iter().map(|s| s.data.len()).sum()
    }
}

/// Builds [`CompanyAggregate`]s against a shared catalog.
#[derive(Debug, Clone)]
pub struct CompanyAggregator<'a> {
    catalog: &'a SensorCatalog,
    config: AggregatorConfig,
}

impl<'a> CompanyAggregator<'a> {
    /// Create an aggregator with the default configuration.
    pub fn new(catalog: &'a SensorCatalog) -> Self {
        Self::with_config(catalog, AggregatorConfig::default())
    }

    /// Create an aggregator with a custom configuration.
    pub fn with_config(catalog: &'a SensorCatalog, config: AggregatorConfig) -> Self {
        Self { catalog, config }
    }

    /// Get configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Check a request without generating anything.
    ///
    /// Sensors are checked in request order; the first unsupported one is
    /// reported.
    pub fn validate(&self, request: &CompanyRequest, domain: Domain) -> Result<()> {
        if request.company.trim().is_empty() {
            return Err(ValidationError::MissingField("company".to_string()).into());
        }
        if request.date.trim().is_empty() {
            return Err(ValidationError::MissingField("date".to_string()).into());
        }
        if request.sensors.is_empty() {
            return Err(ValidationError::MissingField("sensors".to_string()).into());
        }
        for (field, value) in [("company", &request.company), ("date", &request.date)] {
            if !is_filename_safe(value) {
                return Err(ValidationError::invalid(
                    field,
                    "must not contain control characters or double quotes",
                )
                .into());
            }
        }
        for sensor in &request.sensors {
            self.catalog.validate(sensor, domain)?;
        }
        Ok(())
    }

    /// Validate the request, then simulate one series per sensor.
    ///
    /// `now` is read once; every series in the result has the same length.
    pub fn aggregate<R: Rng + ?Sized>(
        &self,
        request: &CompanyRequest,
        domain: Domain,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<CompanyAggregate> {
        self.validate(request, domain)?;

        let current_hour = self.config.current_hour(now);
        let hours = self.config.series_len(current_hour);

        let mut sensors = Vec::with_capacity(request.sensors.len());
        for sensor in &request.sensors {
            let mut data = Vec::with_capacity(hours as usize);
            for hour in 0..hours {
                data.push(TimeSeriesPoint {
                    time: hour_label(hour),
                    value: simulate_value(sensor, domain, &mut *rng),
                });
            }
            sensors.push(CompanySensorSeries {
                sensor: sensor.clone(),
                data,
            });
        }

        Ok(CompanyAggregate {
            company: request.company.clone(),
            date: request.date.clone(),
            now,
            current_hour,
            sensors,
        })
    }
}

/// Company and date end up in a quoted download filename.
fn is_filename_safe(value: &str) -> bool {
    !value.chars().any(|c| c.is_control() || c == '"')
}

/// `"HH:00"` for an hour of day.
pub fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}
