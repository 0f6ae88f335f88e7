//! # SensorGate - Sensor simulation and aggregation core
//!
//! The data side of an air and water monitoring gateway: which sensors exist,
//! what plausible readings look like, and how they are rolled up and exported.
//!
//! ## Key Features
//!
//! - **Sensor catalog**: Supported sensor ids and units per monitoring domain
//! - **Simulation**: Table-driven readings with injectable randomness
//! - **Hourly aggregation**: Per-company series up to the current local hour
//! - **Export**: Flat `time,sensor,value` CSV with a synthesized filename
//! - **Explanations**: Simplified ML feature contributions
//!
//! ## Quick Start
//!
//! ```rust
//! use sensorgate::{CompanyAggregator, CompanyRequest, Domain, SensorCatalog};
//! use chrono::{TimeZone, Utc};
//! use rand::SeedableRng;
//!
//! let catalog = SensorCatalog::standard();
//! let aggregator = CompanyAggregator::new(&catalog);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//!
//! let request = CompanyRequest {
//!     sensors: vec!["pm10".to_string(), "co2".to_string()],
//!     date: "2025-06-30".to_string(),
//!     company: "acme".to_string(),
//! };
//!
//! // 02:00 UTC is 10:00 at UTC+8, so each series has ten hourly points
//! let now = Utc.with_ymd_and_hms(2025, 6, 30, 2, 0, 0).unwrap();
//! let result = aggregator.aggregate(&request, Domain::Air, now, &mut rng).unwrap();
//! assert_eq!(result.sensors[0].data.len(), 10);
//!
//! let export = sensorgate::to_csv(&result).unwrap();
//! assert_eq!(export.filename, "acme,2025-06-30.csv");
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Supported sensors and monitoring domains
//! - [`geo`]: Haversine distance, bounding boxes, named regions
//! - [`simulator`]: Per-sensor value generation and status buckets
//! - [`trend`]: Daily trends, threshold alerts, radius filtering
//! - [`aggregator`]: Hourly per-company series
//! - [`export`]: CSV export
//! - [`features`]: ML feature contribution simplification

// Modules
pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod export;
pub mod features;
pub mod geo;
pub mod simulator;
pub mod trend;

// Re-exports for convenient access
pub use aggregator::{
    AggregatorConfig, CompanyAggregate, CompanyAggregator, CompanyRequest, CompanySensorSeries,
    TimeSeriesPoint,
};
pub use catalog::{Domain, SensorCatalog, SensorCatalogEntry};
pub use error::{Result, SensorGateError, ValidationError};
pub use export::{to_csv, CsvExport};
pub use features::{simplify, simplify_optional, FeatureContribution};
pub use geo::{distance_km, BoundingBox, GeoRegion, Location, Positioned, RegionTable};
pub use simulator::{classify_status, simulate_reading, simulate_value, SensorReading, Status};
pub use trend::{
    filter_by_radius, filter_exceedances, find_alerts, generate_trend, parse_date, Exceedance,
    TrendPoint,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
