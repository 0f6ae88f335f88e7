//! CSV export of company aggregates.
//!
//! The nested per-sensor series are flattened into `time,sensor,value` rows,
//! sensors first, then hours, in the order the aggregator produced them.

use crate::aggregator::CompanyAggregate;
use crate::error::{Result, SensorGateError};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Header row of every export.
pub const CSV_HEADER: [&str; 3] = ["time", "sensor", "value"];

/// A ready-to-download CSV document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// `"<company>,<date>.csv"`. Commas inside company or date are kept as is.
    pub filename: String,
    /// Rows joined by `\n`, no trailing newline.
    pub content: String,
}

impl CsvExport {
    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Filename for an aggregate's export.
pub fn export_filename(company: &str, date: &str) -> String {
    format!("{company},{date}.csv")
}

/// Flatten an aggregate into CSV. Missing values become empty fields.
///
/// Fields are written verbatim, never quoted.
pub fn to_csv(aggregate: &CompanyAggregate) -> Result<CsvExport> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for series in &aggregate.sensors {
        for point in &series.data {
            let value = point.value.map(|v| v.to_string()).unwrap_or_default();
            writer.write_record([point.time.as_str(), series.sensor.as_str(), value.as_str()])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SensorGateError::Export(e.to_string()))?;
    let mut content =
        String::from_utf8(bytes).map_err(|e| SensorGateError::Export(e.to_string()))?;
    if content.ends_with('\n') {
        content.pop();
    }

    Ok(CsvExport {
        filename: export_filename(&aggregate.company, &aggregate.date),
        content,
    })
}
