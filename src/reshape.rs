//! Reshaping of benchmark records.
//!
//! Two independent passes over the same record slice:
//! - [`build_series`] produces x/y coordinates per implementation for plotting.
//! - [`build_pivot`] produces the wide table written to CSV, one row per
//!   implementation and one column per CRC variant.
//!
//! Both preserve first-seen order so repeated runs over the same benchmark
//! output give identical tables.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Number;
use thiserror::Error;

use crate::record::BenchmarkRecord;

/// Raw measurements are nanoseconds; tables hold milliseconds.
pub const MEASUREMENT_SCALE: f64 = 1_000_000.0;

/// Implementations the performance binary measures for every CRC.
pub const DEFAULT_IMPLEMENTATIONS: &[&str] = &["BitShift", "BitShiftLsb", "Table256", "Table256Lsb"];

/// Integers above this are not exact as f64.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Convert a raw measurement to table units.
///
/// Integer counts too large for an exact f64 are split into whole and
/// fractional milliseconds first, so only the final sum is rounded.
pub fn scale_measurement(raw: &Number) -> f64 {
    let split = |n: u64| {
        let scale = MEASUREMENT_SCALE as u64;
        (n / scale) as f64 + (n % scale) as f64 / MEASUREMENT_SCALE
    };
    if let Some(n) = raw.as_u64().filter(|n| *n > MAX_EXACT_INTEGER) {
        return split(n);
    }
    if let Some(n) = raw.as_i64().filter(|n| n.unsigned_abs() > MAX_EXACT_INTEGER) {
        return -split(n.unsigned_abs());
    }
    raw.as_f64().unwrap_or(f64::NAN) / MEASUREMENT_SCALE
}

#[derive(Debug, Error, PartialEq)]
pub enum ReshapeError {
    #[error("record {record} ({crc}) has no measurement for implementation '{implementation}'")]
    MissingImplementation {
        record: usize,
        crc: String,
        implementation: String,
    },
}

/// Plot coordinates for one implementation. `x[i]` and `y[i]` come from the
/// same record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub x: Vec<u32>,
    pub y: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

pub type SeriesTable = IndexMap<String, Series>;

/// implementation → CRC name → scaled measurement.
pub type PivotTable = IndexMap<String, IndexMap<String, f64>>;

/// Collect poly length / raw measurement pairs for each of `names`.
///
/// Every record must carry a measurement for every requested name. Nothing is
/// returned on failure.
pub fn build_series<S: AsRef<str>>(
    records: &[BenchmarkRecord],
    names: &[S],
) -> Result<SeriesTable, ReshapeError> {
    let mut table: SeriesTable = names
        .iter()
        .map(|n| (n.as_ref().to_string(), Series::default()))
        .collect();

    for (idx, record) in records.iter().enumerate() {
        for name in names {
            let name = name.as_ref();
            let y = record
                .measurement(name)
                .ok_or_else(|| ReshapeError::MissingImplementation {
                    record: idx,
                    crc: record.crc.name.clone(),
                    implementation: name.to_string(),
                })?;
            let series = table.entry(name.to_string()).or_default();
            series.x.push(record.crc.poly_length);
            series.y.push(y);
        }
    }

    Ok(table)
}

/// Pivot records into the implementation × CRC table.
///
/// Row and column keys come from the data itself. A CRC name that appears
/// twice keeps its first column position and takes the later value.
pub fn build_pivot(records: &[BenchmarkRecord]) -> PivotTable {
    let mut pivot = PivotTable::new();
    for record in records {
        for (implementation, raw) in &record.implementation {
            pivot
                .entry(implementation.clone())
                .or_default()
                .insert(record.crc.name.clone(), scale_measurement(raw));
        }
    }
    pivot
}
