//! Benchmark record model.
//!
//! The performance binary prints a JSON array with one object per CRC
//! variant. Each object describes the CRC parameters and holds one raw
//! measurement per implementation strategy.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Parameters of the CRC variant a record was measured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrcInfo {
    pub name: String,
    /// Bit width of the polynomial; x-axis of the plotted series.
    pub poly_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poly: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_reflected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_reflected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<u64>,
}

/// One entry of the benchmark output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    #[serde(rename = "CRC")]
    pub crc: CrcInfo,
    /// Raw measurement (elapsed nanoseconds) per implementation, in the
    /// order the benchmark emitted them. Kept as JSON numbers so integer
    /// counts stay exact until they are scaled.
    pub implementation: IndexMap<String, Number>,
}

impl BenchmarkRecord {
    /// Raw measurement for `name`, if this record has one.
    pub fn measurement(&self, name: &str) -> Option<f64> {
        self.implementation.get(name).and_then(Number::as_f64)
    }
}

/// Strip UTF-8 BOM (U+FEFF, bytes EF BB BF) from the beginning of a buffer.
pub fn strip_bom(buf: &mut Vec<u8>) {
    if buf.starts_with(&[0xEF, 0xBB, 0xBF]) {
        buf.drain(..3);
    }
}

/// Decode the benchmark's standard output into records, preserving order.
pub fn decode_records(mut buf: Vec<u8>) -> Result<Vec<BenchmarkRecord>> {
    strip_bom(&mut buf);
    let text = std::str::from_utf8(&buf).context("benchmark output is not valid UTF-8")?;
    serde_json::from_str(text).context("failed to parse benchmark JSON")
}
