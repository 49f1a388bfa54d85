//! CSV output of the pivot table.
//!
//! The column set is the union of CRC names across all rows, in first-seen
//! order, and every row has to cover exactly that set. Rows are checked before
//! anything is written, so a rejected table leaves the previous file in place.

use std::io::Write;
use std::path::Path;

use indexmap::IndexSet;
use thiserror::Error;

use crate::reshape::PivotTable;

/// Name of the leading column holding the implementation name.
pub const IMPLEMENTATION_COLUMN: &str = "implementation";

#[derive(Debug, Error)]
pub enum CsvError {
    #[error(
        "implementation '{implementation}' has no value for {}; every implementation must be measured on the same CRC set",
        .missing.join(", ")
    )]
    RaggedRow {
        implementation: String,
        missing: Vec<String>,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Validated column layout of a pivot table.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvSchema {
    /// CRC name columns, after the implementation column.
    pub columns: Vec<String>,
}

impl CsvSchema {
    pub fn from_pivot(pivot: &PivotTable) -> Result<Self, CsvError> {
        let union: IndexSet<&str> = pivot
            .values()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let columns: Vec<String> = union.into_iter().map(str::to_string).collect();

        for (implementation, row) in pivot {
            let missing: Vec<String> = columns
                .iter()
                .filter(|c| !row.contains_key(c.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(CsvError::RaggedRow {
                    implementation: implementation.clone(),
                    missing,
                });
            }
        }

        Ok(Self { columns })
    }

    pub fn header(&self) -> Vec<&str> {
        std::iter::once(IMPLEMENTATION_COLUMN)
            .chain(self.columns.iter().map(String::as_str))
            .collect()
    }
}

/// Write `pivot` as CSV to `writer`.
pub fn write_csv<W: Write>(pivot: &PivotTable, writer: W) -> Result<CsvSchema, CsvError> {
    let schema = CsvSchema::from_pivot(pivot)?;

    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(schema.header())?;

    for (implementation, row) in pivot {
        let mut record = Vec::with_capacity(schema.columns.len() + 1);
        record.push(implementation.clone());
        for column in &schema.columns {
            // Presence checked by from_pivot.
            let value = row.get(column.as_str()).copied().unwrap_or(f64::NAN);
            record.push(format_measurement(value));
        }
        wtr.write_record(&record)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(schema)
}

/// Render the table in memory, then replace the file at `path`.
pub fn write_csv_file(pivot: &PivotTable, path: &Path) -> Result<CsvSchema, CsvError> {
    let mut buf = Vec::new();
    let schema = write_csv(pivot, &mut buf)?;
    std::fs::write(path, &buf).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        rows = pivot.len(),
        columns = schema.columns.len(),
        "wrote CSV"
    );
    Ok(schema)
}

/// Shortest digits that parse back to the same f64, laid out the way
/// Python's `repr` does: positional for decimal exponents -4..16 with at least
/// one fractional digit (`32.0`, `0.0001`), scientific otherwise with a signed
/// two-digit exponent (`5e-06`, `1e+16`).
pub fn format_measurement(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut buf = ryu::Buffer::new();
    let (negative, digits, exp) = shortest_digits(buf.format_finite(f));
    let sign = if negative { "-" } else { "" };
    if digits.is_empty() {
        return format!("{sign}0.0");
    }

    if (-4..16).contains(&exp) {
        if exp >= 0 {
            let int_len = exp as usize + 1;
            if digits.len() <= int_len {
                let zeros = "0".repeat(int_len - digits.len());
                format!("{sign}{digits}{zeros}.0")
            } else {
                format!("{sign}{}.{}", &digits[..int_len], &digits[int_len..])
            }
        } else {
            let zeros = "0".repeat((-exp - 1) as usize);
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let (lead, rest) = digits.split_at(1);
        let dot = if rest.is_empty() { "" } else { "." };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{sign}{lead}{dot}{rest}e{exp_sign}{:02}", exp.unsigned_abs())
    }
}

/// Split ryu output into sign, significant digits (no leading/trailing
/// zeros) and the decimal exponent of the first digit.
fn shortest_digits(s: &str) -> (bool, String, i32) {
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (mantissa, exp) = match s.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (s, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all: String = int_part.chars().chain(frac_part.chars()).collect();
    let Some(first) = all.find(|c| c != '0') else {
        return (negative, String::new(), 0);
    };
    let digits = all[first..].trim_end_matches('0').to_string();
    let exp = int_part.len() as i32 - 1 - first as i32 + exp;
    (negative, digits, exp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use proptest::prelude::*;

    fn pivot(rows: &[(&str, &[(&str, f64)])]) -> PivotTable {
        rows.iter()
            .map(|(name, cells)| {
                let row: IndexMap<String, f64> =
                    cells.iter().map(|(k, v)| (k.to_string(), *v)).collect();
                (name.to_string(), row)
            })
            .collect()
    }

    fn render(p: &PivotTable) -> String {
        let mut buf = Vec::new();
        write_csv(p, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn single_row() {
        let p = pivot(&[("BitShift", &[("CRC32", 32.0)])]);
        assert_eq!(render(&p), "implementation,CRC32\nBitShift,32.0\n");
    }

    #[test]
    fn rows_and_columns_keep_pivot_order() {
        let p = pivot(&[
            ("BitShift", &[("CRC8", 5.2), ("CRC32", 20.25)]),
            ("Table256", &[("CRC8", 0.9), ("CRC32", 1.5)]),
        ]);
        assert_eq!(
            render(&p),
            "implementation,CRC8,CRC32\nBitShift,5.2,20.25\nTable256,0.9,1.5\n"
        );
    }

    #[test]
    fn rows_with_different_key_order_share_header_order() {
        let p = pivot(&[
            ("BitShift", &[("CRC8", 1.0), ("CRC32", 2.0)]),
            ("Table256", &[("CRC32", 4.0), ("CRC8", 3.0)]),
        ]);
        assert_eq!(
            render(&p),
            "implementation,CRC8,CRC32\nBitShift,1.0,2.0\nTable256,3.0,4.0\n"
        );
    }

    #[test]
    fn empty_pivot_writes_header_only() {
        assert_eq!(render(&PivotTable::new()), "implementation\n");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let p = pivot(&[
            ("BitShift", &[("CRC8", 1.0), ("CRC32", 2.0)]),
            ("Table256", &[("CRC8", 3.0)]),
        ]);
        let err = write_csv(&p, Vec::new()).unwrap_err();
        match &err {
            CsvError::RaggedRow {
                implementation,
                missing,
            } => {
                assert_eq!(implementation, "Table256");
                assert_eq!(missing, &["CRC32".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("'Table256' has no value for CRC32"));
    }

    #[test]
    fn ragged_row_detected_when_first_row_is_short() {
        let p = pivot(&[
            ("BitShift", &[("CRC8", 1.0)]),
            ("Table256", &[("CRC8", 3.0), ("CRC32", 2.0)]),
        ]);
        let err = CsvSchema::from_pivot(&p).unwrap_err();
        assert!(matches!(err, CsvError::RaggedRow { ref implementation, .. } if implementation == "BitShift"));
    }

    #[test]
    fn rejected_table_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "previous run\n").unwrap();
        let p = pivot(&[("A", &[("CRC8", 1.0)]), ("B", &[("CRC16", 1.0)])]);
        assert!(write_csv_file(&p, &path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous run\n");
    }

    #[test]
    fn write_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "previous run, much longer than the new content\n").unwrap();
        let p = pivot(&[("BitShift", &[("CRC32", 32.0)])]);
        write_csv_file(&p, &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "implementation,CRC32\nBitShift,32.0\n"
        );
    }

    #[test]
    fn write_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("data.csv");
        let err = write_csv_file(&PivotTable::new(), &path).unwrap_err();
        assert!(matches!(err, CsvError::Io { .. }));
    }

    #[test]
    fn format_integers_keep_fraction() {
        assert_eq!(format_measurement(32.0), "32.0");
        assert_eq!(format_measurement(0.0), "0.0");
        assert_eq!(format_measurement(-5.0), "-5.0");
    }

    #[test]
    fn format_fractions() {
        assert_eq!(format_measurement(0.5), "0.5");
        assert_eq!(format_measurement(123.456), "123.456");
        assert_eq!(format_measurement(0.0001), "0.0001");
        assert_eq!(format_measurement(0.00012), "0.00012");
        assert_eq!(format_measurement(1e15), "1000000000000000.0");
        assert_eq!(format_measurement(-0.25), "-0.25");
    }

    #[test]
    fn format_small_and_large_use_exponent() {
        assert_eq!(format_measurement(5e-6), "5e-06");
        assert_eq!(format_measurement(1e-5), "1e-05");
        assert_eq!(format_measurement(1.5e-7), "1.5e-07");
        assert_eq!(format_measurement(1e16), "1e+16");
        assert_eq!(format_measurement(1e20), "1e+20");
        assert_eq!(format_measurement(1.23e100), "1.23e+100");
        assert_eq!(format_measurement(-2.5e-300), "-2.5e-300");
    }

    #[test]
    fn five_nanoseconds_scaled() {
        let p = pivot(&[("BitShift", &[("CRC8", 5.0 / 1_000_000.0)])]);
        assert_eq!(render(&p), "implementation,CRC8\nBitShift,5e-06\n");
    }

    #[test]
    fn format_non_finite() {
        assert_eq!(format_measurement(f64::NAN), "nan");
        assert_eq!(format_measurement(f64::INFINITY), "inf");
        assert_eq!(format_measurement(f64::NEG_INFINITY), "-inf");
    }

    proptest! {
        #[test]
        fn csv_values_parse_back_exactly(
            values in prop::collection::vec(0u64..100_000_000_000, 1..8)
        ) {
            let cells: Vec<(String, f64)> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("CRC{i}"), *v as f64 / 1_000_000.0))
                .collect();
            let mut p = PivotTable::new();
            p.insert("BitShift".to_string(), cells.iter().cloned().collect());

            let mut buf = Vec::new();
            write_csv(&p, &mut buf).unwrap();

            let mut rdr = csv::Reader::from_reader(buf.as_slice());
            let headers = rdr.headers().unwrap().clone();
            prop_assert_eq!(&headers[0], IMPLEMENTATION_COLUMN);
            let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
            prop_assert_eq!(rows.len(), 1);
            prop_assert_eq!(&rows[0][0], "BitShift");
            for (i, (name, value)) in cells.iter().enumerate() {
                prop_assert_eq!(&headers[i + 1], name.as_str());
                let parsed: f64 = rows[0][i + 1].parse().unwrap();
                prop_assert_eq!(parsed, *value);
            }
        }
    }
}
