pub mod latex;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod reshape;
pub mod runner;

pub use pipeline::{PipelineConfig, PipelineSummary, run};
pub use record::{BenchmarkRecord, CrcInfo, decode_records};
pub use report::{CsvError, CsvSchema, write_csv, write_csv_file};
pub use reshape::{PivotTable, ReshapeError, Series, SeriesTable, build_pivot, build_series};
pub use runner::{ExitStatusPolicy, run_benchmark};
