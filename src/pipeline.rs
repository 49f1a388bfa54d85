//! End-to-end report generation: benchmark → tables → CSV → PDF.
//!
//! Stages run strictly in order on the calling thread. Any failure aborts the
//! run; files written by earlier stages are left as they are.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Instant;

use crate::latex::DocumentCompiler;
use crate::report::write_csv_file;
use crate::reshape::{DEFAULT_IMPLEMENTATIONS, SeriesTable, build_pivot, build_series};
use crate::runner::{ExitStatusPolicy, run_benchmark};

pub const DEFAULT_BENCHMARK: &str = "../build/tests/multiplatformPerformance/multiplatformTest";
pub const DEFAULT_REPORT_SOURCE: &str = "report.tex";
pub const DEFAULT_CSV: &str = "data.csv";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub benchmark: PathBuf,
    pub exit_status: ExitStatusPolicy,
    /// Implementations every record must carry; they form the plot series.
    pub implementations: Vec<String>,
    pub csv: PathBuf,
    /// Optional JSON dump of the plot series.
    pub series: Option<PathBuf>,
    pub report_source: PathBuf,
    pub compiler: DocumentCompiler,
    pub skip_compile: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            benchmark: PathBuf::from(DEFAULT_BENCHMARK),
            exit_status: ExitStatusPolicy::default(),
            implementations: DEFAULT_IMPLEMENTATIONS.iter().map(|s| s.to_string()).collect(),
            csv: PathBuf::from(DEFAULT_CSV),
            series: None,
            report_source: PathBuf::from(DEFAULT_REPORT_SOURCE),
            compiler: DocumentCompiler::default(),
            skip_compile: false,
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub records: usize,
    pub implementations: usize,
    pub columns: usize,
    /// One entry per compiler pass; empty when compilation was skipped.
    pub compile_passes: Vec<ExitStatus>,
}

pub fn run(config: &PipelineConfig) -> Result<PipelineSummary> {
    let t0 = Instant::now();
    let records = run_benchmark(&config.benchmark, config.exit_status)?;
    tracing::debug!(elapsed = ?t0.elapsed(), "benchmark stage done");

    let t1 = Instant::now();
    let series = build_series(&records, config.implementations.as_slice())?;
    tracing::debug!(series = ?series, "built plot series");
    if let Some(path) = &config.series {
        write_series(&series, path)?;
    }

    let pivot = build_pivot(&records);
    tracing::debug!(pivot = ?pivot, "built pivot table");
    tracing::debug!(elapsed = ?t1.elapsed(), "reshape stage done");

    let schema = write_csv_file(&pivot, &config.csv)?;

    let compile_passes = if config.skip_compile {
        tracing::info!("skipping report compilation");
        Vec::new()
    } else {
        let t2 = Instant::now();
        let passes = config.compiler.compile_report(&config.report_source)?;
        tracing::debug!(elapsed = ?t2.elapsed(), "compile stage done");
        passes
    };

    Ok(PipelineSummary {
        records: records.len(),
        implementations: pivot.len(),
        columns: schema.columns.len(),
        compile_passes,
    })
}

fn write_series(series: &SeriesTable, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(series).context("failed to serialize series")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write series: {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote plot series");
    Ok(())
}
