use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::Level;

use crcreport::latex::{DEFAULT_COMPILER, DocumentCompiler};
use crcreport::pipeline::{DEFAULT_BENCHMARK, DEFAULT_CSV, DEFAULT_REPORT_SOURCE, PipelineConfig};
use crcreport::reshape::DEFAULT_IMPLEMENTATIONS;
use crcreport::runner::ExitStatusPolicy;

#[derive(Parser)]
#[command(
    name = "crcreport",
    about = "Run the CRC performance benchmark and build the PDF report",
    version
)]
struct Cli {
    /// Benchmark executable; must print the results as JSON on stdout
    #[arg(long, default_value = DEFAULT_BENCHMARK)]
    benchmark: PathBuf,

    /// LaTeX source of the report
    #[arg(long, default_value = DEFAULT_REPORT_SOURCE)]
    report: PathBuf,

    /// Output CSV read by the report
    #[arg(long, default_value = DEFAULT_CSV)]
    csv: PathBuf,

    /// Document compiler, run twice in nonstop mode
    #[arg(long, default_value = DEFAULT_COMPILER)]
    compiler: String,

    /// Implementations every benchmark record must contain (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_IMPLEMENTATIONS.iter().map(|s| s.to_string()))]
    implementations: Vec<String>,

    /// Also write the per-implementation plot series as JSON
    #[arg(long)]
    series: Option<PathBuf>,

    /// Use the benchmark output even if it exits with an error
    #[arg(long)]
    ignore_exit_status: bool,

    /// Stop after writing the CSV
    #[arg(long)]
    skip_compile: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            benchmark: self.benchmark,
            exit_status: if self.ignore_exit_status {
                ExitStatusPolicy::Ignore
            } else {
                ExitStatusPolicy::Strict
            },
            implementations: self.implementations,
            csv: self.csv,
            series: self.series,
            report_source: self.report,
            compiler: DocumentCompiler::new(self.compiler),
            skip_compile: self.skip_compile,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let config = cli.into_config();
    let summary = crcreport::run(&config)?;
    tracing::info!(
        records = summary.records,
        implementations = summary.implementations,
        columns = summary.columns,
        "report done"
    );

    Ok(())
}
