//! Runs the external CRC performance binary and decodes its output.
//!
//! The child is spawned without arguments and waited on synchronously; there
//! is no timeout. Only standard output is captured, stderr passes through to
//! the terminal.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::record::{BenchmarkRecord, decode_records};

/// What to do when the benchmark exits with a non-zero status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatusPolicy {
    /// Fail before decoding anything.
    #[default]
    Strict,
    /// Log a warning and decode whatever was printed.
    Ignore,
}

/// Spawn `exe`, wait for it, and decode its stdout as benchmark records.
pub fn run_benchmark(exe: &Path, policy: ExitStatusPolicy) -> Result<Vec<BenchmarkRecord>> {
    tracing::info!(exe = %exe.display(), "running benchmark");
    let output = Command::new(exe)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .with_context(|| format!("failed to run benchmark: {}", exe.display()))?;

    check_status(exe, output.status, policy)?;
    tracing::debug!(bytes = output.stdout.len(), "captured benchmark output");

    let records = decode_records(output.stdout)
        .with_context(|| format!("invalid output from benchmark: {}", exe.display()))?;
    tracing::info!(records = records.len(), "decoded benchmark records");
    Ok(records)
}

fn check_status(exe: &Path, status: ExitStatus, policy: ExitStatusPolicy) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    match policy {
        ExitStatusPolicy::Strict => bail!("benchmark {} exited with {status}", exe.display()),
        ExitStatusPolicy::Ignore => {
            tracing::warn!(exe = %exe.display(), %status, "benchmark failed, using its output anyway");
            Ok(())
        }
    }
}
