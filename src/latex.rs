//! PDF report build.
//!
//! The LaTeX source reads `data.csv` and cross-references its own figures and
//! tables, so the compiler runs twice: the first pass writes the `.aux` file,
//! the second resolves references from it. A compiler in nonstop mode exits
//! non-zero on recoverable errors while still producing a PDF, so pass status
//! is reported but never fails the build.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Number of compiler passes needed to resolve cross-references.
pub const LATEX_PASSES: usize = 2;

pub const DEFAULT_COMPILER: &str = "pdflatex";

pub const DEFAULT_COMPILER_ARGS: &[&str] = &["-synctex=1", "-interaction=nonstopmode"];

/// External document compiler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCompiler {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for DocumentCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILER)
    }
}

impl DocumentCompiler {
    /// `program` with the default batch-mode arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: DEFAULT_COMPILER_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn command(&self, source: &Path) -> Command {
        // Same working directory as the caller: relative program paths and
        // the CSV the report reads both resolve from there.
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(source).stdin(Stdio::null());
        cmd
    }

    /// Run one compiler pass and return its exit status.
    pub fn run_pass(&self, source: &Path) -> Result<ExitStatus> {
        self.command(source)
            .status()
            .with_context(|| format!("failed to run document compiler: {}", self.program))
    }

    /// Compile `source` with [`LATEX_PASSES`] sequential passes.
    pub fn compile_report(&self, source: &Path) -> Result<Vec<ExitStatus>> {
        let mut statuses = Vec::with_capacity(LATEX_PASSES);
        for pass in 1..=LATEX_PASSES {
            tracing::info!(
                program = %self.program,
                source = %source.display(),
                pass,
                "compiling report"
            );
            let status = self.run_pass(source)?;
            if !status.success() {
                tracing::warn!(pass, %status, "document compiler reported errors");
            }
            statuses.push(status);
        }
        Ok(statuses)
    }
}
