use std::path::Path;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info};

use crate::core::{AnalysisFinding, AuditResult};
use crate::platform::{CommandError, CommandOutput};

mod slither;

pub use slither::{Slither, parse_detections};

/// An external analyzer: how to probe it, how to run it, and how to read
/// what it prints.
pub trait Analyzer {
    fn name(&self) -> &str;

    /// Runs the tool's version query.
    fn probe(&self, timeout: Duration) -> Result<CommandOutput, CommandError>;

    /// Runs the analysis against `contract`, requesting structured output.
    fn invoke(&self, contract: &Path, timeout: Duration) -> Result<CommandOutput, CommandError>;

    fn parse(&self, stdout: &str) -> Result<Vec<AnalysisFinding>, ToolFailure>;
}

#[derive(Debug, Error)]
pub enum ToolFailure {
    #[error(transparent)]
    Invocation(#[from] CommandError),
    #[error("exited with status {code}: {stderr}")]
    ExitStatus { code: i32, stderr: String },
    #[error("malformed output: {0}")]
    MalformedOutput(String),
    #[error("analyzer reported failure: {0}")]
    Reported(String),
}

/// True only when the version query exits with status 0. A missing binary,
/// a non-zero exit or a timeout all read as "not available".
pub fn is_available(tool: &dyn Analyzer, timeout: Duration) -> bool {
    match tool.probe(timeout) {
        Ok(out) if out.success() => {
            debug!(tool = tool.name(), version = out.stdout.trim(), "analyzer available");
            true
        }
        Ok(out) => {
            debug!(tool = tool.name(), exit_code = out.exit_code, "version query failed");
            false
        }
        Err(err) => {
            debug!(tool = tool.name(), "version query failed: {err}");
            false
        }
    }
}

/// Runs the analyzer and builds its result, surfacing every failure mode as
/// a [`ToolFailure`].
pub fn execute(
    tool: &dyn Analyzer,
    contract: &Path,
    timeout: Duration,
) -> Result<AuditResult, ToolFailure> {
    let started = Instant::now();
    let output = tool.invoke(contract, timeout)?;
    if !output.success() {
        return Err(ToolFailure::ExitStatus {
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }
    let findings = tool.parse(&output.stdout)?;
    let elapsed = started.elapsed().as_secs_f64();
    Ok(AuditResult::completed(tool.name(), findings, elapsed))
}

/// Like [`execute`], but folds any failure into a failed [`AuditResult`] so
/// the caller always gets a well-formed result.
pub fn run(tool: &dyn Analyzer, contract: &Path, timeout: Duration) -> AuditResult {
    info!("Running {} analysis...", tool.name());
    match execute(tool, contract, timeout) {
        Ok(result) => {
            info!(
                tool = tool.name(),
                passed = result.passed,
                findings = result.findings.len(),
                "analysis finished in {:.2}s",
                result.execution_time
            );
            result
        }
        Err(err) => {
            error!("{} execution error: {err}", tool.name());
            AuditResult::failed(tool.name())
        }
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Analyzer>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry used by the CLI: Slither only.
    pub fn with_slither(program: impl Into<String>) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Slither::new(program)));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Analyzer>) {
        self.tools.push(tool);
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Analyzer> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
