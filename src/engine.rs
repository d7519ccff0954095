use std::path::PathBuf;
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info, warn};

use crate::core::{
    AuditLevel, AuditOutput, AuditReport, AuditResult, InvalidReport, ReportMetadata, ToolSummary,
};
use crate::explorer::{Explorer, ExplorerTransport};
use crate::tools::{self, ToolRegistry};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub analyzer_timeout: Duration,
    pub probe_timeout: Duration,
    pub contract_extension: String,
    pub include_findings: bool,
    pub show_progress: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            analyzer_timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(10),
            contract_extension: "sol".to_string(),
            include_findings: false,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub contract: PathBuf,
    pub level: AuditLevel,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every executed tool passed.
    Passed,
    /// At least one executed tool failed.
    Failed,
    /// No tool ran.
    Inconclusive,
    /// The contract path was rejected before anything ran.
    InvalidInput,
}

#[derive(Debug, Clone)]
pub struct AuditRun {
    pub output: AuditOutput,
    pub results: Vec<AuditResult>,
}

impl AuditRun {
    pub fn verdict(&self) -> Verdict {
        if matches!(self.output, AuditOutput::Invalid(_)) {
            return Verdict::InvalidInput;
        }
        if self.results.is_empty() {
            return Verdict::Inconclusive;
        }
        if self.results.iter().all(|r| r.passed) {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

pub struct Engine<T> {
    opts: EngineOptions,
    registry: ToolRegistry,
    explorer: Explorer<T>,
}

impl<T: ExplorerTransport> Engine<T> {
    pub fn new(opts: EngineOptions, registry: ToolRegistry, explorer: Explorer<T>) -> Self {
        Self {
            opts,
            registry,
            explorer,
        }
    }

    pub fn run(&self, req: &AuditRequest) -> AuditRun {
        let contract = req.contract.display().to_string();
        info!("Starting {} audit of {contract}", req.level);

        if let Err(err) =
            crate::validate::validate_contract_path(&req.contract, &self.opts.contract_extension)
        {
            error!("{err}");
            return AuditRun {
                output: AuditOutput::Invalid(InvalidReport {
                    error: "Invalid contract path".to_string(),
                    contract,
                }),
                results: Vec::new(),
            };
        }

        let etherscan_data = self.explorer.fetch(req.address.as_deref());

        let mut results = Vec::new();
        for tool in self.registry.iter() {
            if !tools::is_available(tool, self.opts.probe_timeout) {
                error!("{} not installed", tool.name());
                continue;
            }
            let pb = crate::ui::spinner(
                format!("Running {}...", tool.name()),
                self.opts.show_progress,
            );
            let result = tools::run(tool, &req.contract, self.opts.analyzer_timeout);
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            results.push(result);
        }
        if results.is_empty() {
            warn!("no analyzer ran; the report contains no tool results");
        }

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        let report = AuditReport {
            contract,
            audit_level: req.level,
            timestamp,
            results: results
                .iter()
                .map(|r| ToolSummary::from_result(r, self.opts.include_findings))
                .collect(),
            metadata: ReportMetadata {
                contract_address: req.address.clone(),
                etherscan_data,
            },
        };

        AuditRun {
            output: AuditOutput::Report(report),
            results,
        }
    }
}
