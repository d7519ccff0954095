use serde::{Deserialize, Serialize};

use crate::core::{AuditLevel, AuditResult, OnChainMetadata, SeverityCount};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub tool: String,
    pub passed: bool,
    pub severity_count: SeverityCount,
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<Vec<serde_json::Value>>,
}

impl ToolSummary {
    pub fn from_result(result: &AuditResult, include_findings: bool) -> Self {
        Self {
            tool: result.tool_name.clone(),
            passed: result.passed,
            severity_count: result.severity_count.clone(),
            execution_time: result.execution_time,
            findings: include_findings
                .then(|| result.findings.iter().map(|f| f.detail.clone()).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub etherscan_data: OnChainMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub contract: String,
    pub audit_level: AuditLevel,
    pub timestamp: String,
    pub results: Vec<ToolSummary>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidReport {
    pub error: String,
    pub contract: String,
}

/// What a run prints: a full report, or the validation error when the
/// contract path was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuditOutput {
    Report(AuditReport),
    Invalid(InvalidReport),
}
