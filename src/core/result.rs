use crate::core::{AnalysisFinding, SeverityCount};

/// Outcome of a single tool invocation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditResult {
    pub tool_name: String,
    pub severity_count: SeverityCount,
    pub findings: Vec<AnalysisFinding>,
    pub execution_time: f64,
    pub passed: bool,
}

impl AuditResult {
    pub fn completed(
        tool_name: impl Into<String>,
        findings: Vec<AnalysisFinding>,
        execution_time: f64,
    ) -> Self {
        let mut severity_count = SeverityCount::zeroed();
        for finding in &findings {
            if let Some(severity) = finding.severity {
                severity_count.increment(severity);
            }
        }
        let passed = severity_count.is_passing();
        Self {
            tool_name: tool_name.into(),
            severity_count,
            findings,
            execution_time,
            passed,
        }
    }

    pub fn failed(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            severity_count: SeverityCount::empty(),
            findings: Vec::new(),
            execution_time: 0.0,
            passed: false,
        }
    }
}
