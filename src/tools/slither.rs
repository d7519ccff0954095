use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::core::AnalysisFinding;
use crate::platform::{CommandError, CommandOutput, run_command};
use crate::tools::{Analyzer, ToolFailure};

pub struct Slither {
    program: String,
}

impl Slither {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn analysis_args(contract: &Path) -> Vec<String> {
        vec![
            contract.display().to_string(),
            "--json".to_string(),
            "-".to_string(),
        ]
    }
}

impl Analyzer for Slither {
    fn name(&self) -> &str {
        "Slither"
    }

    fn probe(&self, timeout: Duration) -> Result<CommandOutput, CommandError> {
        run_command(&self.program, &["--version"], timeout)
    }

    fn invoke(&self, contract: &Path, timeout: Duration) -> Result<CommandOutput, CommandError> {
        let args = Self::analysis_args(contract);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_command(&self.program, &args, timeout)
    }

    fn parse(&self, stdout: &str) -> Result<Vec<AnalysisFinding>, ToolFailure> {
        parse_detections(stdout)
    }
}

/// Reads `results.detections[].severity`. Slither's native layout,
/// `results.detectors[].impact`, is accepted when `detections` is absent.
/// A missing severity defaults to `informational`. `"success": false` and a
/// `results` value that is not an object are failures, not empty reports.
pub fn parse_detections(stdout: &str) -> Result<Vec<AnalysisFinding>, ToolFailure> {
    let value: Value = serde_json::from_str(stdout.trim())
        .map_err(|e| ToolFailure::MalformedOutput(e.to_string()))?;
    let Some(root) = value.as_object() else {
        return Err(ToolFailure::MalformedOutput(
            "expected a JSON object at top level".to_string(),
        ));
    };

    if root.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = root
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("no error message");
        return Err(ToolFailure::Reported(reason.to_string()));
    }

    let results = match root.get("results") {
        None => return Ok(Vec::new()),
        Some(Value::Object(results)) => results,
        Some(other) => {
            return Err(ToolFailure::MalformedOutput(format!(
                "results is not an object: {other}"
            )));
        }
    };
    let (items, severity_key) = match (results.get("detections"), results.get("detectors")) {
        (Some(detections), _) => (detections, "severity"),
        (None, Some(detectors)) => (detectors, "impact"),
        (None, None) => return Ok(Vec::new()),
    };
    let Some(items) = items.as_array() else {
        return Err(ToolFailure::MalformedOutput(
            "detections is not a list".to_string(),
        ));
    };

    let mut findings = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            return Err(ToolFailure::MalformedOutput(format!(
                "detection is not an object: {item}"
            )));
        }
        let severity = match item.get(severity_key) {
            None => "informational",
            Some(Value::String(s)) => s.as_str(),
            Some(other) => {
                return Err(ToolFailure::MalformedOutput(format!(
                    "{severity_key} is not a string: {other}"
                )));
            }
        };
        findings.push(AnalysisFinding::new(severity, item.clone()));
    }
    Ok(findings)
}
