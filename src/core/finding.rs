use serde::{Deserialize, Serialize};

use crate::core::Severity;

/// One detection reported by an analyzer.
///
/// `severity` is `None` when `raw_severity` is not one of the known buckets;
/// such findings stay in the list but are not tallied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisFinding {
    pub raw_severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub detail: serde_json::Value,
}

impl AnalysisFinding {
    pub fn new(raw_severity: impl Into<String>, detail: serde_json::Value) -> Self {
        let raw_severity = raw_severity.into().to_lowercase();
        let severity = raw_severity.parse().ok();
        Self {
            raw_severity,
            severity,
            detail,
        }
    }
}
