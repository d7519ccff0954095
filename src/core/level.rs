use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested audit depth. Carried into the report as a label only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    #[default]
    Quick,
    Standard,
    Deep,
    Forensic,
}

impl AuditLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            AuditLevel::Quick => "quick",
            AuditLevel::Standard => "standard",
            AuditLevel::Deep => "deep",
            AuditLevel::Forensic => "forensic",
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(AuditLevel::Quick),
            "standard" => Ok(AuditLevel::Standard),
            "deep" => Ok(AuditLevel::Deep),
            "forensic" => Ok(AuditLevel::Forensic),
            other => Err(format!(
                "invalid audit level: {other} (expected quick|standard|deep|forensic)"
            )),
        }
    }
}
