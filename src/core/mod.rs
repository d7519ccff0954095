mod finding;
mod level;
mod metadata;
mod report;
mod result;
mod severity;

pub use finding::AnalysisFinding;
pub use level::AuditLevel;
pub use metadata::{
    FailedMetadata, FetchedMetadata, OnChainMetadata, PlaceholderMetadata, UNKNOWN,
    VerificationStatus, ZERO_ADDRESS,
};
pub use report::{AuditOutput, AuditReport, InvalidReport, ReportMetadata, ToolSummary};
pub use result::AuditResult;
pub use severity::{Severity, SeverityCount};
