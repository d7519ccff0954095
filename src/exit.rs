use std::fmt;

use crate::engine::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    AuditFailed,
    InvalidArgs,
    Internal,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::AuditFailed => 1,
            ExitCode::InvalidArgs => 2,
            ExitCode::Internal => 10,
        }
    }

    /// Zero executed tools pass unless `strict` is set.
    pub const fn from_verdict(verdict: Verdict, strict: bool) -> Self {
        match verdict {
            Verdict::Passed => ExitCode::Success,
            Verdict::Failed => ExitCode::AuditFailed,
            Verdict::Inconclusive if strict => ExitCode::AuditFailed,
            Verdict::Inconclusive => ExitCode::Success,
            Verdict::InvalidInput => ExitCode::InvalidArgs,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self { code, err }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.source()
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    ExitCode::Internal.as_i32()
}

pub fn invalid_args(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, err).into()
}
