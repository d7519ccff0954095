use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidContractPath {
    #[error("contract file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("contract must be a .{expected} file: {}", .path.display())]
    WrongExtension { path: PathBuf, expected: String },
}

/// Rejects paths that do not exist or do not end in `.{extension}`.
pub fn validate_contract_path(path: &Path, extension: &str) -> Result<(), InvalidContractPath> {
    if !path.exists() {
        return Err(InvalidContractPath::NotFound(path.to_path_buf()));
    }
    let expected = extension.trim_start_matches('.');
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == expected);
    if !matches {
        return Err(InvalidContractPath::WrongExtension {
            path: path.to_path_buf(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}
