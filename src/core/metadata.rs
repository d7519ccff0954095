use serde::{Deserialize, Serialize};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    NotVerified,
    Unknown,
}

/// On-chain data block of the report. Exactly one shape applies per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OnChainMetadata {
    Fetched(FetchedMetadata),
    Placeholder(PlaceholderMetadata),
    Failed(FailedMetadata),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedMetadata {
    pub contract_address: String,
    pub verification_status: VerificationStatus,
    pub transaction_count: u64,
    pub deployer_address: String,
    pub creation_date: String,
    /// Transaction-list URL with the credential replaced by `***`.
    pub api_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderMetadata {
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub verification_status: VerificationStatus,
    pub transaction_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployer_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMetadata {
    pub error: String,
    pub contract_address: String,
}

impl OnChainMetadata {
    pub fn no_address() -> Self {
        OnChainMetadata::Placeholder(PlaceholderMetadata {
            note: "No contract address provided. Pass --address parameter to fetch real data."
                .to_string(),
            contract_address: None,
            verification_status: VerificationStatus::Unknown,
            transaction_count: 0,
            deployer_address: None,
            creation_date: None,
        })
    }

    pub fn no_credential(address: &str, key_env: &str) -> Self {
        OnChainMetadata::Placeholder(PlaceholderMetadata {
            note: format!("Simulated data - set {key_env} for real on-chain data"),
            contract_address: Some(address.to_string()),
            verification_status: VerificationStatus::Unknown,
            transaction_count: 0,
            deployer_address: Some(ZERO_ADDRESS.to_string()),
            creation_date: Some(UNKNOWN.to_string()),
        })
    }

    pub fn failed(address: &str, message: impl std::fmt::Display) -> Self {
        OnChainMetadata::Failed(FailedMetadata {
            error: format!("Failed to fetch data: {message}"),
            contract_address: address.to_string(),
        })
    }

    pub fn transaction_count(&self) -> u64 {
        match self {
            OnChainMetadata::Fetched(m) => m.transaction_count,
            OnChainMetadata::Placeholder(m) => m.transaction_count,
            OnChainMetadata::Failed(_) => 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, OnChainMetadata::Placeholder(_))
    }
}
