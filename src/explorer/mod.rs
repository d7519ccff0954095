use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

use crate::core::{FetchedMetadata, OnChainMetadata, UNKNOWN, VerificationStatus};

pub const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.etherscan.io/api";
const MASK: &str = "***";

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("invalid explorer url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("response is not valid JSON: {0}")]
    Decode(String),
}

/// Explorer credential. Never printed, not even by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for an empty or blank value.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let value = value.trim();
        (!value.is_empty()).then(|| Self(value.to_string()))
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV).ok().and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of the key in `text`.
    pub fn mask(&self, text: &str) -> String {
        text.replace(&self.0, MASK)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub api_key: Option<ApiKey>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }
}

/// One blocking GET returning a JSON document.
pub trait ExplorerTransport {
    fn get_json(&self, url: &Url, timeout: Duration) -> Result<Value, ExplorerError>;
}

/// `None` stands for a client that could not be built: every request fails.
impl<T: ExplorerTransport> ExplorerTransport for Option<T> {
    fn get_json(&self, url: &Url, timeout: Duration) -> Result<Value, ExplorerError> {
        match self {
            Some(transport) => transport.get_json(url, timeout),
            None => Err(ExplorerError::Request("HTTP client unavailable".to_string())),
        }
    }
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, ExplorerError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("auditpipe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExplorerError::Request(e.without_url().to_string()))?;
        Ok(Self { client })
    }
}

impl ExplorerTransport for HttpTransport {
    fn get_json(&self, url: &Url, timeout: Duration) -> Result<Value, ExplorerError> {
        // Error messages drop the URL: it carries the credential.
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .map_err(|e| ExplorerError::Request(e.without_url().to_string()))?;
        response
            .json::<Value>()
            .map_err(|e| ExplorerError::Decode(e.without_url().to_string()))
    }
}

pub struct Explorer<T> {
    config: ExplorerConfig,
    transport: T,
}

impl<T: ExplorerTransport> Explorer<T> {
    pub fn new(config: ExplorerConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Never fails: missing inputs give a placeholder and request errors
    /// give an error-marked block.
    pub fn fetch(&self, address: Option<&str>) -> OnChainMetadata {
        let Some(address) = address else {
            return OnChainMetadata::no_address();
        };

        let Some(key) = &self.config.api_key else {
            info!("{API_KEY_ENV} not found. Returning simulated data.");
            info!("Get your free API key at: https://etherscan.io/apis");
            return OnChainMetadata::no_credential(address, API_KEY_ENV);
        };

        info!("Fetching real on-chain data for {address}...");
        match self.fetch_live(address, key) {
            Ok(fetched) => OnChainMetadata::Fetched(fetched),
            Err(err) => {
                let message = key.mask(&err.to_string());
                error!("Etherscan API error: {message}");
                OnChainMetadata::failed(address, message)
            }
        }
    }

    fn fetch_live(&self, address: &str, key: &ApiKey) -> Result<FetchedMetadata, ExplorerError> {
        let tx_url = self.txlist_url(address, key.expose())?;
        let source_url = self.getsourcecode_url(address, key.expose())?;

        let tx_data = self.transport.get_json(&tx_url, self.config.timeout)?;
        let source_data = self.transport.get_json(&source_url, self.config.timeout)?;

        let history = summarize_transactions(&tx_data);
        Ok(FetchedMetadata {
            contract_address: address.to_string(),
            verification_status: verification_status(&source_data),
            transaction_count: history.transaction_count,
            deployer_address: history.deployer_address,
            creation_date: history.creation_date,
            api_endpoint: self.txlist_url(address, MASK)?.to_string(),
        })
    }

    fn txlist_url(&self, address: &str, key: &str) -> Result<Url, ExplorerError> {
        self.url(&[
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("startblock", "0"),
            ("endblock", "99999999"),
            ("sort", "asc"),
            ("apikey", key),
        ])
    }

    fn getsourcecode_url(&self, address: &str, key: &str) -> Result<Url, ExplorerError> {
        self.url(&[
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", address),
            ("apikey", key),
        ])
    }

    fn url(&self, params: &[(&str, &str)]) -> Result<Url, ExplorerError> {
        Url::parse_with_params(&self.config.base_url, params)
            .map_err(|e| ExplorerError::InvalidUrl(format!("{}: {e}", self.config.base_url)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TransactionHistory {
    transaction_count: u64,
    deployer_address: String,
    creation_date: String,
}

fn summarize_transactions(tx_data: &Value) -> TransactionHistory {
    let mut history = TransactionHistory {
        transaction_count: 0,
        deployer_address: UNKNOWN.to_string(),
        creation_date: UNKNOWN.to_string(),
    };

    if !is_ok_status(tx_data) {
        return history;
    }
    let Some(transactions) = tx_data.get("result").and_then(Value::as_array) else {
        return history;
    };
    history.transaction_count = transactions.len() as u64;

    // The creation transaction has an empty destination.
    let creation = transactions
        .iter()
        .find(|tx| tx.get("to").and_then(Value::as_str) == Some(""));
    if let Some(tx) = creation {
        if let Some(from) = tx.get("from").and_then(Value::as_str) {
            history.deployer_address = from.to_string();
        }
        if let Some(date) = tx.get("timeStamp").and_then(format_unix_timestamp) {
            history.creation_date = date;
        }
    }
    history
}

fn verification_status(source_data: &Value) -> VerificationStatus {
    if !is_ok_status(source_data) {
        return VerificationStatus::NotVerified;
    }
    let entry = match source_data.get("result") {
        Some(Value::Array(items)) => items.first(),
        Some(obj @ Value::Object(_)) => Some(obj),
        _ => None,
    };
    let has_source = entry
        .and_then(|e| e.get("SourceCode"))
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if has_source {
        VerificationStatus::Verified
    } else {
        VerificationStatus::NotVerified
    }
}

fn is_ok_status(data: &Value) -> bool {
    data.get("status").and_then(Value::as_str) == Some("1")
}

fn format_unix_timestamp(value: &Value) -> Option<String> {
    let secs = match value {
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()?
        .format(&Rfc3339)
        .ok()
}
