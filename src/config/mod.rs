use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub analyzer: AnalyzerConfig,
    pub explorer: ExplorerSettings,
    pub contract: ContractConfig,
    pub report: ReportConfig,
    pub audit: AuditConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzerConfig {
    pub slither_command: String,
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplorerSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractConfig {
    pub extension: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub include_findings: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditConfig {
    pub fail_on_no_tools: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig {
                slither_command: "slither".to_string(),
                timeout_secs: 300,
                probe_timeout_secs: 10,
            },
            explorer: ExplorerSettings {
                base_url: crate::explorer::DEFAULT_BASE_URL.to_string(),
                timeout_secs: 10,
            },
            contract: ContractConfig {
                extension: "sol".to_string(),
            },
            report: ReportConfig {
                include_findings: false,
            },
            audit: AuditConfig {
                fail_on_no_tools: false,
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    analyzer: Option<RawAnalyzerConfig>,
    explorer: Option<RawExplorerConfig>,
    contract: Option<RawContractConfig>,
    report: Option<RawReportConfig>,
    audit: Option<RawAuditConfig>,
}

#[derive(Debug, Deserialize)]
struct RawAnalyzerConfig {
    slither_command: Option<String>,
    timeout_secs: Option<u64>,
    probe_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawExplorerConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawContractConfig {
    extension: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReportConfig {
    include_findings: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawAuditConfig {
    fail_on_no_tools: Option<bool>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/auditpipe/config.toml")
}

/// Defaults, then the config file if present, then `AUDITPIPE_*` variables.
pub fn load(config_path: Option<&Path>, home_dir: Option<&Path>) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .or_else(|| home_dir.map(default_config_path));

    if let Some(path) = path {
        if path.exists() {
            let s = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let raw: RawConfig = toml::from_str(&s)
                .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
            apply_raw_config(&mut cfg, raw);
            cfg.config_path = Some(path.display().to_string());
        } else if config_path.is_some() {
            return Err(anyhow::anyhow!("config file not found: {}", path.display()));
        }
    }

    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;

    Ok(cfg)
}

fn validate(cfg: &EffectiveConfig) -> Result<()> {
    for (name, secs) in [
        ("analyzer.timeout_secs", cfg.analyzer.timeout_secs),
        ("analyzer.probe_timeout_secs", cfg.analyzer.probe_timeout_secs),
        ("explorer.timeout_secs", cfg.explorer.timeout_secs),
    ] {
        if secs == 0 {
            return Err(anyhow::anyhow!("{name} must be greater than 0"));
        }
    }
    if cfg.analyzer.slither_command.trim().is_empty() {
        return Err(anyhow::anyhow!("analyzer.slither_command must not be empty"));
    }
    Ok(())
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(analyzer) = raw.analyzer {
        if let Some(slither_command) = analyzer.slither_command {
            cfg.analyzer.slither_command = slither_command;
        }
        if let Some(timeout_secs) = analyzer.timeout_secs {
            cfg.analyzer.timeout_secs = timeout_secs;
        }
        if let Some(probe_timeout_secs) = analyzer.probe_timeout_secs {
            cfg.analyzer.probe_timeout_secs = probe_timeout_secs;
        }
    }

    if let Some(explorer) = raw.explorer {
        if let Some(base_url) = explorer.base_url {
            cfg.explorer.base_url = base_url;
        }
        if let Some(timeout_secs) = explorer.timeout_secs {
            cfg.explorer.timeout_secs = timeout_secs;
        }
    }

    if let Some(contract) = raw.contract {
        if let Some(extension) = contract.extension {
            cfg.contract.extension = extension;
        }
    }

    if let Some(report) = raw.report {
        if let Some(include_findings) = report.include_findings {
            cfg.report.include_findings = include_findings;
        }
    }

    if let Some(audit) = raw.audit {
        if let Some(fail_on_no_tools) = audit.fail_on_no_tools {
            cfg.audit.fail_on_no_tools = fail_on_no_tools;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Some(v) = non_empty_env("AUDITPIPE_SLITHER_COMMAND") {
        cfg.analyzer.slither_command = v;
    }
    if let Some(v) = non_empty_env("AUDITPIPE_ANALYZER_TIMEOUT_SECS") {
        cfg.analyzer.timeout_secs = parse_secs(&v).context("AUDITPIPE_ANALYZER_TIMEOUT_SECS")?;
    }
    if let Some(v) = non_empty_env("AUDITPIPE_PROBE_TIMEOUT_SECS") {
        cfg.analyzer.probe_timeout_secs =
            parse_secs(&v).context("AUDITPIPE_PROBE_TIMEOUT_SECS")?;
    }
    if let Some(v) = non_empty_env("AUDITPIPE_EXPLORER_BASE_URL") {
        cfg.explorer.base_url = v;
    }
    if let Some(v) = non_empty_env("AUDITPIPE_EXPLORER_TIMEOUT_SECS") {
        cfg.explorer.timeout_secs = parse_secs(&v).context("AUDITPIPE_EXPLORER_TIMEOUT_SECS")?;
    }
    if let Some(v) = non_empty_env("AUDITPIPE_CONTRACT_EXTENSION") {
        cfg.contract.extension = v;
    }
    if let Ok(v) = std::env::var("AUDITPIPE_REPORT_INCLUDE_FINDINGS") {
        cfg.report.include_findings =
            parse_bool(&v).context("AUDITPIPE_REPORT_INCLUDE_FINDINGS")?;
    }
    if let Ok(v) = std::env::var("AUDITPIPE_FAIL_ON_NO_TOOLS") {
        cfg.audit.fail_on_no_tools = parse_bool(&v).context("AUDITPIPE_FAIL_ON_NO_TOOLS")?;
    }

    Ok(())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(s: &str) -> Result<u64> {
    let secs = s
        .trim()
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("invalid number of seconds: {s}"))?;
    if secs == 0 {
        return Err(anyhow::anyhow!("timeout must be greater than 0"));
    }
    Ok(secs)
}

pub(crate) fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}
