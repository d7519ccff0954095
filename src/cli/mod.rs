use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::AuditLevel;
use crate::engine::{AuditRequest, Engine, EngineOptions, Verdict};
use crate::exit::ExitCode;
use crate::explorer::{ApiKey, Explorer, ExplorerConfig, HttpTransport};
use crate::tools::ToolRegistry;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   every analyzer that ran passed (also when none ran, unless --strict)
  1   an analyzer found critical/high issues or failed to run
  2   invalid arguments, configuration, or contract path
  10  internal error (for example the report file cannot be written)";

#[derive(Debug, Parser)]
#[command(
    name = "auditpipe",
    version,
    about = "Run static analysis on a Solidity contract and enrich the report with on-chain metadata",
    after_help = EXIT_CODES_HELP
)]
pub struct Cli {
    /// Path to the Solidity contract file
    #[arg(long, required_unless_present = "show_config")]
    pub contract: Option<PathBuf>,
    /// Audit depth label: quick|standard|deep|forensic
    #[arg(long, default_value = "quick")]
    pub level: AuditLevel,
    /// Contract address on Ethereum mainnet (0x...)
    #[arg(long, value_parser = parse_address)]
    pub address: Option<String>,
    /// Write the JSON report to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Analyzer timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
    /// Include raw analyzer findings in each result
    #[arg(long)]
    pub include_findings: bool,
    /// Treat a run where no analyzer executed as a failure
    #[arg(long)]
    pub strict: bool,
    #[arg(long)]
    pub verbose: bool,
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli);

    let home_dir = crate::platform::home_dir();
    let env_config_path = std::env::var_os("AUDITPIPE_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        home_dir.as_deref(),
    )
    .map_err(crate::exit::invalid_args_err)?;

    if cli.show_config {
        println!("{}", toml::to_string_pretty(&cfg)?);
        return Ok(ExitCode::Success);
    }

    let Some(contract) = cli.contract else {
        return Err(crate::exit::invalid_args("--contract is required"));
    };

    let api_key = ApiKey::from_env();
    let transport = explorer_transport(cli.address.as_deref(), api_key.as_ref());
    let explorer = Explorer::new(
        ExplorerConfig {
            base_url: cfg.explorer.base_url.clone(),
            timeout: Duration::from_secs(cfg.explorer.timeout_secs),
            api_key,
        },
        transport,
    );
    let engine = Engine::new(
        EngineOptions {
            analyzer_timeout: Duration::from_secs(cli.timeout.unwrap_or(cfg.analyzer.timeout_secs)),
            probe_timeout: Duration::from_secs(cfg.analyzer.probe_timeout_secs),
            contract_extension: cfg.contract.extension.clone(),
            include_findings: cli.include_findings || cfg.report.include_findings,
            show_progress: !cli.quiet,
        },
        ToolRegistry::with_slither(cfg.analyzer.slither_command.clone()),
        explorer,
    );

    let run = engine.run(&AuditRequest {
        contract,
        level: cli.level,
        address: cli.address,
    });

    match &cli.output {
        Some(path) => {
            write_json_file(path, &run.output)?;
            info!("Audit report saved to {}", path.display());
        }
        None => write_json(&run.output)?,
    }

    let strict = cli.strict || cfg.audit.fail_on_no_tools;
    let verdict = run.verdict();
    if verdict == Verdict::Inconclusive {
        if strict {
            warn!("no analyzer executed; failing because strict mode is on");
        } else {
            warn!("no analyzer executed; reporting success with no checks run");
        }
    }
    Ok(ExitCode::from_verdict(verdict, strict))
}

/// The HTTP client is only built when a live fetch will happen. A client that
/// cannot be built turns the fetch into an error-marked block.
fn explorer_transport(address: Option<&str>, api_key: Option<&ApiKey>) -> Option<HttpTransport> {
    if address.is_none() || api_key.is_none() {
        return None;
    }
    match HttpTransport::new() {
        Ok(transport) => Some(transport),
        Err(err) => {
            error!("failed to build HTTP client: {err}");
            None
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_env("AUDITPIPE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,auditpipe={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

fn parse_address(s: &str) -> std::result::Result<String, String> {
    let s = s.trim();
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| format!("address must start with 0x: {s}"))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("address must be 0x followed by 40 hex digits: {s}"));
    }
    Ok(s.to_string())
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    use std::io::Write;

    let buf = serde_json::to_vec_pretty(value)?;

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    match stdout.write_all(b"\n") {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_vec_pretty(value)?;
    buf.push(b'\n');
    std::fs::write(path, buf)
        .with_context(|| format!("failed to write report: {}", path.display()))
}
