use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

fn auditpipe_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_auditpipe"));
    cmd.env("HOME", home);
    cmd.env_remove("AUDITPIPE_CONFIG");
    cmd.env_remove("AUDITPIPE_SLITHER_COMMAND");
    cmd.env_remove("AUDITPIPE_ANALYZER_TIMEOUT_SECS");
    cmd.env_remove("AUDITPIPE_PROBE_TIMEOUT_SECS");
    cmd.env_remove("AUDITPIPE_EXPLORER_BASE_URL");
    cmd.env_remove("AUDITPIPE_EXPLORER_TIMEOUT_SECS");
    cmd.env_remove("AUDITPIPE_CONTRACT_EXTENSION");
    cmd.env_remove("AUDITPIPE_REPORT_INCLUDE_FINDINGS");
    cmd.env_remove("AUDITPIPE_FAIL_ON_NO_TOOLS");
    cmd.env_remove("AUDITPIPE_LOG");
    cmd.env_remove("ETHERSCAN_API_KEY");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    auditpipe_cmd(home).args(args).output().expect("run auditpipe")
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let home = std::env::temp_dir().join(format!(
        "auditpipe-exit-test-{}-{seq}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdirs");
    }
    std::fs::write(path, bytes).expect("write");
}

fn write_contract(home: &Path) -> PathBuf {
    let path = home.join("Token.sol");
    write_file(
        path.as_path(),
        b"pragma solidity ^0.8.0;\ncontract Token {}\n",
    );
    path
}

#[cfg(unix)]
fn write_fake_slither(home: &Path, stdout: &str, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = home.join("bin/slither");
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  echo 0.10.0\n  exit 0\nfi\ncat <<'JSON'\n{stdout}\nJSON\nexit {exit_code}\n"
    );
    write_file(path.as_path(), script.as_bytes());
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

#[cfg(unix)]
fn write_script(home: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = home.join("bin").join(name);
    write_file(path.as_path(), format!("#!/bin/sh\n{body}").as_bytes());
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

fn parse_stdout(out: &Output) -> serde_json::Value {
    serde_json::from_slice(&out.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): stdout={} stderr={}",
            String::from_utf8_lossy(&out.stdout),
            String::from_utf8_lossy(&out.stderr)
        )
    })
}

#[test]
fn missing_contract_exits_2_with_error_report() {
    let home = make_temp_home();
    let missing = home.join("Missing.sol");
    let out = run(&home, &["--contract", missing.to_str().expect("utf8")]);
    assert_eq!(out.status.code(), Some(2));

    let v = parse_stdout(&out);
    assert_eq!(v["error"], "Invalid contract path");
    assert!(v.get("results").is_none());
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn wrong_extension_exits_2() {
    let home = make_temp_home();
    let path = home.join("Token.vy");
    write_file(path.as_path(), b"# vyper");
    let out = run(&home, &["--contract", path.to_str().expect("utf8")]);
    assert_eq!(out.status.code(), Some(2));
    assert_eq!(parse_stdout(&out)["error"], "Invalid contract path");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_contract_flag_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &[]);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn malformed_address_exits_2() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let out = run(
        &home,
        &[
            "--contract",
            contract.to_str().expect("utf8"),
            "--address",
            "0x1234",
        ],
    );
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn unavailable_analyzer_without_address_exits_0() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", home.join("bin/no-such-slither"));
        cmd.args(["--contract", contract.to_str().expect("utf8")]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(
        out.status.code(),
        Some(0),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    let v = parse_stdout(&out);
    assert_eq!(v["results"], serde_json::json!([]));
    assert_eq!(v["audit_level"], "quick");
    assert!(v["timestamp"].is_string());
    assert!(v["metadata"]["etherscan_data"]["note"].is_string());
    assert_eq!(v["metadata"]["etherscan_data"]["transaction_count"], 0);

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Slither not installed"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn strict_mode_fails_when_no_analyzer_ran() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", home.join("bin/no-such-slither"));
        cmd.args(["--contract", contract.to_str().expect("utf8"), "--strict"]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(parse_stdout(&out)["results"], serde_json::json!([]));
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn high_finding_exits_1() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = write_fake_slither(
        &home,
        r#"{"success": true, "results": {"detections": [
  {"check": "reentrancy-eth", "severity": "High"},
  {"check": "solc-version", "severity": "Informational"}
]}}"#,
        0,
    );
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args([
            "--contract",
            contract.to_str().expect("utf8"),
            "--level",
            "deep",
        ]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(
        out.status.code(),
        Some(1),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    let v = parse_stdout(&out);
    assert_eq!(v["audit_level"], "deep");
    let results = v["results"].as_array().expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["tool"], "Slither");
    assert_eq!(results[0]["passed"], false);
    assert_eq!(
        results[0]["severity_count"],
        serde_json::json!({"critical": 0, "high": 1, "medium": 0, "low": 0, "informational": 1})
    );
    assert!(results[0]["execution_time"].as_f64().expect("time") >= 0.0);
    assert!(results[0].get("findings").is_none());
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn medium_findings_only_exit_0_and_findings_can_be_included() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = write_fake_slither(
        &home,
        r#"{"results": {"detections": [
  {"check": "a", "severity": "Medium"},
  {"check": "b", "severity": "Medium"},
  {"check": "c", "severity": "Medium"}
]}}"#,
        0,
    );
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args([
            "--contract",
            contract.to_str().expect("utf8"),
            "--include-findings",
        ]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(0));

    let v = parse_stdout(&out);
    assert_eq!(v["results"][0]["passed"], true);
    assert_eq!(v["results"][0]["severity_count"]["medium"], 3);
    let findings = v["results"][0]["findings"].as_array().expect("findings");
    assert_eq!(findings.len(), 3);
    assert_eq!(findings[2]["check"], "c");
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn crashing_analyzer_yields_failed_result_and_exits_1() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = write_fake_slither(&home, "Traceback (most recent call last):", 1);
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args(["--contract", contract.to_str().expect("utf8")]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(1));

    let v = parse_stdout(&out);
    assert_eq!(v["results"][0]["passed"], false);
    assert_eq!(v["results"][0]["severity_count"], serde_json::json!({}));
    assert_eq!(v["results"][0]["execution_time"], serde_json::json!(0.0));
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn analyzer_timeout_yields_failed_result() {
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, Instant};

    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = home.join("bin/slither");
    write_file(
        slither.as_path(),
        b"#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  exit 0\nfi\nexec sleep 10\n",
    );
    let mut perms = std::fs::metadata(&slither).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&slither, perms).expect("chmod");

    let start = Instant::now();
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args([
            "--contract",
            contract.to_str().expect("utf8"),
            "--timeout",
            "1",
        ]);
        cmd.output().expect("run auditpipe")
    };
    assert!(
        start.elapsed() < Duration::from_secs(8),
        "timeout not enforced: {:?}",
        start.elapsed()
    );
    assert_eq!(out.status.code(), Some(1));
    let v = parse_stdout(&out);
    assert_eq!(v["results"][0]["passed"], false);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("timed out"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn output_flag_writes_report_file_and_keeps_stdout_empty() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = write_fake_slither(&home, r#"{"results": {"detections": []}}"#, 0);
    let report_path = home.join("out/report.json");
    std::fs::create_dir_all(report_path.parent().expect("parent")).expect("mkdir");
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args([
            "--contract",
            contract.to_str().expect("utf8"),
            "--output",
            report_path.to_str().expect("utf8"),
        ]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());

    let bytes = std::fs::read(&report_path).expect("read report");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse report");
    assert_eq!(v["results"][0]["passed"], true);
    assert_eq!(v["contract"], contract.to_str().expect("utf8"));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn unwritable_output_path_exits_10() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let report_path = home.join("missing-dir/report.json");
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", home.join("bin/no-such-slither"));
        cmd.args([
            "--contract",
            contract.to_str().expect("utf8"),
            "--output",
            report_path.to_str().expect("utf8"),
        ]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(10));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to write report"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn failing_version_query_counts_as_not_installed() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let marker = home.join("analysis-ran");
    let slither = write_script(
        &home,
        "slither",
        &format!(
            "if [ \"$1\" = \"--version\" ]; then\n  echo broken >&2\n  exit 1\nfi\ntouch '{}'\necho '{{}}'\n",
            marker.display()
        ),
    );
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args(["--contract", contract.to_str().expect("utf8")]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(parse_stdout(&out)["results"], serde_json::json!([]));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Slither not installed"), "stderr={stderr}");
    assert!(!marker.exists(), "analysis ran despite failed version query");
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn unsuccessful_analyzer_report_exits_1() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = write_fake_slither(
        &home,
        r#"{"success": false, "error": "solc not found", "results": null}"#,
        0,
    );
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args(["--contract", contract.to_str().expect("utf8")]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(1));
    let v = parse_stdout(&out);
    assert_eq!(v["results"][0]["passed"], false);
    assert_eq!(v["results"][0]["severity_count"], serde_json::json!({}));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("solc not found"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[cfg(unix)]
#[test]
fn non_object_results_exit_1() {
    let home = make_temp_home();
    let contract = write_contract(&home);
    let slither = write_fake_slither(&home, r#"{"success": true, "results": []}"#, 0);
    let out = {
        let mut cmd = auditpipe_cmd(&home);
        cmd.env("AUDITPIPE_SLITHER_COMMAND", &slither);
        cmd.args(["--contract", contract.to_str().expect("utf8")]);
        cmd.output().expect("run auditpipe")
    };
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(parse_stdout(&out)["results"][0]["passed"], false);
    let _ = std::fs::remove_dir_all(&home);
}
