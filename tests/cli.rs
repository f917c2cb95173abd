use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{TempDir, tempdir};

const FINANCIALS: &str = r#"{"financials": {
  "Cloudsense": {"bu": "Cloudsense", "totalRR": 3000000.0, "totalNRR": 500000.0,
                 "totalRevenue": 3500000.0, "ebitda": 2100000.0, "netMargin": 60.0, "customerCount": 40},
  "STL": {"bu": "STL", "totalRR": 1000000.0, "totalNRR": 100000.0,
          "totalRevenue": 1100000.0, "ebitda": 748000.0, "netMargin": 68.0, "customerCount": 20}
}}"#;

const DM: &str = r#"{
  "business_units": [
    {"bu": "Cloudsense", "current_rr": 3000000.0, "prior_rr": 3750000.0, "dm_pct": 80.0,
     "variance": -750000.0, "meets_target": false, "ttm_quarters": []}
  ],
  "consolidated": {"current_rr": 3000000.0, "prior_rr": 3750000.0, "dm_pct": 80.0,
                   "variance": -750000.0, "meets_target": false, "target": 90.0, "ttm_quarters": []},
  "forecast": {"method": "linear", "avg_quarterly_decline_rate": 1.2, "quarters": []},
  "extracted_at": "2026-04-01T09:00:00Z",
  "fiscal_quarter": "Q1'26"
}"#;

fn write_config(dir: &Path, ai_base_url: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    let contents = format!(
        "project_root: {root}\npython: sh\ndatabase_url: file:{root}/dev.db\nai:\n  base_url: {ai_base_url}\n",
        root = dir.display()
    );
    fs::write(&path, contents).expect("failed to write config");
    path
}

/// Extraction scripts run by `sh`, printing fixed JSON.
fn write_scripts(dir: &Path) {
    let scripts = dir.join("scripts");
    fs::create_dir_all(&scripts).expect("failed to create scripts dir");
    for (name, body) in [("parse_excel_to_json.py", FINANCIALS), ("extract_dm_data.py", DM)] {
        fs::write(scripts.join(name), format!("cat <<'JSON'\n{}\nJSON\n", body))
            .expect("failed to write script");
    }
}

fn pintel(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pintel"));
    for var in [
        "ANTHROPIC_API_KEY",
        "DATABASE_URL",
        "PINTEL_CONFIG",
        "PINTEL_DEMO_MODE",
        "PINTEL_PROJECT_ROOT",
        "PINTEL_FORMAT",
        "PINTEL_TIMEOUT",
        "PINTEL_DEBUG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1").arg("--config").arg(config);
    cmd
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is not JSON")
}

fn workspace() -> (TempDir, PathBuf) {
    let temp = tempdir().expect("failed to create temp dir");
    let config = write_config(temp.path(), "http://127.0.0.1:9");
    (temp, config)
}

#[test]
fn health_reports_missing_scripts_as_error() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = workspace();

    let report = json_stdout(pintel(&config).args(["--format", "json", "health"]));

    assert_eq!(report["data"]["status"], "error");
    let adapters = report["data"]["adapters"].as_array().unwrap();
    assert_eq!(adapters.len(), 3);
    assert_eq!(adapters[0]["name"], "excel");
    assert_eq!(adapters[0]["status"], "failed");
    assert_eq!(adapters[1]["status"], "connected");
    assert_eq!(adapters[2]["status"], "degraded");
    assert_eq!(report["data"]["environment"]["ai_configured"], false);
    assert!(report["meta"]["version"].is_string());
    Ok(())
}

#[cfg(unix)]
#[test]
fn health_ok_with_scripts_and_key() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = workspace();
    write_scripts(temp.path());

    let report = json_stdout(
        pintel(&config)
            .env("ANTHROPIC_API_KEY", "sk-test")
            .args(["--format", "json", "health"]),
    );

    assert_eq!(report["data"]["status"], "ok");
    assert_eq!(report["data"]["environment"]["ai_configured"], true);
    Ok(())
}

#[test]
fn degraded_section_does_not_fail_command() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = workspace();

    pintel(&config)
        .args(["--format", "table", "dashboard"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "⚠ Dashboard unavailable: excel: extraction script not found",
        ))
        .stdout(predicate::str::contains("⚠ Business Units unavailable"));
    Ok(())
}

#[test]
fn json_error_carries_kind() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = workspace();

    let out = json_stdout(pintel(&config).args(["--format", "json", "dm-tracker"]));

    assert_eq!(out["error"]["kind"], "adapter");
    assert!(out["error"]["message"].as_str().unwrap().contains("extract_dm_data.py"));
    assert!(out.get("data").is_none());
    Ok(())
}

#[cfg(unix)]
#[test]
fn dashboard_json_from_scripts() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = workspace();
    write_scripts(temp.path());

    let out = json_stdout(pintel(&config).args(["--format", "json", "dashboard"]));

    let summary = &out["data"]["dashboard"]["data"];
    assert_eq!(summary["total_revenue"], 4600000.0);
    assert_eq!(summary["headcount"], 58);
    assert_eq!(out["data"]["bu-summaries"]["data"].as_array().unwrap().len(), 2);
    assert!(out["data"]["revenue-trend"]["data"].is_array());
    Ok(())
}

#[cfg(unix)]
#[test]
fn briefing_uses_ai_provider() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-test")
        .with_status(200)
        .with_body(r#"{"content":[{"type":"text","text":"Cloudsense DM% needs attention."}]}"#)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let config = write_config(temp.path(), &server.url());
    write_scripts(temp.path());

    let out = json_stdout(
        pintel(&config)
            .env("ANTHROPIC_API_KEY", "sk-test")
            .args(["--format", "json", "briefing"]),
    );

    assert_eq!(out["data"]["status"], "ready");
    assert_eq!(out["data"]["summary"], "Cloudsense DM% needs attention.");
    mock.assert();
    Ok(())
}

#[cfg(unix)]
#[test]
fn briefing_without_key_is_placeholder() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = workspace();
    write_scripts(temp.path());

    pintel(&config)
        .args(["--format", "table", "briefing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set ANTHROPIC_API_KEY to enable briefings"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn report_renders_every_section_with_cache_stats() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = workspace();
    write_scripts(temp.path());

    let out = json_stdout(pintel(&config).args(["--format", "json", "report"]));

    let sections = out["data"]["sections"].as_object().unwrap();
    assert_eq!(sections.len(), 10);
    assert!(sections["dashboard"].get("data").is_some());
    assert!(sections["portfolio"].get("data").is_some());
    assert!(out["data"]["cache"]["hits"].as_u64().unwrap() > 0);
    Ok(())
}

#[test]
fn seed_then_list_customers() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = workspace();
    let seed = temp.path().join("customers.json");
    fs::write(
        &seed,
        r#"[
          {"name": "Acme", "bu": "STL", "rr": 100000.0, "nrr": 0.0, "total": 100000.0,
           "subscriptions": [{"sub_id": "S-1", "arr": 100000.0, "will_renew": "No"}]},
          {"name": "Globex", "bu": "Kandy", "rr": 900000.0, "nrr": 0.0, "total": 900000.0}
        ]"#,
    )?;

    pintel(&config)
        .arg("seed")
        .arg(&seed)
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded 2 customers"));

    let out = json_stdout(pintel(&config).args(["--format", "json", "customers"]));
    let customers = out["data"].as_array().unwrap();
    assert_eq!(customers.len(), 2);
    assert_eq!(customers[0]["name"], "Globex");
    assert_eq!(customers[1]["health_score"], "red");
    Ok(())
}

#[test]
fn seed_rejects_invalid_file() -> Result<(), Box<dyn std::error::Error>> {
    let (temp, config) = workspace();
    let seed = temp.path().join("bad.json");
    fs::write(&seed, r#"[{"name": "Acme", "rr": 1.0, "nrr": 0.0, "total": 1.0}]"#)?;

    pintel(&config)
        .arg("seed")
        .arg(&seed)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bu must not be empty"));
    Ok(())
}

#[test]
fn watch_stops_after_iterations() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = workspace();

    let assert = pintel(&config)
        .args(["--format", "table", "watch", "baseline", "--interval", "1", "--iterations", "2"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert_eq!(stdout.matches("Scenario Baseline unavailable").count(), 2);
    Ok(())
}

#[test]
fn missing_config_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let missing = temp.path().join("nope.yaml");

    pintel(&missing)
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
    Ok(())
}

#[test]
fn completion_generates_script() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp, config) = workspace();

    pintel(&config)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pintel"));
    Ok(())
}
