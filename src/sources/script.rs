//! Spreadsheet extraction through helper scripts
//!
//! The spreadsheets are read by Python scripts under `<project>/scripts`
//! that print JSON on stdout and progress on stderr. Every way a run can go
//! wrong maps to its own adapter error so the degraded message tells the
//! operator what to fix.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::Instant;

use super::{AdapterHealth, HealthCheck};
use crate::error::{Error, Result};

/// Adapter name used in errors and health output
pub const ADAPTER: &str = "excel";

/// Per-BU financial summaries (`--type financials`)
pub const FINANCIALS_SCRIPT: &str = "parse_excel_to_json.py";

/// DM% / retention tracker
pub const DM_SCRIPT: &str = "extract_dm_data.py";

/// Runs an extraction script and returns its JSON output.
#[async_trait]
pub trait Extraction: HealthCheck {
    async fn extract(&self, script: &str, args: &[&str]) -> Result<Value>;
}

/// Subprocess-backed [`Extraction`].
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: String,
    scripts_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<String>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            scripts_dir: scripts_dir.into(),
        }
    }

    fn spawn_error(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::NotFound {
            Error::adapter(
                ADAPTER,
                format!(
                    "Python 3 not found (tried '{}'). Install Python 3 to extract spreadsheet data.",
                    self.interpreter
                ),
            )
        } else {
            Error::adapter(
                ADAPTER,
                format!("failed to start '{}': {}", self.interpreter, err),
            )
        }
    }
}

#[async_trait]
impl Extraction for ScriptRunner {
    async fn extract(&self, script: &str, args: &[&str]) -> Result<Value> {
        let path = self.scripts_dir.join(script);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::adapter(
                ADAPTER,
                format!(
                    "extraction script not found at {}. Check project structure.",
                    path.display()
                ),
            ));
        }

        debug!("Running {} {} {:?}", self.interpreter, path.display(), args);
        let started = Instant::now();

        let output = Command::new(&self.interpreter)
            .arg(&path)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("[{}] {}", script, line.trim());
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let last = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(str::trim)
                .unwrap_or("no error output");
            return Err(Error::adapter(
                ADAPTER,
                format!("{} exited with status {}: {}", script, code, last),
            ));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            Error::adapter(
                ADAPTER,
                format!("failed to parse data from {}: output is not UTF-8", script),
            )
        })?;

        let value: Value = serde_json::from_str(&stdout).map_err(|e| {
            Error::adapter(
                ADAPTER,
                format!(
                    "failed to parse data from {}: {}. Check spreadsheet format.",
                    script, e
                ),
            )
        })?;

        debug!("Extracted {} in {:?}", script, started.elapsed());
        Ok(value)
    }
}

#[async_trait]
impl HealthCheck for ScriptRunner {
    async fn health(&self) -> AdapterHealth {
        let probe = Command::new(&self.interpreter)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;
        if let Err(err) = probe {
            return AdapterHealth::failed(ADAPTER, self.spawn_error(err).to_string());
        }

        let mut missing = Vec::new();
        for script in [FINANCIALS_SCRIPT, DM_SCRIPT] {
            let path = self.scripts_dir.join(script);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                missing.push(script);
            }
        }

        match missing.len() {
            0 => AdapterHealth::connected(ADAPTER),
            2 => AdapterHealth::failed(
                ADAPTER,
                format!("no extraction scripts in {}", self.scripts_dir.display()),
            ),
            _ => AdapterHealth::degraded(ADAPTER, format!("missing {}", missing.join(", "))),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::sources::AdapterStatus;
    use tempfile::TempDir;

    /// Scripts are run by `sh` here so the tests do not need Python.
    fn runner_with(scripts: &[(&str, &str)]) -> (TempDir, ScriptRunner) {
        let dir = TempDir::new().unwrap();
        for (name, body) in scripts {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let runner = ScriptRunner::new("sh", dir.path());
        (dir, runner)
    }

    #[tokio::test]
    async fn test_extract_parses_stdout() {
        let (_dir, runner) = runner_with(&[(
            "fin.sh",
            "echo 'loading workbook' >&2\necho '{\"financials\": {\"STL\": {\"totalRR\": 10}}}'\n",
        )]);

        let value = runner.extract("fin.sh", &["--type", "financials"]).await.unwrap();
        assert_eq!(value["financials"]["STL"]["totalRR"], 10);
    }

    #[tokio::test]
    async fn test_extract_passes_arguments() {
        let (_dir, runner) = runner_with(&[("args.sh", "printf '[\"%s\",\"%s\"]' \"$1\" \"$2\"\n")]);

        let value = runner.extract("args.sh", &["--type", "financials"]).await.unwrap();
        assert_eq!(value, serde_json::json!(["--type", "financials"]));
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.py"), "print('{}')").unwrap();
        let runner = ScriptRunner::new("definitely-not-a-python-3", dir.path());

        let err = runner.extract("x.py", &[]).await.unwrap_err();
        assert_eq!(err.kind(), "adapter");
        assert!(err.to_string().contains("Python 3 not found"));
    }

    #[tokio::test]
    async fn test_missing_script() {
        let (_dir, runner) = runner_with(&[]);

        let err = runner.extract(DM_SCRIPT, &[]).await.unwrap_err();
        assert!(err.to_string().contains("extraction script not found"));
        assert!(err.to_string().contains(DM_SCRIPT));
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_code_and_last_line() {
        let (_dir, runner) = runner_with(&[(
            "boom.sh",
            "echo 'opening file' >&2\necho 'KeyError: Sheet1' >&2\nexit 3\n",
        )]);

        let err = runner.extract("boom.sh", &[]).await.unwrap_err().to_string();
        assert!(err.contains("status 3"));
        assert!(err.contains("KeyError: Sheet1"));
        assert!(!err.contains("opening file"));
    }

    #[tokio::test]
    async fn test_non_json_output() {
        let (_dir, runner) = runner_with(&[("text.sh", "echo 'Traceback (most recent call last)'\n")]);

        let err = runner.extract("text.sh", &[]).await.unwrap_err();
        assert!(err.to_string().contains("failed to parse data"));
    }

    #[tokio::test]
    async fn test_health_reports_missing_scripts() {
        let (_dir, runner) = runner_with(&[(DM_SCRIPT, "")]);
        let health = runner.health().await;
        assert_eq!(health.status, AdapterStatus::Degraded);
        assert!(health.detail.unwrap().contains(FINANCIALS_SCRIPT));

        let (_dir, runner) = runner_with(&[]);
        assert_eq!(runner.health().await.status, AdapterStatus::Failed);

        let (_dir, runner) = runner_with(&[(DM_SCRIPT, ""), (FINANCIALS_SCRIPT, "")]);
        assert_eq!(runner.health().await.status, AdapterStatus::Connected);
    }

    #[tokio::test]
    async fn test_health_without_interpreter_fails() {
        let runner = ScriptRunner::new("definitely-not-a-python-3", "/nonexistent");
        let health = runner.health().await;
        assert_eq!(health.status, AdapterStatus::Failed);
        assert!(health.detail.unwrap().contains("not found"));
    }

    #[cfg(feature = "script-tests")]
    #[tokio::test]
    async fn test_real_python_interpreter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("emit.py"),
            "import json, sys\nprint(json.dumps({'argv': sys.argv[1:]}))\n",
        )
        .unwrap();
        let runner = ScriptRunner::new("python3", dir.path());

        let value = runner.extract("emit.py", &["--type", "financials"]).await.unwrap();
        assert_eq!(value["argv"][1], "financials");
    }
}
