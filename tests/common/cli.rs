#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug)]
pub struct ErrorlyRun {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl ErrorlyRun {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

/// An isolated directory holding the database.
pub struct Workspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        Self { temp_dir, root }
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("data").join("errorly.db")
    }
}

pub fn run_errorly<I, S>(workspace: &Workspace, args: I) -> ErrorlyRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::cargo_bin("errorly").expect("errorly binary");
    cmd.current_dir(&workspace.root)
        .env_remove("ERRORLY_DB")
        .env_remove("ERRORLY_URL")
        .env_remove("ERRORLY_SHARD")
        .env_remove("ERRORLY_USER")
        .env_remove("ERRORLY_LOG")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(workspace.db_path())
        .args(args);

    let output = cmd.output().expect("run errorly");
    ErrorlyRun {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
        code: output.status.code(),
    }
}
