//! CLI test runner with fluent assertions.
//!
//! Provides infrastructure for executing the `vk` binary and verifying output,
//! exit codes and JSON responses in robot mode.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde_json::Value;

/// Runner for the `vk` CLI binary.
///
/// Logging is switched off and the settings file points at `settings` so runs
/// never touch the user's configuration.
///
/// # Example
///
/// ```ignore
/// let cli = CliRunner::new();
/// cli.run(&["version", "--format=json"])
///    .assert_success()
///    .assert_json_field_exists("/version");
/// ```
pub struct CliRunner {
    binary_path: PathBuf,
    env_vars: HashMap<String, String>,
    _settings_dir: tempfile::TempDir,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    #[must_use]
    pub fn new() -> Self {
        let settings_dir = tempfile::tempdir().expect("Failed to create settings dir");
        let settings = settings_dir.path().join("settings.json");
        let mut env_vars = HashMap::new();
        env_vars.insert("RUST_LOG".to_string(), "off".to_string());
        env_vars.insert(
            "VK_SETTINGS".to_string(),
            settings.display().to_string(),
        );
        // Never reach a real adb from tests.
        env_vars.insert("VK_ADB".to_string(), "/nonexistent/adb".to_string());
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_vk")),
            env_vars,
            _settings_dir: settings_dir,
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Execute the command with the given arguments.
    ///
    /// # Panics
    ///
    /// Panics if the binary can not be executed.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_remove("VK_FORMAT")
            .env_remove("ANDROID_SERIAL");
        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute command");
        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Execute with `--robot` for JSON output.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full_args = vec!["--robot"];
        full_args.extend(args);
        self.run(&full_args)
    }
}

/// Captured output from CLI execution with fluent assertions.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub args: Vec<String>,
}

impl CliResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// # Panics
    ///
    /// Panics if the command did not exit with code 0.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "Command {:?} failed with exit code {}: {}",
            self.args,
            self.exit_code,
            self.stderr
        );
        self
    }

    /// # Panics
    ///
    /// Panics if the exit code doesn't match.
    pub fn assert_exit_code(&self, expected: i32) -> &Self {
        assert_eq!(
            self.exit_code, expected,
            "Expected exit code {expected}, got {} for {:?}\nstderr:\n{}",
            self.exit_code, self.args, self.stderr
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stdout doesn't contain the text.
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain \"{text}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stdout doesn't match the pattern.
    pub fn assert_stdout_matches(&self, pattern: &str) -> &Self {
        let re = regex::Regex::new(pattern).expect("Invalid regex pattern");
        assert!(
            re.is_match(&self.stdout),
            "stdout does not match pattern \"{pattern}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stderr doesn't contain the text.
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain \"{text}\"\nActual stderr:\n{}",
            self.stderr
        );
        self
    }

    /// Parse stdout as JSON.
    ///
    /// # Panics
    ///
    /// Panics if stdout is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stdout:\n{}", self.stdout))
    }

    /// Parse stderr as JSON (robot mode errors).
    ///
    /// # Panics
    ///
    /// Panics if stderr is not valid JSON.
    #[must_use]
    pub fn stderr_json(&self) -> Value {
        serde_json::from_str(self.stderr.trim())
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stderr:\n{}", self.stderr))
    }

    /// # Panics
    ///
    /// Panics if the field doesn't exist.
    pub fn assert_json_field_exists(&self, json_pointer: &str) -> &Self {
        let json = self.json();
        assert!(
            json.pointer(json_pointer).is_some(),
            "JSON path {json_pointer} not found in:\n{}",
            self.stdout
        );
        self
    }
}
