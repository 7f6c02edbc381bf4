//! Real device implementation backed by the `adb` executable.

use std::path::{Path, PathBuf};
use std::process::Command;
#[cfg(unix)]
use std::os::unix::process::CommandExt;

use tracing::{debug, instrument, trace};

use super::Device;
use crate::error::{Result, VkError};

const GLOBAL_LAYER_DIR: &str = "/data/local/debug/vulkan";

/// How to reach the device.
#[derive(Debug, Clone)]
pub struct AdbConfig {
    /// Path or name of the adb executable.
    pub program: PathBuf,
    /// Device serial (`adb -s`), if more than one device is attached.
    pub serial: Option<String>,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("adb"),
            serial: None,
        }
    }
}

/// Device reached through `adb`.
///
/// Every adb child runs in its own process group, so Ctrl+C in the terminal
/// only raises vk's interrupt flag and never kills a command halfway through
/// restoring the device.
pub struct AdbDevice {
    config: AdbConfig,
}

impl AdbDevice {
    pub fn new(config: AdbConfig) -> Self {
        debug!(program = %config.program.display(), serial = ?config.serial, "Using adb device");
        Self { config }
    }

    /// Run `adb <args>` and return trimmed stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.config.program);
        if let Some(serial) = &self.config.serial {
            cmd.args(["-s", serial.as_str()]);
        }
        cmd.args(args);
        #[cfg(unix)]
        cmd.process_group(0);

        let command_line = self.display_command(args);
        debug!(">> {command_line}");

        let output = cmd.output().map_err(|e| VkError::ExecutorUnavailable {
            program: self.config.program.display().to_string(),
            reason: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout)
            .trim_matches(['\r', '\n'])
            .to_string();

        if output.status.success() {
            trace!(bytes = stdout.len(), "Command succeeded");
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}\n{stderr}");
        Err(VkError::ExecutionFailure {
            command: command_line,
            status: output.status.code().unwrap_or(-1),
            output: combined.trim_matches(['\r', '\n']).to_string(),
        })
    }

    fn run_shell(&self, command: &str) -> Result<String> {
        self.run(&["shell", command])
    }

    /// Like [`Self::run_shell`], but any execution failure means `false`.
    fn probe(&self, command: &str) -> Result<bool> {
        match self.run_shell(command) {
            Ok(_) => Ok(true),
            Err(VkError::ExecutionFailure { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn display_command(&self, args: &[&str]) -> String {
        let mut parts = vec![self.config.program.display().to_string()];
        if let Some(serial) = &self.config.serial {
            parts.push("-s".to_string());
            parts.push(serial.clone());
        }
        parts.extend(args.iter().map(ToString::to_string));
        parts.join(" ")
    }
}

/// Single-quote a value for the device shell.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn host_path(path: &Path) -> String {
    path.display().to_string()
}

impl Device for AdbDevice {
    #[instrument(skip(self))]
    fn get_prop(&self, key: &str) -> Result<String> {
        self.run_shell(&format!("getprop {key}"))
    }

    #[instrument(skip(self))]
    fn set_prop(&self, key: &str, value: &str) -> Result<()> {
        self.run_shell(&format!("setprop {key} {}", quote(value)))
            .map(drop)
    }

    #[instrument(skip(self))]
    fn get_setting(&self, key: &str) -> Result<String> {
        self.run_shell(&format!("settings get global {key}"))
    }

    #[instrument(skip(self))]
    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.run_shell(&format!("settings put global {key} {}", quote(value)))
            .map(drop)
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        let path = quote(path);
        let out = self.run_shell(&format!("if [ -f {path} ]; then echo True; fi"))?;
        Ok(out.trim() == "True")
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let path = quote(path);
        let out = self.run_shell(&format!("if [ -d {path} ]; then ls {path}; fi"))?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    fn make_dir(&self, path: &str) -> Result<()> {
        let path = quote(path);
        self.run_shell(&format!("if [ ! -d {path} ]; then mkdir -p {path}; fi"))
            .map(drop)
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.run_shell(&format!("mv {} {}", quote(from), quote(to))).map(drop)
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        self.run_shell(&format!("rm {}", quote(path))).map(drop)
    }

    fn remove_dir(&self, path: &str) -> Result<()> {
        self.run_shell(&format!("rm -rf {}", quote(path))).map(drop)
    }

    #[instrument(skip(self, dst), fields(dst = %dst.display()))]
    fn pull(&self, src: &str, dst: &Path) -> Result<()> {
        let src = src.replace('\\', "/");
        self.run(&["pull", &src, &host_path(dst)]).map(drop)
    }

    #[instrument(skip(self, src), fields(src = %src.display()))]
    fn push(&self, src: &Path, dst: &str) -> Result<()> {
        let dst = dst.replace('\\', "/");
        self.run(&["push", &host_path(src), &dst]).map(drop)
    }

    fn packages(&self, debuggable_only: bool) -> Result<Vec<String>> {
        let mut cmd = String::from("pm list packages -3 | sort | sed 's/^package://'");
        if debuggable_only {
            cmd.push_str(" | xargs -n1 sh -c 'if run-as $0 true; then echo $0; fi' 2> /dev/null");
        }
        let out = self.run_shell(&cmd)?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    fn stop_app(&self, app: &str) -> Result<()> {
        self.run_shell(&format!("am force-stop {}", quote(app))).map(drop)
    }

    fn start_app(&self, app: &str) -> Result<()> {
        self.run_shell(&format!(
            "monkey -p {} -c android.intent.category.LAUNCHER 1",
            quote(app)
        ))
        .map(drop)
    }

    fn start_activity(&self, activity: &str, extras: &str) -> Result<String> {
        self.run_shell(&format!(
            "am start -n {activity} -a android.intent.action.MAIN -c android.intent.category.LAUNCHER {extras}"
        ))
    }

    fn is_running(&self, app: &str) -> Result<bool> {
        self.probe(&format!("pidof {}", quote(app)))
    }

    fn unlock_screen(&self) -> Result<()> {
        self.run_shell("input keyevent KEYCODE_WAKEUP")?;
        self.run_shell("wm dismiss-keyguard").map(drop)
    }

    fn has_app_layer(&self, app: &str, file: &str) -> bool {
        self.probe(&format!("run-as {} ls {}", quote(app), quote(file)))
            .unwrap_or(false)
    }

    fn has_global_layer(&self, file: &str) -> bool {
        self.probe(&format!("ls {}", quote(&format!("{GLOBAL_LAYER_DIR}/{file}"))))
            .unwrap_or(false)
    }

    fn shell(&self, command: &str) -> Result<String> {
        self.run_shell(command)
    }

    fn exec(&self, args: &[&str]) -> Result<String> {
        self.run(args)
    }
}

/// Folder holding globally installed layers.
pub const fn global_layer_dir() -> &'static str {
    GLOBAL_LAYER_DIR
}
