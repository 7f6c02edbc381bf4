//! Device abstraction for the Android target.
//!
//! [`Device`] is the only way the rest of the crate talks to the phone: the
//! remote key-value configuration surface (system properties and global
//! settings), the device file system, and application processes. The real
//! implementation shells out to `adb`; [`mock::MockDevice`] keeps everything in
//! memory for tests.

mod adb;
pub mod mock;
mod props;

pub use adb::{AdbConfig, AdbDevice, global_layer_dir};
pub use props::{LayerProps, keys};

use std::path::Path;
use std::time::Duration;

use tracing::{debug, instrument, trace};

use crate::error::Result;
use crate::interrupt::InterruptFlag;

/// Core device operations.
///
/// All calls are blocking round trips. Failing remote commands surface as
/// [`crate::error::VkError::ExecutionFailure`]; the `has_*`/`is_*`/`*_exists`
/// probes turn such failures into `false` instead.
pub trait Device {
    // === Remote configuration store ===

    /// Read a system property (`getprop`).
    fn get_prop(&self, key: &str) -> Result<String>;

    /// Write a system property (`setprop`).
    fn set_prop(&self, key: &str, value: &str) -> Result<()>;

    /// Read a global setting (`settings get global`).
    fn get_setting(&self, key: &str) -> Result<String>;

    /// Write a global setting (`settings put global`).
    fn put_setting(&self, key: &str, value: &str) -> Result<()>;

    // === File system ===

    /// Whether a regular file exists at `path`.
    fn file_exists(&self, path: &str) -> Result<bool>;

    /// Names of the entries in a directory; empty if the directory is missing.
    fn list_dir(&self, path: &str) -> Result<Vec<String>>;

    /// `mkdir -p`.
    fn make_dir(&self, path: &str) -> Result<()>;

    /// `mv from to`.
    fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// `rm path`.
    fn remove_file(&self, path: &str) -> Result<()>;

    /// `rm -rf path`.
    fn remove_dir(&self, path: &str) -> Result<()>;

    /// Copy a device file or directory to the host (`adb pull`).
    ///
    /// Into an existing host directory the source keeps its base name;
    /// otherwise `dst` is the new path.
    fn pull(&self, src: &str, dst: &Path) -> Result<()>;

    /// Copy a host file or directory to the device (`adb push`), with the
    /// same destination rules as [`Device::pull`].
    fn push(&self, src: &Path, dst: &str) -> Result<()>;

    // === Applications ===

    /// Third-party packages, optionally only the debuggable ones.
    fn packages(&self, debuggable_only: bool) -> Result<Vec<String>>;

    fn stop_app(&self, app: &str) -> Result<()>;

    /// Launch the app's launcher activity.
    fn start_app(&self, app: &str) -> Result<()>;

    /// Start an explicit activity with intent extras; returns the `am` output.
    fn start_activity(&self, activity: &str, extras: &str) -> Result<String>;

    /// Whether a process for `app` is alive.
    fn is_running(&self, app: &str) -> Result<bool>;

    /// Wake the device and dismiss the keyguard.
    fn unlock_screen(&self) -> Result<()>;

    /// Whether `file` was copied into the app's private folder.
    fn has_app_layer(&self, app: &str, file: &str) -> bool;

    /// Whether `file` is installed in the global debug layer folder.
    fn has_global_layer(&self, file: &str) -> bool;

    // === Escape hatches ===

    /// Run a device shell command line.
    fn shell(&self, command: &str) -> Result<String>;

    /// Run a raw adb command (`adb root`, `adb install ...`).
    fn exec(&self, args: &[&str]) -> Result<String>;
}

/// Polling behavior for [`wait_until`].
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
        }
    }
}

/// Block until the app is (`running = true`) or is no longer running.
///
/// Checks `interrupt` before every poll.
#[instrument(skip(device, opts, interrupt))]
pub fn wait_until<D: Device + ?Sized>(
    device: &D,
    app: &str,
    running: bool,
    opts: WaitOptions,
    interrupt: &InterruptFlag,
) -> Result<()> {
    debug!(app, running, "Waiting for app state");
    loop {
        interrupt.check()?;
        if device.is_running(app)? == running {
            debug!(app, running, "App reached state");
            return Ok(());
        }
        trace!(app, "Still waiting");
        std::thread::sleep(opts.interval);
    }
}
