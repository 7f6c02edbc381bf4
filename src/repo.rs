//! Device-side trace repository layout.
//!
//! Traces of an app live in `/sdcard/vk_trace_repo/<app>/` and are named
//! `<app>-<tag>`, so the owning app can be recovered from a bare file name.

use chrono::{DateTime, Local};

use crate::device::Device;
use crate::error::Result;
use crate::names;

pub const TRACE_ROOT: &str = "/sdcard/vk_trace_repo";
pub const SNAP_ROOT: &str = "/sdcard/vk_snap_repo";

/// Extension of gfxreconstruct trace files.
pub const TRACE_EXT: &str = "gfxr";

/// `MMDD_HHMMSS` stamp used in backup and output names.
pub fn timestamp() -> String {
    format_timestamp(&Local::now())
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%m%d_%H%M%S").to_string()
}

/// `<path>.<MMDD_HHMMSS>.bak`
pub fn backup_name(path: &str) -> String {
    format!("{path}.{}.bak", timestamp())
}

/// Trace folder of one app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRepo {
    app: String,
}

impl TraceRepo {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into() }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn folder(&self) -> String {
        format!("{TRACE_ROOT}/{}", self.app)
    }

    /// Device path of the trace `<app>-<tag>`.
    pub fn path_for_tag(&self, tag: &str) -> String {
        format!("{}/{}", self.folder(), names::compose(&self.app, tag))
    }

    /// Device path of a file already named `<app>-<tag>`.
    pub fn path_for_file(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.folder())
    }

    /// Trace file names in the folder; empty if it does not exist.
    pub fn list<D: Device + ?Sized>(&self, device: &D) -> Result<Vec<String>> {
        device.list_dir(&self.folder())
    }
}

/// Apps that have a trace folder on the device.
pub fn apps_with_traces<D: Device + ?Sized>(device: &D) -> Result<Vec<String>> {
    device.list_dir(TRACE_ROOT)
}

/// Fresh folder for replay screenshots.
pub fn snap_folder() -> String {
    format!("{SNAP_ROOT}/{}", timestamp())
}
