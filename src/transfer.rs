//! Moving traces between device and host without clobbering existing files.
//!
//! When the destination already has a file of the same name, the operator is
//! asked (`y`/`n`/`all`). An approved overwrite first renames the existing
//! file to `<file>.<MMDD_HHMMSS>.bak`, copies, and deletes the backup only
//! once the copy succeeded. A failed copy leaves the backup in place.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::apps;
use crate::device::Device;
use crate::error::{Missing, Result, VkError};
use crate::names;
use crate::presets::{PresetStore, SELECT};
use crate::prompt::{self, OverwriteAnswer, Prompt};
use crate::repo::{self, TRACE_EXT, TraceRepo};

/// Input meaning "the trace used last time".
pub const LAST_TRACE: &str = "!";

/// Overwrite policy shared by one batch of transfers.
#[derive(Debug, Clone, Default)]
pub struct ConfirmSession {
    overwrite_all: bool,
}

impl ConfirmSession {
    /// `force` overwrites without asking.
    pub const fn new(force: bool) -> Self {
        Self {
            overwrite_all: force,
        }
    }

    pub const fn force_overwrite(&self) -> bool {
        self.overwrite_all
    }

    /// Ask whether to overwrite; an `all` answer holds for the rest of the batch.
    pub fn confirm(&mut self, prompt: &dyn Prompt, question: &str) -> Result<bool> {
        if self.overwrite_all {
            return Ok(true);
        }
        Ok(match prompt::overwrite(prompt, question)? {
            OverwriteAnswer::Yes => true,
            OverwriteAnswer::No => false,
            OverwriteAnswer::All => {
                self.overwrite_all = true;
                true
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    Copied,
    Overwritten,
    Skipped,
}

/// Result of one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub source: String,
    pub destination: String,
    pub outcome: TransferOutcome,
}

impl Transfer {
    fn new(source: impl Into<String>, destination: impl Into<String>, outcome: TransferOutcome) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            outcome,
        }
    }
}

fn device_basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn host_backup(path: &Path) -> PathBuf {
    PathBuf::from(repo::backup_name(&path.display().to_string()))
}

/// Copy one device file into `dst_folder`.
#[instrument(skip(device, confirm, prompt), fields(dst = %dst_folder.display()))]
pub fn pull_file<D: Device + ?Sized>(
    device: &D,
    src: &str,
    dst_folder: &Path,
    confirm: &mut ConfirmSession,
    prompt: &dyn Prompt,
) -> Result<Transfer> {
    let dst = dst_folder.join(device_basename(src));
    let dst_display = dst.display().to_string();

    if !dst.exists() {
        std::fs::create_dir_all(dst_folder)?;
        info!("Copying {src} to {}", dst_folder.display());
        device.pull(src, dst_folder)?;
        return Ok(Transfer::new(src, dst_display, TransferOutcome::Copied));
    }

    if !confirm.confirm(prompt, &format!("{dst_display} already exists, overwrite it?"))? {
        debug!(dst = %dst_display, "Kept existing file");
        return Ok(Transfer::new(src, dst_display, TransferOutcome::Skipped));
    }

    let backup = host_backup(&dst);
    std::fs::rename(&dst, &backup)?;
    info!("Copying {src} to {}", dst_folder.display());
    if let Err(e) = device.pull(src, dst_folder) {
        warn!(backup = %backup.display(), "Pull failed; previous file kept as backup");
        return Err(e);
    }
    std::fs::remove_file(&backup)?;
    Ok(Transfer::new(src, dst_display, TransferOutcome::Overwritten))
}

/// Copy a device folder into `dst_parent/<folder name>`.
///
/// A destination that already exists is filled file by file through
/// [`pull_file`], so files already there are not overwritten unasked.
#[instrument(skip(device, confirm, prompt), fields(dst = %dst_parent.display()))]
pub fn pull_dir<D: Device + ?Sized>(
    device: &D,
    src_dir: &str,
    dst_parent: &Path,
    confirm: &mut ConfirmSession,
    prompt: &dyn Prompt,
) -> Result<Vec<Transfer>> {
    let local = dst_parent.join(device_basename(src_dir));

    if !local.exists() {
        std::fs::create_dir_all(dst_parent)?;
        info!("Copying {src_dir} to {}", dst_parent.display());
        device.pull(src_dir, dst_parent)?;
        return Ok(vec![Transfer::new(
            src_dir,
            local.display().to_string(),
            TransferOutcome::Copied,
        )]);
    }

    let mut transfers = Vec::new();
    for name in device.list_dir(src_dir)? {
        let src = format!("{}/{name}", src_dir.trim_end_matches('/'));
        transfers.push(pull_file(device, &src, &local, confirm, prompt)?);
    }
    Ok(transfers)
}

/// Push one `<app>-<tag>.gfxr` file into its app's trace folder on the device.
#[instrument(skip(device, confirm, prompt), fields(file = %host_file.display()))]
pub fn push_trace_file<D: Device + ?Sized>(
    device: &D,
    host_file: &Path,
    confirm: &mut ConfirmSession,
    prompt: &dyn Prompt,
) -> Result<Transfer> {
    let ext = host_file
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    if ext != TRACE_EXT {
        return Err(VkError::BadParameter(format!(
            "Unsupported file type '.{ext}' for {}",
            host_file.display()
        )));
    }

    let file_name = host_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let app = names::parse_app_name(&file_name);
    if app.is_empty() {
        return Err(VkError::BadParameter(format!(
            "Can not find app name in '{file_name}'"
        )));
    }

    let repo = TraceRepo::new(app);
    let folder = repo.folder();
    let source = host_file.display().to_string();
    let dst = repo.path_for_file(&file_name);

    if !repo.list(device)?.contains(&file_name) {
        device.make_dir(&folder)?;
        info!("Push {source} to {folder}");
        device.push(host_file, &folder)?;
        return Ok(Transfer::new(source, dst, TransferOutcome::Copied));
    }

    if !confirm.confirm(
        prompt,
        &format!("{file_name} already exists on device, overwrite it?"),
    )? {
        return Ok(Transfer::new(source, dst, TransferOutcome::Skipped));
    }

    let backup = repo::backup_name(&dst);
    device.rename(&dst, &backup)?;
    info!("Push {source} to {folder}");
    if let Err(e) = device.push(host_file, &folder) {
        warn!(backup = %backup, "Push failed; previous trace kept as backup");
        return Err(e);
    }
    device.remove_file(&backup)?;
    Ok(Transfer::new(source, dst, TransferOutcome::Overwritten))
}

/// Push a trace file, or every trace file directly inside a folder.
///
/// Files in a folder without the trace extension are skipped.
pub fn push_path<D: Device + ?Sized>(
    device: &D,
    path: &Path,
    confirm: &mut ConfirmSession,
    prompt: &dyn Prompt,
) -> Result<Vec<Transfer>> {
    if !path.exists() {
        return Err(VkError::not_found(
            Missing::HostPath,
            path.display().to_string(),
        ));
    }
    if path.is_file() {
        return Ok(vec![push_trace_file(device, path, confirm, prompt)?]);
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut transfers = Vec::with_capacity(files.len());
    for file in files {
        if file.extension().is_some_and(|e| e == TRACE_EXT) {
            transfers.push(push_trace_file(device, &file, confirm, prompt)?);
        } else {
            warn!(file = %file.display(), "Skipping non-trace file");
            transfers.push(Transfer::new(
                file.display().to_string(),
                String::new(),
                TransferOutcome::Skipped,
            ));
        }
    }
    Ok(transfers)
}

/// Pull traces named by `spec` into `dst`.
///
/// `spec` is one of:
/// - `?`: pick an app, then one of its traces
/// - `!`: the last recorded trace
/// - `<app>`: the app's whole trace folder
/// - `<app>-<tag>`: one trace
pub fn pull_traces<D: Device + ?Sized>(
    device: &D,
    store: &PresetStore,
    prompt: &dyn Prompt,
    spec: &str,
    dst: &Path,
    confirm: &mut ConfirmSession,
) -> Result<Vec<Transfer>> {
    let src = if spec == SELECT {
        let app = apps::select_app(device, prompt)?;
        let repo = TraceRepo::new(app);
        let traces = repo.list(device)?;
        if traces.is_empty() {
            return Err(VkError::not_found(Missing::DeviceFile, repo.folder()));
        }
        let trace = prompt::choose(prompt, "Trace files:", &traces, "Please select a trace")?;
        repo.path_for_file(&trace)
    } else {
        let spec = if spec == LAST_TRACE {
            store.last_trace().ok_or_else(|| {
                VkError::BadParameter("Can not find last used trace_name".to_string())
            })?
        } else {
            spec
        };

        let app = names::parse_app_name(spec);
        if app.is_empty() || !repo::apps_with_traces(device)?.contains(&app) {
            return Err(VkError::not_found(Missing::TraceRepo, app));
        }
        let repo = TraceRepo::new(&app);
        if app == spec {
            return pull_dir(device, &repo.folder(), dst, confirm, prompt);
        }
        let path = repo.path_for_file(spec);
        if !device.file_exists(&path)? {
            return Err(VkError::not_found(Missing::DeviceFile, path));
        }
        path
    };

    Ok(vec![pull_file(device, &src, dst, confirm, prompt)?])
}
