//! Mock device implementation for unit testing.
//!
//! This module provides an in-memory Android device that records every
//! mutating operation and supports assertions for testing. Properties,
//! settings, the device file system and app processes all live in memory;
//! `pull`/`push` move bytes between that file system and the real host one.
//!
//! # Example
//!
//! ```rust,ignore
//! use vk::device::mock::{MockDevice, Operation};
//! use vk::device::Device;
//!
//! let mock = MockDevice::new();
//! mock.set_prop("debug.vulkan.layers", "VK_LAYER_a").unwrap();
//!
//! mock.assert_contains(&Operation::SetProp {
//!     key: "debug.vulkan.layers".to_string(),
//!     value: "VK_LAYER_a".to_string(),
//! });
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, trace};

use super::Device;
use crate::error::{Result, VkError};

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    SetProp { key: String, value: String },
    PutSetting { key: String, value: String },
    MakeDir { path: String },
    Rename { from: String, to: String },
    RemoveFile { path: String },
    RemoveDir { path: String },
    Pull { src: String, dst: String },
    Push { src: String, dst: String },
    StopApp { app: String },
    StartApp { app: String },
    StartActivity { activity: String, extras: String },
    UnlockScreen,
    Shell { command: String },
    Exec { args: Vec<String> },
}

type FailWhen = Box<dyn Fn(&Operation) -> bool + Send>;

/// In-memory device for testing without hardware.
///
/// Reads are not recorded. An unset property reads as `""` and an unset
/// global setting as `"null"`, matching what Android prints.
pub struct MockDevice {
    props: Mutex<HashMap<String, String>>,
    settings: Mutex<HashMap<String, String>>,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    dirs: Mutex<BTreeSet<String>>,
    packages: Mutex<Vec<String>>,
    debuggable: Mutex<HashSet<String>>,
    lifetimes: Mutex<HashMap<String, u32>>,
    running: Mutex<HashMap<String, u32>>,
    app_layers: Mutex<HashSet<(String, String)>>,
    global_layers: Mutex<HashSet<String>>,
    shell_output: Mutex<HashMap<String, String>>,
    operation_log: Mutex<Vec<Operation>>,
    error_injection: Mutex<Option<VkError>>,
    fail_when: Mutex<Vec<FailWhen>>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    #[must_use]
    pub fn new() -> Self {
        debug!("Creating mock device");
        Self {
            props: Mutex::new(HashMap::new()),
            settings: Mutex::new(HashMap::new()),
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(BTreeSet::new()),
            packages: Mutex::new(Vec::new()),
            debuggable: Mutex::new(HashSet::new()),
            lifetimes: Mutex::new(HashMap::new()),
            running: Mutex::new(HashMap::new()),
            app_layers: Mutex::new(HashSet::new()),
            global_layers: Mutex::new(HashSet::new()),
            shell_output: Mutex::new(HashMap::new()),
            operation_log: Mutex::new(Vec::new()),
            error_injection: Mutex::new(None),
            fail_when: Mutex::new(Vec::new()),
        }
    }

    // === Seeding ===

    pub fn seed_prop(&self, key: &str, value: &str) {
        self.props
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn seed_setting(&self, key: &str, value: &str) {
        self.settings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    /// Create a device file (and its parent folders).
    pub fn seed_file(&self, path: &str, contents: &[u8]) {
        self.write_file(&normalize(path), contents.to_vec());
    }

    pub fn seed_dir(&self, path: &str) {
        self.add_dir(&normalize(path));
    }

    /// Third-party packages, with the debuggable subset.
    pub fn set_packages(&self, packages: &[&str], debuggable: &[&str]) {
        *self.packages.lock().unwrap() = packages.iter().map(ToString::to_string).collect();
        *self.debuggable.lock().unwrap() = debuggable.iter().map(ToString::to_string).collect();
    }

    /// Number of `is_running` polls an app answers `true` after each launch.
    ///
    /// Defaults to 1.
    pub fn set_app_lifetime(&self, app: &str, polls: u32) {
        self.lifetimes
            .lock()
            .unwrap()
            .insert(app.to_string(), polls);
    }

    pub fn install_app_layer(&self, app: &str, file: &str) {
        self.app_layers
            .lock()
            .unwrap()
            .insert((app.to_string(), file.to_string()));
    }

    pub fn install_global_layer(&self, file: &str) {
        self.global_layers.lock().unwrap().insert(file.to_string());
    }

    /// Output returned by `shell(command)` (or `exec` with the space-joined args).
    pub fn seed_shell(&self, command: &str, output: &str) {
        self.shell_output
            .lock()
            .unwrap()
            .insert(command.to_string(), output.to_string());
    }

    // === Error injection ===

    /// Inject an error for the next mutating operation.
    pub fn inject_error(&self, error: VkError) {
        *self.error_injection.lock().unwrap() = Some(error);
    }

    /// Fail every operation matching `predicate` with an execution failure.
    pub fn fail_when(&self, predicate: impl Fn(&Operation) -> bool + Send + 'static) {
        self.fail_when.lock().unwrap().push(Box::new(predicate));
    }

    /// Remove injected errors and failure predicates.
    pub fn clear_errors(&self) {
        *self.error_injection.lock().unwrap() = None;
        self.fail_when.lock().unwrap().clear();
    }

    // === Inspection ===

    #[must_use]
    pub fn prop(&self, key: &str) -> Option<String> {
        self.props.lock().unwrap().get(key).cloned()
    }

    #[must_use]
    pub fn setting(&self, key: &str) -> Option<String> {
        self.settings.lock().unwrap().get(key).cloned()
    }

    #[must_use]
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&normalize(path)).cloned()
    }

    #[must_use]
    pub fn has_dir(&self, path: &str) -> bool {
        self.is_dir(&normalize(path))
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Assert the operation never happened.
    ///
    /// # Panics
    ///
    /// Panics if the operation was recorded.
    pub fn assert_not_contains(&self, unexpected: &Operation) {
        let ops = self.operations();
        assert!(
            !ops.contains(unexpected),
            "Unexpected operation {unexpected:?} found in: {ops:#?}",
        );
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    fn begin(&self, op: Operation) -> Result<()> {
        if let Some(error) = self.error_injection.lock().unwrap().take() {
            return Err(error);
        }
        if self.fail_when.lock().unwrap().iter().any(|f| f(&op)) {
            return Err(VkError::ExecutionFailure {
                command: format!("{op:?}"),
                status: 1,
                output: "mock failure".to_string(),
            });
        }
        trace!(?op, "Recording operation");
        self.operation_log.lock().unwrap().push(op);
        Ok(())
    }

    fn is_dir(&self, path: &str) -> bool {
        if self.dirs.lock().unwrap().contains(path) {
            return true;
        }
        let prefix = format!("{path}/");
        self.files
            .lock()
            .unwrap()
            .keys()
            .any(|k| k.starts_with(&prefix))
    }

    fn add_dir(&self, path: &str) {
        let mut dirs = self.dirs.lock().unwrap();
        let mut current = path;
        while !current.is_empty() && current != "/" {
            dirs.insert(current.to_string());
            current = parent(current);
        }
    }

    fn write_file(&self, path: &str, contents: Vec<u8>) {
        self.add_dir(parent(path));
        self.files.lock().unwrap().insert(path.to_string(), contents);
    }

    /// Files below `dir`, keyed by their path relative to it.
    fn files_under(&self, dir: &str) -> Vec<(String, Vec<u8>)> {
        let prefix = format!("{dir}/");
        self.files
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .map(|rel| (rel.to_string(), v.clone()))
            })
            .collect()
    }

    fn missing(command: String, path: &str) -> VkError {
        VkError::ExecutionFailure {
            command,
            status: 1,
            output: format!("{path}: No such file or directory"),
        }
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => "",
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn host_files(root: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
    let mut found = Vec::new();
    let mut pending = vec![(String::new(), root.to_path_buf())];
    while let Some((rel, dir)) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let rel = if rel.is_empty() {
                name
            } else {
                format!("{rel}/{name}")
            };
            if entry.path().is_dir() {
                pending.push((rel, entry.path()));
            } else {
                found.push((rel, entry.path()));
            }
        }
    }
    Ok(found)
}

impl Device for MockDevice {
    fn get_prop(&self, key: &str) -> Result<String> {
        Ok(self.prop(key).unwrap_or_default())
    }

    fn set_prop(&self, key: &str, value: &str) -> Result<()> {
        self.begin(Operation::SetProp {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        self.seed_prop(key, value);
        Ok(())
    }

    fn get_setting(&self, key: &str) -> Result<String> {
        Ok(self.setting(key).unwrap_or_else(|| "null".to_string()))
    }

    fn put_setting(&self, key: &str, value: &str) -> Result<()> {
        self.begin(Operation::PutSetting {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        self.seed_setting(key, value);
        Ok(())
    }

    fn file_exists(&self, path: &str) -> Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(&normalize(path)))
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let dir = normalize(path);
        let mut names = BTreeSet::new();
        for file in self.files.lock().unwrap().keys() {
            if parent(file) == dir {
                names.insert(basename(file).to_string());
            }
        }
        for sub in self.dirs.lock().unwrap().iter() {
            if parent(sub) == dir {
                names.insert(basename(sub).to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn make_dir(&self, path: &str) -> Result<()> {
        self.begin(Operation::MakeDir {
            path: path.to_string(),
        })?;
        self.add_dir(&normalize(path));
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.begin(Operation::Rename {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        let (from, to) = (normalize(from), normalize(to));

        let moved = self.files.lock().unwrap().remove(&from);
        if let Some(contents) = moved {
            let target = if self.is_dir(&to) {
                format!("{to}/{}", basename(&from))
            } else {
                to
            };
            self.write_file(&target, contents);
            return Ok(());
        }

        if self.is_dir(&from) {
            for (rel, contents) in self.files_under(&from) {
                self.files.lock().unwrap().remove(&format!("{from}/{rel}"));
                self.write_file(&format!("{to}/{rel}"), contents);
            }
            let prefix = format!("{from}/");
            self.dirs
                .lock()
                .unwrap()
                .retain(|d| d != &from && !d.starts_with(&prefix));
            self.add_dir(&to);
            return Ok(());
        }

        Err(Self::missing(format!("mv {from} {to}"), &from))
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        self.begin(Operation::RemoveFile {
            path: path.to_string(),
        })?;
        let path = normalize(path);
        match self.files.lock().unwrap().remove(&path) {
            Some(_) => Ok(()),
            None => Err(Self::missing(format!("rm {path}"), &path)),
        }
    }

    fn remove_dir(&self, path: &str) -> Result<()> {
        self.begin(Operation::RemoveDir {
            path: path.to_string(),
        })?;
        let path = normalize(path);
        let prefix = format!("{path}/");
        self.files
            .lock()
            .unwrap()
            .retain(|k, _| k != &path && !k.starts_with(&prefix));
        self.dirs
            .lock()
            .unwrap()
            .retain(|d| d != &path && !d.starts_with(&prefix));
        Ok(())
    }

    fn pull(&self, src: &str, dst: &Path) -> Result<()> {
        self.begin(Operation::Pull {
            src: src.to_string(),
            dst: dst.display().to_string(),
        })?;
        let src = normalize(src);

        let single = self.files.lock().unwrap().get(&src).cloned();
        if let Some(contents) = single {
            let target = if dst.is_dir() {
                dst.join(basename(&src))
            } else {
                dst.to_path_buf()
            };
            std::fs::write(target, contents)?;
            return Ok(());
        }

        if self.is_dir(&src) {
            let root = if dst.is_dir() {
                dst.join(basename(&src))
            } else {
                dst.to_path_buf()
            };
            std::fs::create_dir_all(&root)?;
            for (rel, contents) in self.files_under(&src) {
                let target = root.join(&rel);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(target, contents)?;
            }
            return Ok(());
        }

        Err(Self::missing(format!("adb pull {src}"), &src))
    }

    fn push(&self, src: &Path, dst: &str) -> Result<()> {
        self.begin(Operation::Push {
            src: src.display().to_string(),
            dst: dst.to_string(),
        })?;
        let dst = normalize(dst);
        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if src.is_file() {
            let target = if self.is_dir(&dst) {
                format!("{dst}/{name}")
            } else {
                dst
            };
            self.write_file(&target, std::fs::read(src)?);
            return Ok(());
        }

        if src.is_dir() {
            let root = if self.is_dir(&dst) {
                format!("{dst}/{name}")
            } else {
                dst
            };
            self.add_dir(&root);
            for (rel, path) in host_files(src)? {
                self.write_file(&format!("{root}/{rel}"), std::fs::read(path)?);
            }
            return Ok(());
        }

        Err(Self::missing(
            format!("adb push {}", src.display()),
            &src.display().to_string(),
        ))
    }

    fn packages(&self, debuggable_only: bool) -> Result<Vec<String>> {
        let packages = self.packages.lock().unwrap().clone();
        if !debuggable_only {
            return Ok(packages);
        }
        let debuggable = self.debuggable.lock().unwrap();
        Ok(packages
            .into_iter()
            .filter(|p| debuggable.contains(p))
            .collect())
    }

    fn stop_app(&self, app: &str) -> Result<()> {
        self.begin(Operation::StopApp {
            app: app.to_string(),
        })?;
        self.running.lock().unwrap().remove(app);
        Ok(())
    }

    fn start_app(&self, app: &str) -> Result<()> {
        self.begin(Operation::StartApp {
            app: app.to_string(),
        })?;
        let polls = self.lifetimes.lock().unwrap().get(app).copied().unwrap_or(1);
        self.running.lock().unwrap().insert(app.to_string(), polls);
        Ok(())
    }

    fn start_activity(&self, activity: &str, extras: &str) -> Result<String> {
        self.begin(Operation::StartActivity {
            activity: activity.to_string(),
            extras: extras.to_string(),
        })?;
        let app = activity.split('/').next().unwrap_or(activity);
        let polls = self.lifetimes.lock().unwrap().get(app).copied().unwrap_or(1);
        self.running.lock().unwrap().insert(app.to_string(), polls);
        Ok(format!("Starting: Intent {{ cmp={activity} }}"))
    }

    fn is_running(&self, app: &str) -> Result<bool> {
        let mut running = self.running.lock().unwrap();
        match running.get_mut(app) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(true)
            }
            Some(_) => {
                running.remove(app);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn unlock_screen(&self) -> Result<()> {
        self.begin(Operation::UnlockScreen)
    }

    fn has_app_layer(&self, app: &str, file: &str) -> bool {
        self.app_layers
            .lock()
            .unwrap()
            .contains(&(app.to_string(), file.to_string()))
    }

    fn has_global_layer(&self, file: &str) -> bool {
        self.global_layers.lock().unwrap().contains(file)
    }

    fn shell(&self, command: &str) -> Result<String> {
        self.begin(Operation::Shell {
            command: command.to_string(),
        })?;
        Ok(self
            .shell_output
            .lock()
            .unwrap()
            .get(command)
            .cloned()
            .unwrap_or_default())
    }

    fn exec(&self, args: &[&str]) -> Result<String> {
        self.begin(Operation::Exec {
            args: args.iter().map(ToString::to_string).collect(),
        })?;
        Ok(self
            .shell_output
            .lock()
            .unwrap()
            .get(&args.join(" "))
            .cloned()
            .unwrap_or_default())
    }
}
