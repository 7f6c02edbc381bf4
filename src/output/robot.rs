//! Robot mode JSON output implementation.

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, error, instrument, trace};

use crate::error::VkError;
use crate::presets::Preset;
use crate::session::Snapshot;
use crate::transfer::Transfer;

use super::{Output, RobotFormat, TraceListing};

/// JSON output implementation for scripting.
///
/// Every call prints exactly one JSON document. Errors go to stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    #[instrument]
    pub fn new(format: RobotFormat) -> Self {
        debug!(?format, "Creating RobotOutput");
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let json = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match json {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(err) => {
                error!(error = %err, "Serialization failed");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    #[instrument(skip(self, data), fields(format = ?self.format))]
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    #[instrument(skip(self, data))]
    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

impl Output for RobotOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        debug!(message, "Robot: success");
        self.output_json(&serde_json::json!({
            "success": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &VkError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&serde_json::json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        debug!(message, "Robot: warning");
        self.output_json_stderr(&serde_json::json!({
            "warning": true,
            "message": message
        }));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        debug!(message, "Robot: info");
        self.output_json(&serde_json::json!({
            "info": true,
            "message": message
        }));
    }

    #[instrument(skip(self, state))]
    fn layer_state(&self, state: &Snapshot, _detailed: bool) {
        debug!("Robot: layer_state");
        self.output_json(state);
    }

    #[instrument(skip(self, presets), fields(count = presets.len()))]
    fn preset_list(&self, presets: &[(String, Preset)]) {
        debug!("Robot: preset_list");
        let rows: Vec<_> = presets
            .iter()
            .map(|(name, preset)| {
                serde_json::json!({
                    "name": name,
                    "global_layers": preset.global_layers,
                    "app": preset.app,
                    "app_layers": preset.app_layers,
                })
            })
            .collect();
        self.output_json(&rows);
    }

    #[instrument(skip(self, packages), fields(count = packages.len()))]
    fn package_list(&self, packages: &[String]) {
        debug!("Robot: package_list");
        self.output_json(packages);
    }

    #[instrument(skip(self, listings), fields(count = listings.len()))]
    fn trace_list(&self, listings: &[TraceListing]) {
        debug!("Robot: trace_list");
        self.output_json(listings);
    }

    #[instrument(skip(self, transfers), fields(count = transfers.len()))]
    fn transfers(&self, transfers: &[Transfer]) {
        debug!("Robot: transfers");
        self.output_json(transfers);
    }

    #[instrument(skip(self))]
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        debug!(version, ?git_sha, ?build_time, "Robot: version_info");
        self.output_json(&serde_json::json!({
            "version": version,
            "git_sha": git_sha,
            "build_time": build_time,
            "rustc": option_env!("VERGEN_RUSTC_SEMVER"),
            "target": option_env!("VERGEN_CARGO_TARGET_TRIPLE"),
        }));
    }

    fn progress(&self, _message: &str) -> ProgressBar {
        ProgressBar::hidden()
    }
}
