//! Output mode abstraction for robot and human output.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::Cli;
use crate::error::VkError;
use crate::presets::Preset;
use crate::session::Snapshot;
use crate::transfer::Transfer;

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// Traces of one app on the device.
#[derive(Debug, Clone, Serialize)]
pub struct TraceListing {
    pub app: String,
    pub traces: Vec<String>,
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human { quiet: bool },
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            Self::Human { quiet: cli.quiet }
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human { quiet } => Box::new(HumanOutput::new(quiet)),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &VkError);
    fn warning(&self, message: &str);
    fn info(&self, message: &str);

    // Layer configuration
    /// Active layers; `detailed` shows the raw keys.
    fn layer_state(&self, state: &Snapshot, detailed: bool);
    fn preset_list(&self, presets: &[(String, Preset)]);

    // Device contents
    fn package_list(&self, packages: &[String]);
    fn trace_list(&self, listings: &[TraceListing]);
    fn transfers(&self, transfers: &[Transfer]);

    // Metadata
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>);

    /// Spinner shown while blocking on the device; hidden in robot mode.
    fn progress(&self, message: &str) -> ProgressBar;
}

/// A steady-ticking spinner on stderr.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
