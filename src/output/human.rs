//! Human-friendly output implementation using console styling.

use console::{Term, measure_text_width};
use indicatif::ProgressBar;
use tracing::{debug, instrument, trace};

use crate::device::keys;
use crate::error::VkError;
use crate::presets::Preset;
use crate::session::Snapshot;
use crate::theme::VkTheme;
use crate::transfer::{Transfer, TransferOutcome};

use super::{Output, TraceListing, spinner};

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    term: Term,
    theme: VkTheme,
    quiet: bool,
}

impl HumanOutput {
    #[instrument]
    pub fn new(quiet: bool) -> Self {
        debug!("Creating HumanOutput");
        Self {
            term: Term::stdout(),
            theme: VkTheme::default(),
            quiet,
        }
    }

    fn line(&self, text: &str) {
        // stdout closed under us (e.g. piped into `head`); nothing to report to
        let _ = self.term.write_line(text);
    }

    fn rule(&self, width: usize) {
        self.line(&self.theme.muted.apply_to("-".repeat(width)).to_string());
    }

    fn label(&self, name: &str) -> String {
        self.theme.label.apply_to(format!("  {name:<10}")).to_string()
    }
}

impl Output for HumanOutput {
    #[instrument(skip(self))]
    fn success(&self, message: &str) {
        debug!(message, "Outputting success");
        if self.quiet {
            return;
        }
        self.line(&format!("{}{message}", self.theme.success.apply_to("[OK] ")));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &VkError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        let stderr = Term::stderr();
        let mut text = format!(
            "{}{}",
            self.theme.error.apply_to("[ERR] "),
            self.theme.value.apply_to(error)
        );
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            text.push_str(&format!(
                "\n  {}\n  {}",
                self.theme.label.apply_to("Suggestion:"),
                self.theme.muted.apply_to(suggestion)
            ));
        }
        let _ = stderr.write_line(&text);
    }

    #[instrument(skip(self))]
    fn warning(&self, message: &str) {
        debug!(message, "Outputting warning");
        let _ = Term::stderr().write_line(&format!(
            "{}{message}",
            self.theme.warning.apply_to("[WARN] ")
        ));
    }

    #[instrument(skip(self))]
    fn info(&self, message: &str) {
        debug!(message, "Outputting info");
        if self.quiet {
            return;
        }
        self.line(&format!("{}{message}", self.theme.accent.apply_to("[INFO] ")));
    }

    #[instrument(skip(self, state))]
    fn layer_state(&self, state: &Snapshot, detailed: bool) {
        debug!(?state, "Outputting layer state");
        if detailed {
            let app = state.app.as_deref().unwrap_or("");
            let enabled = if state.enabled { "1" } else { "0" };
            let rows = [
                (keys::GLOBAL_LAYERS, state.global_layers.to_value()),
                (keys::ENABLE_APP_LAYERS, enabled.to_string()),
                (keys::DEBUG_APP, app.to_string()),
                (keys::APP_LAYERS, state.app_layers.to_value()),
            ];
            let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in rows {
                self.line(&format!(
                    "{}  {}",
                    self.theme.label.apply_to(format!("{key:<width$}")),
                    self.theme.value.apply_to(value)
                ));
            }
            return;
        }

        self.line(&format!(
            "{} {}",
            self.theme.layer.apply_to(&state.global_layers),
            self.theme.muted.apply_to("(global)")
        ));
        match (&state.app, state.enabled) {
            (Some(app), true) => self.line(&format!(
                "{} {}",
                self.theme.layer.apply_to(&state.app_layers),
                self.theme.app.apply_to(format!("({app})"))
            )),
            (Some(app), false) => self.line(&format!(
                "{} {}",
                self.theme.muted.apply_to(&state.app_layers),
                self.theme.muted.apply_to(format!("({app}, disabled)"))
            )),
            (None, _) => {}
        }
    }

    #[instrument(skip(self, presets), fields(count = presets.len()))]
    fn preset_list(&self, presets: &[(String, Preset)]) {
        debug!("Outputting preset list");
        if presets.is_empty() {
            self.info("No layer presets saved");
            return;
        }

        let name_width = presets
            .iter()
            .map(|(name, _)| measure_text_width(name))
            .max()
            .unwrap_or(0)
            .max(4);
        let header = format!("  No.  {:<name_width$}  {:<24}  Layers", "Name", "App");
        self.line(&self.theme.header.apply_to(&header).to_string());
        self.rule(measure_text_width(&header).max(60));
        for (idx, (name, preset)) in presets.iter().enumerate() {
            let app = preset.app.as_deref().unwrap_or("-");
            let layers = match (preset.global_layers.is_empty(), preset.app_layers.is_empty()) {
                (true, true) => "none".to_string(),
                (false, true) => format!("{} (global)", preset.global_layers),
                (true, false) => preset.app_layers.clone(),
                (false, false) => format!("{} (global), {}", preset.global_layers, preset.app_layers),
            };
            self.line(&format!(
                "{:5}  {}  {}  {}",
                idx + 1,
                self.theme.value.apply_to(format!("{name:<name_width$}")),
                self.theme.app.apply_to(format!("{app:<24}")),
                self.theme.layer.apply_to(layers)
            ));
        }
    }

    #[instrument(skip(self, packages), fields(count = packages.len()))]
    fn package_list(&self, packages: &[String]) {
        debug!("Outputting package list");
        if packages.is_empty() {
            self.warning("No third-party packages installed");
            return;
        }
        self.line(&self.theme.header.apply_to("  No.  App").to_string());
        self.rule(40);
        for (idx, package) in packages.iter().enumerate() {
            self.line(&format!("{:5}  {}", idx + 1, self.theme.app.apply_to(package)));
        }
    }

    #[instrument(skip(self, listings), fields(count = listings.len()))]
    fn trace_list(&self, listings: &[TraceListing]) {
        debug!("Outputting trace list");
        for listing in listings {
            self.line(&format!("{}:", self.theme.app.apply_to(&listing.app)));
            for trace in &listing.traces {
                self.line(&format!("  {} {trace}", self.theme.muted.apply_to("└─")));
            }
        }
    }

    #[instrument(skip(self, transfers), fields(count = transfers.len()))]
    fn transfers(&self, transfers: &[Transfer]) {
        debug!("Outputting transfers");
        for transfer in transfers {
            let line = format!("{} -> {}", transfer.source, transfer.destination);
            match transfer.outcome {
                TransferOutcome::Copied => self.success(&line),
                TransferOutcome::Overwritten => self.success(&format!("{line} (overwritten)")),
                TransferOutcome::Skipped => self.info(&format!("Skipped {}", transfer.source)),
            }
        }
    }

    #[instrument(skip(self))]
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        debug!(version, ?git_sha, ?build_time, "Outputting version info");
        self.line(&self.theme.header.apply_to("vk").to_string());
        self.line(&format!("{}{}", self.label("Version"), self.theme.value.apply_to(version)));

        if let Some(sha) = git_sha {
            let dirty =
                sha.contains("dirty") || matches!(option_env!("VERGEN_GIT_DIRTY"), Some("true"));
            let clean_sha = sha.replace("(dirty)", "").trim().to_string();
            let mut row = format!("{}{}", self.label("Git SHA"), self.theme.value.apply_to(clean_sha));
            if dirty {
                row.push_str(&self.theme.warning.apply_to(" (dirty)").to_string());
            }
            self.line(&row);
        }

        let extra = [
            ("Built", build_time),
            ("Rust", option_env!("VERGEN_RUSTC_SEMVER")),
            ("Target", option_env!("VERGEN_CARGO_TARGET_TRIPLE")),
        ];
        for (name, value) in extra {
            if let Some(value) = value {
                self.line(&format!("{}{}", self.label(name), self.theme.muted.apply_to(value)));
            }
        }
    }

    fn progress(&self, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        spinner(message)
    }
}
