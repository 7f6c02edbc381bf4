//! Command implementations.
//!
//! Each command works against a [`Context`], so the same code runs over adb in
//! the binary and over [`crate::device::mock::MockDevice`] in tests.

mod dump;
mod install;
mod layer;
mod query;
mod record;
mod replay;
mod traces;
mod validate;

pub use dump::{CANCEL_HINT, dump_api, dump_img};
pub use install::install;
pub use layer::{layer, layerset};
pub use query::query;
pub use record::record;
pub use replay::replay;
pub use traces::{pull, push};
pub use validate::validate;

use tracing::debug;

use crate::apps;
use crate::device::{self, Device, WaitOptions};
use crate::error::{Missing, Result, VkError};
use crate::interrupt::InterruptFlag;
use crate::output::Output;
use crate::presets::PresetStore;
use crate::prompt::Prompt;
use crate::session::Snapshot;

/// Everything a command needs.
pub struct Context<'a, D: Device + ?Sized> {
    pub device: &'a D,
    pub store: PresetStore,
    pub prompt: &'a dyn Prompt,
    pub output: &'a dyn Output,
    pub interrupt: InterruptFlag,
    pub wait: WaitOptions,
}

impl<'a, D: Device + ?Sized> Context<'a, D> {
    pub fn new(
        device: &'a D,
        store: PresetStore,
        prompt: &'a dyn Prompt,
        output: &'a dyn Output,
        interrupt: InterruptFlag,
    ) -> Self {
        Self {
            device,
            store,
            prompt,
            output,
            interrupt,
            wait: WaitOptions::default(),
        }
    }

    /// Resolve `?`, `!` or a package name to an installed app.
    pub fn resolve_app(&mut self, input: &str) -> Result<String> {
        apps::resolve_app(self.device, &mut self.store, self.prompt, input)
    }

    /// Block until `app` is running (or has exited), with a spinner.
    pub fn wait_for_app(&self, app: &str, running: bool) -> Result<()> {
        let message = if running {
            format!("Waiting for {app} to launch (ctrl+c to abort)")
        } else {
            format!("Waiting for {app} to exit (ctrl+c to abort)")
        };
        let bar = self.output.progress(&message);
        let result = device::wait_until(self.device, app, running, self.wait, &self.interrupt);
        bar.finish_and_clear();
        result
    }

    /// Fail unless the layer binary `file` is installed for `app`, or globally
    /// when `app` is `None`.
    pub fn require_layer(&self, app: Option<&str>, file: &str) -> Result<()> {
        let installed = match app {
            Some(app) => self.device.has_app_layer(app, file),
            None => self.device.has_global_layer(file),
        };
        debug!(?app, file, installed, "Checked layer binary");
        if installed {
            return Ok(());
        }
        let place = app.map_or_else(|| "globally".to_string(), |app| format!("for {app}"));
        Err(VkError::not_found(Missing::Layer, format!("{file} installed {place}")))
    }

    /// Print the active layers.
    pub fn show_layer_state(&self, detailed: bool) -> Result<()> {
        let state = Snapshot::capture(self.device)?;
        self.output.layer_state(&state, detailed);
        Ok(())
    }
}
