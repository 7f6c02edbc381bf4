//! Resolving the app a command targets.

use tracing::{debug, info, instrument};

use crate::device::Device;
use crate::error::{Missing, Result, VkError};
use crate::presets::{PresetStore, SELECT};
use crate::prompt::{self, Prompt};

/// Input meaning "the app used last time".
pub const LAST_USED: &str = "!";

/// Turn an `--app` argument into a package installed on the device.
///
/// - `?` picks from the debuggable packages.
/// - `!` reuses the last app, or falls back to `?` when there is none.
/// - anything else must be an installed third-party package.
///
/// The result is remembered as the last used app.
#[instrument(skip(device, store, prompt))]
pub fn resolve_app<D: Device + ?Sized>(
    device: &D,
    store: &mut PresetStore,
    prompt: &dyn Prompt,
    input: &str,
) -> Result<String> {
    let input = if input == LAST_USED {
        let last = store.last_app().unwrap_or(SELECT).to_string();
        debug!(last = %last, "Using last app");
        last
    } else {
        input.to_string()
    };

    let app = if input == SELECT {
        select_app(device, prompt)?
    } else {
        let packages = device.packages(false)?;
        if !packages.contains(&input) {
            return Err(VkError::not_found(Missing::App, input));
        }
        input
    };

    store.set_last_app(&app)?;
    info!(app = %app, "Valid app name");
    Ok(app)
}

/// Menu over the debuggable packages.
pub fn select_app<D: Device + ?Sized>(device: &D, prompt: &dyn Prompt) -> Result<String> {
    let packages = device.packages(true)?;
    if packages.is_empty() {
        return Err(VkError::not_found(Missing::App, "any debuggable package"));
    }
    prompt::choose(
        prompt,
        "  No.  App",
        &packages,
        "Please choose app package",
    )
}
