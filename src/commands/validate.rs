//! `vk validate`: run an app under the Khronos validation layer.

use tracing::instrument;

use crate::cli::ValidateArgs;
use crate::device::{Device, keys};
use crate::error::Result;
use crate::session::{SessionSpec, with_session};

use super::Context;

pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";
pub const VALIDATION_LAYER_FILE: &str = "libVkLayer_khronos_validation.so";

const ENABLE_SYNC: &str = "VK_VALIDATION_FEATURE_ENABLE_SYNCHRONIZATION_VALIDATION_EXT";
const ENABLE_ARM_BEST_PRACTICES: &str =
    "VK_VALIDATION_FEATURE_ENABLE_BEST_PRACTICES_EXT:VALIDATION_CHECK_ENABLE_VENDOR_SPECIFIC_ARM";
const DISABLE_CORE: &str = "VK_VALIDATION_FEATURE_DISABLE_CORE_CHECKS_EXT";

/// Values of the `debug.vvl.enables` and `debug.vvl.disables` properties.
///
/// Property values are capped at 92 bytes, which rules out disabling more
/// checks alongside synchronization validation.
pub fn feature_flags(args: &ValidateArgs) -> (String, String) {
    let mut enables = Vec::new();
    let mut disables = Vec::new();
    if args.check_sync {
        enables.push(ENABLE_SYNC);
    }
    if args.check_bp {
        enables.push(ENABLE_ARM_BEST_PRACTICES);
    }
    if args.not_check_core {
        disables.push(DISABLE_CORE);
    }
    (enables.join(":"), disables.join(":"))
}

#[instrument(skip_all, fields(app = %args.app))]
pub fn validate<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &ValidateArgs) -> Result<()> {
    let app = ctx.resolve_app(&args.app)?;
    ctx.require_layer(Some(&app), VALIDATION_LAYER_FILE)?;
    ctx.device.stop_app(&app)?;

    let (enables, disables) = feature_flags(args);
    let mut spec = SessionSpec::for_app(&app, VALIDATION_LAYER)
        .with_prop(keys::VALIDATION_ENABLES, enables)
        .with_prop(keys::VALIDATION_DISABLES, disables);
    if !args.manual {
        spec = spec.restart_app(true);
    }

    with_session(ctx.device, &spec, |_| {
        ctx.output.info(&format!("Validating {app}"));
        if args.manual {
            ctx.device.unlock_screen()?;
            ctx.output
                .info(&format!("Please manually launch {app} (ctrl+c to abort)"));
        }
        ctx.wait_for_app(&app, true)?;
        ctx.output.info(&format!("{app} is launched"));
        ctx.wait_for_app(&app, false)
    })?;

    ctx.output.success(&format!("Finish validating {app}"));
    Ok(())
}
