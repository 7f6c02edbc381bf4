//! `vk dump-api` and `vk dump-img`.
//!
//! Both enable a dump layer, keep it active until the operator stops it, then
//! optionally pull the output and always delete it from the device.

use tracing::{instrument, warn};

use crate::cli::{DumpApiArgs, DumpImgArgs};
use crate::device::{Device, keys};
use crate::error::{Result, ResultExt, VkError};
use crate::prompt;
use crate::repo;
use crate::session::{Scope, SessionSpec, with_session};

use super::Context;

pub const API_DUMP_LAYER: &str = "VK_LAYER_LUNARG_api_dump";
pub const API_DUMP_LAYER_FILE: &str = "libVkLayer_api_dump.so";
pub const SCREENSHOT_LAYER: &str = "VK_LAYER_LUNARG_screenshot";
pub const SCREENSHOT_LAYER_FILE: &str = "libVkLayer_screenshot.so";

const STOP: &str = "s";
const STOP_AND_PULL: &str = "sp";
const STOP_QUESTION: &str = "Want to Stop or Stop-and-Pull (s/sp)?";
/// The answer prompt only sees Ctrl+C once a line is submitted.
pub const CANCEL_HINT: &str = "Press Ctrl+C then Enter to cancel the dump.";

/// Screenshot output of global dumps, and the parent of every image folder.
const SHARED_OUTPUT_DIR: &str = "/sdcard/Android/vkcli";

const STORAGE_PERMISSIONS: [&str; 2] = [
    "android.permission.READ_EXTERNAL_STORAGE",
    "android.permission.WRITE_EXTERNAL_STORAGE",
];

/// API dumps go to the app's own external folder, which the app can write
/// without storage permissions.
fn api_dump_folder(app: Option<&str>) -> String {
    app.map_or_else(
        || SHARED_OUTPUT_DIR.to_string(),
        |app| format!("/sdcard/Android/data/{app}/files"),
    )
}

#[instrument(skip_all)]
pub fn dump_api<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &DumpApiArgs) -> Result<()> {
    let app = match &args.app {
        Some(input) => Some(ctx.resolve_app(input)?),
        None => None,
    };
    ctx.require_layer(app.as_deref(), API_DUMP_LAYER_FILE)?;

    let filename = args
        .filename
        .clone()
        .or_else(|| app.clone())
        .unwrap_or_else(|| "vk_apidump".to_string());
    let time = repo::timestamp();
    let ext = args.format.extension();

    // Property values are capped at 92 bytes, so the device file gets a short name.
    let folder = api_dump_folder(app.as_deref());
    let device_path = format!("{folder}/{time}.api.{ext}");
    ctx.device.make_dir(&folder)?;

    let spec = SessionSpec::new(Scope::from_app(app.as_deref()), API_DUMP_LAYER)
        .with_prop(keys::API_DUMP_LOG_FILENAME, &device_path)
        .with_prop(keys::API_DUMP_OUTPUT_FORMAT, args.format.as_str())
        .with_prop(keys::API_DUMP_OUTPUT_RANGE, &args.range)
        .with_prop(keys::API_DUMP_DETAILED, "true")
        .with_prop(keys::API_DUMP_TIMESTAMP, args.timestamp.to_string())
        .restart_app(true);

    let outcome = with_session(ctx.device, &spec, |_| {
        ctx.output.info(&format!(
            "Start dumping API (range={}) to {device_path}",
            args.range
        ));
        ctx.prompt.show(CANCEL_HINT);
        prompt::one_of(ctx.prompt, STOP_QUESTION, &[STOP, STOP_AND_PULL])
    })
    .and_then(|answer| {
        if answer != STOP_AND_PULL {
            return Ok(());
        }
        std::fs::create_dir_all(&args.destination)?;
        let local = args.destination.join(format!("{filename}_{time}.api.{ext}"));
        ctx.output
            .info(&format!("Copying api dump file to {}", local.display()));
        ctx.device.pull(&device_path, &local)
    });

    discard_output(ctx, outcome, "API dump", &device_path, |device| {
        device.remove_file(&device_path)
    })
}

#[instrument(skip_all)]
pub fn dump_img<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &DumpImgArgs) -> Result<()> {
    let app = match &args.app {
        Some(input) => Some(ctx.resolve_app(input)?),
        None => None,
    };
    ctx.require_layer(app.as_deref(), SCREENSHOT_LAYER_FILE)?;

    if let Some(app) = &app {
        for permission in STORAGE_PERMISSIONS {
            ctx.device
                .shell(&format!("pm grant {app} {permission}"))
                .with_context(|| {
                    format!("Failed to grant external storage permission to {app}")
                })?;
        }
    }

    let filename = args
        .filename
        .clone()
        .or_else(|| app.clone())
        .unwrap_or_else(|| "screenshot".to_string());
    let folder = format!("{SHARED_OUTPUT_DIR}/{filename}_{}.imgs", repo::timestamp());
    ctx.device.make_dir(&folder)?;

    let spec = SessionSpec::new(Scope::from_app(app.as_deref()), SCREENSHOT_LAYER)
        .with_prop(keys::SCREENSHOT_DIR, &folder)
        .with_prop(keys::SCREENSHOT_FRAMES, &args.range)
        .restart_app(true);

    let outcome = with_session(ctx.device, &spec, |_| {
        ctx.output.info(&format!(
            "Start dumping screenshots (range [start-count-step]={}) to {folder}",
            args.range
        ));
        ctx.prompt.show(CANCEL_HINT);
        prompt::one_of(ctx.prompt, STOP_QUESTION, &[STOP, STOP_AND_PULL])
    })
    .and_then(|answer| {
        if answer != STOP_AND_PULL {
            return Ok(());
        }
        std::fs::create_dir_all(&args.destination)?;
        ctx.output.info(&format!(
            "Copying {folder} to {}",
            args.destination.display()
        ));
        ctx.device.pull(&folder, &args.destination)
    });

    discard_output(ctx, outcome, "Screenshot dump", &folder, |device| {
        device.remove_dir(&folder)
    })
}

/// Delete dump output from the device whatever `outcome` was.
///
/// A cleanup failure is reported only when the dump itself succeeded.
fn discard_output<D, F>(
    ctx: &Context<'_, D>,
    outcome: Result<()>,
    what: &str,
    target: &str,
    remove: F,
) -> Result<()>
where
    D: Device + ?Sized,
    F: FnOnce(&D) -> Result<()>,
{
    if matches!(outcome, Err(VkError::Interrupted)) {
        ctx.output.info(&format!("{what} is canceled."));
    }
    match remove(ctx.device) {
        Ok(()) => ctx
            .output
            .info(&format!("{target} has been deleted on device.")),
        Err(e) if outcome.is_ok() => return Err(e),
        Err(e) => warn!(target, error = %e, "Failed to delete dump output"),
    }
    outcome
}
