//! `vk replay`: replay a trace with the gfxreconstruct replayer app.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::apps::LAST_USED;
use crate::cli::ReplayArgs;
use crate::device::Device;
use crate::error::{Missing, Result, VkError};
use crate::names;
use crate::presets::SELECT;
use crate::prompt;
use crate::repo::{self, TraceRepo};
use crate::transfer::{self, ConfirmSession};

use super::Context;

pub const REPLAYER: &str = "com.lunarg.gfxreconstruct.replay";
const REPLAYER_ACTIVITY: &str = "com.lunarg.gfxreconstruct.replay/android.app.NativeActivity";

/// Replayer command line for `trace_path`; screenshots go to `snap_dir`.
pub fn replayer_args(args: &ReplayArgs, trace_path: &str, snap_dir: Option<&str>) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(frame) = args.pause_frame {
        out.push(format!("--pause-frame {frame}"));
    }
    if let Some(index) = args.surface_index {
        out.push(format!("--surface-index {index}"));
    }
    if let (Some(range), Some(dir)) = (&args.screenshots, snap_dir) {
        out.push(format!("--screenshots {range}"));
        out.push(format!("--screenshot-dir {dir}"));
        out.push(format!("--screenshot-prefix {}", args.screenshot_prefix));
        out.push(format!("--screenshot-scale {}", args.screenshot_scale));
        out.push("--screenshot-format png".to_string());
    }
    if args.skip_failed_allocations {
        out.push("--sfa".to_string());
    }
    if args.omit_pipeline_cache {
        out.push("--opcd".to_string());
    }
    out.push(trace_path.to_string());
    out
}

#[instrument(skip_all, fields(trace = %args.trace))]
pub fn replay<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &ReplayArgs) -> Result<()> {
    ctx.device.stop_app(REPLAYER)?;

    let (app, trace_file) = resolve_trace(ctx, &args.trace)?;
    let repo = TraceRepo::new(&app);
    let trace_path = repo.path_for_file(&trace_file);

    let snap_dir = match &args.screenshots {
        Some(_) => {
            let dir = repo::snap_folder();
            ctx.device.make_dir(&dir)?;
            Some(dir)
        }
        None => None,
    };

    let extras = format!(
        "--es 'args' '{}'",
        replayer_args(args, &trace_path, snap_dir.as_deref()).join(" ")
    );
    ctx.output.info(&format!("Replaying {trace_path}"));
    let result = ctx.device.start_activity(REPLAYER_ACTIVITY, &extras)?;
    debug!(result = %result, "Replayer started");

    if result.contains("Error:") {
        if let Some(dir) = &snap_dir {
            if let Err(e) = ctx.device.remove_dir(dir) {
                warn!(dir, error = %e, "Failed to delete screenshot folder");
            }
        }
        return Err(VkError::Other(format!("Replayer failed to start:\n{result}")));
    }

    let Some(snap_dir) = snap_dir else {
        return Ok(());
    };

    let folder = args.pull.clone().unwrap_or_else(|| {
        PathBuf::from("./output")
            .join(&app)
            .join(names::parse_tag(&trace_file))
    });
    let outcome = pull_screenshots(ctx, &snap_dir, &folder);
    let cleanup = ctx.device.remove_dir(&snap_dir);
    match (outcome, cleanup) {
        (Ok(()), Ok(())) => {
            ctx.output.success(&format!("Screenshots saved to {}", folder.display()));
            Ok(())
        }
        (Ok(()), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            warn!(dir = %snap_dir, error = %cleanup_err, "Failed to delete screenshot folder");
            Err(e)
        }
    }
}

/// Wait for the replay to finish, then copy its screenshots to `folder`.
fn pull_screenshots<D: Device + ?Sized>(
    ctx: &Context<'_, D>,
    snap_dir: &str,
    folder: &Path,
) -> Result<()> {
    ctx.wait_for_app(REPLAYER, false)?;
    let mut confirm = ConfirmSession::new(false);
    let transfers = transfer::pull_dir(ctx.device, snap_dir, folder, &mut confirm, ctx.prompt)?;
    ctx.output.transfers(&transfers);
    Ok(())
}

/// App and trace file name for a replay argument.
///
/// `?` and `!` resolve an app and then ask for one of its traces, as does a
/// bare package name. A full trace name must exist on the device.
fn resolve_trace<D: Device + ?Sized>(
    ctx: &mut Context<'_, D>,
    input: &str,
) -> Result<(String, String)> {
    let (app, explicit) = if input == SELECT || input == LAST_USED {
        (ctx.resolve_app(input)?, None)
    } else {
        let app = names::parse_app_name(input);
        if app.is_empty() {
            return Err(VkError::BadParameter(format!(
                "Can not find app name in '{input}'"
            )));
        }
        let explicit = (app != input).then(|| input.to_string());
        (app, explicit)
    };

    let repo = TraceRepo::new(&app);
    let trace = match explicit {
        Some(trace) => {
            let path = repo.path_for_file(&trace);
            if !ctx.device.file_exists(&path)? {
                return Err(VkError::not_found(Missing::DeviceFile, path));
            }
            trace
        }
        None => {
            let traces = repo.list(ctx.device)?;
            if traces.is_empty() {
                return Err(VkError::not_found(Missing::DeviceFile, repo.folder()));
            }
            prompt::choose(
                ctx.prompt,
                "Available traces:",
                &traces,
                "Please choose a trace",
            )?
        }
    };
    Ok((app, trace))
}
