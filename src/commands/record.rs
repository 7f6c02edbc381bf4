//! `vk record`: capture a gfxreconstruct trace of one app run.

use std::path::Path;

use tracing::{info, instrument};

use crate::capture::CaptureOptions;
use crate::cli::RecordArgs;
use crate::device::Device;
use crate::error::{Result, VkError};
use crate::names;
use crate::prompt;
use crate::repo::{TRACE_EXT, TraceRepo};
use crate::session::{SessionSpec, with_session};
use crate::transfer::{self, ConfirmSession};

use super::Context;

pub const CAPTURE_LAYER: &str = "VK_LAYER_LUNARG_gfxreconstruct";

/// `name` with the trace extension appended when it has none.
fn trace_tag(name: &str) -> String {
    if Path::new(name).extension().is_some_and(|ext| ext == TRACE_EXT) {
        name.to_string()
    } else {
        format!("{name}.{TRACE_EXT}")
    }
}

#[instrument(skip_all, fields(app = %args.app))]
pub fn record<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &RecordArgs) -> Result<()> {
    let app = ctx.resolve_app(&args.app)?;
    ctx.device.stop_app(&app)?;

    let tag = trace_tag(&args.filename);
    let repo = TraceRepo::new(&app);
    let trace_path = repo.path_for_tag(&tag);
    if ctx.device.file_exists(&trace_path)?
        && !prompt::confirm(ctx.prompt, &format!("Override existent trace {trace_path}?"))?
    {
        return Err(VkError::UserAbort(format!("kept {trace_path}")));
    }

    let mut capture = CaptureOptions::new(&trace_path);
    capture.frames = args.frames;
    capture.log = args.log;

    let mut spec = SessionSpec::for_app(&app, CAPTURE_LAYER).restart_app(false);
    for (key, value) in capture.props() {
        spec = spec.with_prop(key, value);
    }

    ctx.device.make_dir(&repo.folder())?;
    ctx.output.info(&format!("Start recording {app}..."));
    with_session(ctx.device, &spec, |_| {
        ctx.wait_for_app(&app, true)?;
        ctx.output.info(&format!("{app} is launched"));
        ctx.wait_for_app(&app, false)
    })?;

    ctx.output.success(&format!("Finish recording {trace_path}"));
    ctx.store.set_last_trace(&names::compose(&app, &tag))?;
    info!(trace = %trace_path, "Recorded trace");

    if let Some(folder) = &args.pull {
        let mut confirm = ConfirmSession::new(false);
        let mut sources = vec![trace_path.clone()];
        sources.extend(capture.log_path());
        let mut transfers = Vec::with_capacity(sources.len());
        for src in &sources {
            transfers.push(transfer::pull_file(
                ctx.device,
                src,
                folder,
                &mut confirm,
                ctx.prompt,
            )?);
        }
        ctx.output.transfers(&transfers);
        ctx.output.success(&format!(
            "Finish copying output files to host: \"{}\"",
            folder.display()
        ));
    }
    Ok(())
}
