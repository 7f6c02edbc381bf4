//! `vk query`: read-only views of the device and the settings file.

use tracing::instrument;

use crate::apps;
use crate::cli::QueryArgs;
use crate::device::Device;
use crate::error::Result;
use crate::names;
use crate::output::TraceListing;
use crate::presets::SELECT;
use crate::repo::{self, TraceRepo};

use super::Context;

/// `--trace` input listing every app.
const ALL_APPS: &str = "*";

#[instrument(skip_all)]
pub fn query<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &QueryArgs) -> Result<()> {
    if args.app {
        let packages = ctx.device.packages(false)?;
        ctx.output.package_list(&packages);
    } else if let Some(input) = &args.trace {
        let listings = trace_listings(ctx, input)?;
        if listings.is_empty() {
            ctx.output.warning(&format!("Can not find traces for \"{input}\""));
        } else {
            ctx.output.trace_list(&listings);
        }
    } else if args.layer {
        ctx.show_layer_state(args.detailed)?;
    } else if args.layerset {
        ctx.output.preset_list(ctx.store.list());
    }
    Ok(())
}

/// `?` picks an app, `*` covers every app, anything else names an app or one
/// of its traces.
fn trace_listings<D: Device + ?Sized>(
    ctx: &mut Context<'_, D>,
    input: &str,
) -> Result<Vec<TraceListing>> {
    let targets = if input == SELECT {
        vec![apps::select_app(ctx.device, ctx.prompt)?]
    } else if input == ALL_APPS {
        repo::apps_with_traces(ctx.device)?
    } else {
        let app = names::parse_app_name(input);
        if repo::apps_with_traces(ctx.device)?.contains(&app) {
            vec![app]
        } else {
            Vec::new()
        }
    };

    let mut listings = Vec::with_capacity(targets.len());
    for app in targets {
        let traces = TraceRepo::new(&app).list(ctx.device)?;
        if !traces.is_empty() {
            listings.push(TraceListing { app, traces });
        }
    }
    Ok(listings)
}
