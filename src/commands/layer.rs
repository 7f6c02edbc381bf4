//! `vk layer` and `vk layerset`: direct, persistent edits of the layer keys.

use tracing::instrument;

use crate::cli::{LayerArgs, LayersetArgs};
use crate::device::Device;
use crate::error::Result;
use crate::layers::{self, LayerEdit};
use crate::presets::Preset;

use super::Context;

#[instrument(skip_all)]
pub fn layer<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &LayerArgs) -> Result<()> {
    let edit = LayerEdit {
        add: args.add.clone(),
        remove: args.remove.clone(),
        set: args.set.clone(),
        clear: args.clear,
    };
    edit.validate()?;

    if edit.clear {
        layers::clear(ctx.device)?;
        ctx.output.success("Clear all relevant layer settings.");
        return Ok(());
    }

    let app = match &args.app {
        Some(input) => Some(ctx.resolve_app(input)?),
        None => None,
    };
    layers::apply_edit(ctx.device, app.as_deref(), &edit)?;

    ctx.output.success("Successfully updated active layers:");
    ctx.show_layer_state(false)
}

#[instrument(skip_all, fields(name = %args.name))]
pub fn layerset<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &LayersetArgs) -> Result<()> {
    if args.save {
        let preset = Preset::capture(ctx.device)?;
        ctx.store.save(&args.name, preset, ctx.prompt)?;
        ctx.output.success(&format!("Save preset '{}' successfully.", args.name));
        ctx.show_layer_state(false)
    } else if args.load {
        let (name, preset) = ctx.store.load(&args.name, ctx.prompt)?;
        preset.apply(ctx.device)?;
        ctx.output.success(&format!("Load preset '{name}' successfully."));
        ctx.show_layer_state(false)
    } else {
        ctx.store.delete(&args.name)?;
        ctx.output.success(&format!("Delete preset '{}' successfully.", args.name));
        Ok(())
    }
}
