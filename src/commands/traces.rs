//! `vk pull` and `vk push`.

use tracing::instrument;

use crate::cli::{PullArgs, PushArgs};
use crate::device::Device;
use crate::error::Result;
use crate::transfer::{self, ConfirmSession};

use super::Context;

#[instrument(skip_all, fields(path = %args.path))]
pub fn pull<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &PullArgs) -> Result<()> {
    let mut confirm = ConfirmSession::new(args.force);
    let transfers = transfer::pull_traces(
        ctx.device,
        &ctx.store,
        ctx.prompt,
        &args.path,
        &args.destination,
        &mut confirm,
    )?;
    ctx.output.transfers(&transfers);
    Ok(())
}

#[instrument(skip_all, fields(src = %args.src_path.display()))]
pub fn push<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &PushArgs) -> Result<()> {
    let mut confirm = ConfirmSession::new(args.force);
    let transfers = transfer::push_path(ctx.device, &args.src_path, &mut confirm, ctx.prompt)?;
    ctx.output.transfers(&transfers);
    Ok(())
}
