//! `vk install`: copy layer binaries onto the device.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::cli::InstallArgs;
use crate::device::{Device, global_layer_dir, keys};
use crate::error::{Missing, Result, VkError};
use crate::presets::SELECT;
use crate::prompt;

use super::Context;

const LAYER_EXT: &str = "so";
const STAGING_DIR: &str = "/data/local/tmp";

fn is_layer_binary(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == LAYER_EXT)
}

/// `.so` files directly inside `dir`, sorted.
fn layer_binaries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_layer_binary(p))
        .collect();
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Host files named by an install argument.
///
/// A folder is remembered so that `?` can offer its binaries next time. A
/// file that does not exist is looked up by name in that folder.
fn resolve_layer_files<D: Device + ?Sized>(
    ctx: &mut Context<'_, D>,
    layer_path: &str,
) -> Result<Vec<PathBuf>> {
    let path = Path::new(layer_path);

    if path.is_dir() {
        let files = layer_binaries(path)?;
        for file in &files {
            ctx.output.info(&format!("Found layer {}", file.display()));
        }
        ctx.store.set_layer_dir(path)?;
        return Ok(files);
    }

    if layer_path == SELECT {
        let dir = ctx
            .store
            .layer_dir()
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf)
            .ok_or_else(|| VkError::not_found(Missing::HostPath, "last layer folder"))?;
        let names: Vec<String> = layer_binaries(&dir)?.iter().map(|p| file_name(p)).collect();
        let name = prompt::choose(
            ctx.prompt,
            "Valid layer binaries:",
            &names,
            "Please select a layer file to install",
        )?;
        ctx.output.info(&format!("Selected layer binary: {name}"));
        return Ok(vec![dir.join(name)]);
    }

    if path.exists() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut name = file_name(path);
    if !name.ends_with(".so") {
        name.push_str(".so");
    }
    let resolved = ctx.store.layer_dir().map(|dir| dir.join(&name));
    match resolved {
        Some(resolved) if resolved.is_file() => {
            ctx.output
                .info(&format!("Found resolved file path: {}", resolved.display()));
            Ok(vec![resolved])
        }
        _ => Err(VkError::not_found(Missing::HostPath, name)),
    }
}

#[instrument(skip_all, fields(layer_path = %args.layer_path))]
pub fn install<D: Device + ?Sized>(ctx: &mut Context<'_, D>, args: &InstallArgs) -> Result<()> {
    let files = resolve_layer_files(ctx, &args.layer_path)?;
    if files.is_empty() {
        ctx.output.warning("Found no layers");
        return Ok(());
    }

    let userdebug = ctx.device.get_prop(keys::BUILD_TYPE)? == "userdebug";
    debug!(userdebug, count = files.len(), "Installing layers");

    let Some(input) = &args.app else {
        ctx.output.info("Install layers globally (require ROOT access!)");
        ctx.device.exec(&["root"])?;
        ctx.device.exec(&["disable-verity"])?;
        ctx.device.shell("setenforce 0")?;
        let dst = global_layer_dir();
        ctx.device.make_dir(dst)?;
        for file in &files {
            ctx.device.push(file, dst)?;
            if userdebug {
                ctx.device
                    .shell(&format!("chmod +x {dst}/{}", file_name(file)))?;
            }
        }
        ctx.output.success(&format!("Install layers to {dst} successfully."));
        return Ok(());
    };

    let app = ctx.resolve_app(input)?;
    for file in &files {
        let name = file_name(file);
        if userdebug {
            let dst = format!("/data/data/{app}");
            ctx.device.push(file, &dst)?;
            ctx.device.shell(&format!("chmod +x {dst}/{name}"))?;
        } else {
            // Only the app itself can write its data folder on user builds.
            ctx.device.push(file, STAGING_DIR)?;
            ctx.device
                .shell(&format!("run-as {app} cp {STAGING_DIR}/{name} ."))?;
        }
    }
    ctx.output
        .success(&format!("Install layers to '{app}' successfully."));
    Ok(())
}
