//! vk - Vulkan layer operations on Android devices.
//!
//! Provides both human-friendly and script-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io;

use clap::{CommandFactory, Parser};
use tracing::{debug, info};

use vk::cli::{Cli, Commands, CompletionsArgs};
use vk::commands::{self, Context};
use vk::device::{AdbConfig, AdbDevice};
use vk::error::Result;
use vk::interrupt::InterruptFlag;
use vk::logging;
use vk::output::{Output, OutputMode};
use vk::presets::PresetStore;
use vk::prompt::TerminalPrompt;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> Option<&'static str> {
        option_env!("VERGEN_GIT_SHA")
    }

    pub fn build_timestamp() -> Option<&'static str> {
        option_env!("VERGEN_BUILD_TIMESTAMP")
    }
}

fn main() {
    let cli = Cli::parse();
    let mode = OutputMode::from_cli(&cli);
    logging::init_logging(mode.is_robot(), cli.verbose, cli.quiet);
    let output = mode.into_output();

    if let Err(e) = run(&cli, output.as_ref()) {
        if e.is_clean_abort() {
            // Declined prompts and Ctrl+C are not failures.
            info!(reason = %e, "Stopped by operator");
            output.info(&e.to_string());
            return;
        }
        output.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, output: &dyn Output) -> Result<()> {
    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Version => return cmd_version(output),
        Commands::Completions(args) => return cmd_completions(args),
        _ => {}
    }

    let interrupt = InterruptFlag::install();
    let device = AdbDevice::new(AdbConfig {
        program: cli.adb.clone(),
        serial: cli.serial.clone(),
    });
    let store = match &cli.settings {
        Some(path) => PresetStore::open(path)?,
        None => PresetStore::open_default()?,
    };
    debug!(settings = %store.path().display(), "Loaded settings");
    let prompt = TerminalPrompt::new().with_interrupt(interrupt.clone());
    let mut ctx = Context::new(&device, store, &prompt, output, interrupt);

    match command {
        Commands::DumpApi(args) => commands::dump_api(&mut ctx, args),
        Commands::DumpImg(args) => commands::dump_img(&mut ctx, args),
        Commands::Record(args) => commands::record(&mut ctx, args),
        Commands::Validate(args) => commands::validate(&mut ctx, args),
        Commands::Replay(args) => commands::replay(&mut ctx, args),
        Commands::Install(args) => commands::install(&mut ctx, args),
        Commands::Layer(args) => commands::layer(&mut ctx, args),
        Commands::Layerset(args) => commands::layerset(&mut ctx, args),
        Commands::Pull(args) => commands::pull(&mut ctx, args),
        Commands::Push(args) => commands::push(&mut ctx, args),
        Commands::Query(args) => commands::query(&mut ctx, args),
        Commands::Version | Commands::Completions(_) => Ok(()),
    }
}

// === Utilities ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_version(output: &dyn Output) -> Result<()> {
    output.version_info(
        build_info::VERSION,
        build_info::git_sha(),
        build_info::build_timestamp(),
    );
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn cmd_completions(args: &CompletionsArgs) -> Result<()> {
    clap_complete::generate(args.shell, &mut Cli::command(), "vk", &mut io::stdout());
    Ok(())
}
