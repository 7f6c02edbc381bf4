//! In-process command runner over [`MockDevice`].
//!
//! Commands are parsed with the real CLI definition and dispatched the way the
//! binary does, against a mock device, a scripted operator and a settings file
//! in a temporary folder. Everything printed is captured by [`RecordingOutput`].

use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use indicatif::ProgressBar;

use vk::cli::{Cli, Commands};
use vk::commands::{self, Context};
use vk::device::WaitOptions;
use vk::device::mock::MockDevice;
use vk::error::{Result, VkError};
use vk::interrupt::InterruptFlag;
use vk::output::{Output, TraceListing};
use vk::presets::{Preset, PresetStore};
use vk::prompt::{Prompt, ScriptedPrompt};
use vk::session::Snapshot;
use vk::transfer::Transfer;

/// One thing a command printed.
#[derive(Debug, Clone)]
pub enum Event {
    Success(String),
    Error(String),
    Warning(String),
    Info(String),
    LayerState(Snapshot),
    Presets(Vec<(String, Preset)>),
    Packages(Vec<String>),
    Traces(Vec<TraceListing>),
    Transfers(Vec<Transfer>),
    Version(String),
}

/// [`Output`] that keeps everything in memory.
#[derive(Default)]
pub struct RecordingOutput {
    events: RefCell<Vec<Event>>,
}

impl RecordingOutput {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Text of every message event.
    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Success(m) | Event::Error(m) | Event::Warning(m) | Event::Info(m) => {
                    Some(m)
                }
                _ => None,
            })
            .collect()
    }

    pub fn has_message(&self, text: &str) -> bool {
        self.messages().iter().any(|m| m.contains(text))
    }

    pub fn last_layer_state(&self) -> Option<Snapshot> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::LayerState(s) => Some(s),
            _ => None,
        })
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Transfers(t) => Some(t),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl Output for RecordingOutput {
    fn success(&self, message: &str) {
        self.push(Event::Success(message.to_string()));
    }

    fn error(&self, error: &VkError) {
        self.push(Event::Error(error.to_string()));
    }

    fn warning(&self, message: &str) {
        self.push(Event::Warning(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.push(Event::Info(message.to_string()));
    }

    fn layer_state(&self, state: &Snapshot, _detailed: bool) {
        self.push(Event::LayerState(state.clone()));
    }

    fn preset_list(&self, presets: &[(String, Preset)]) {
        self.push(Event::Presets(presets.to_vec()));
    }

    fn package_list(&self, packages: &[String]) {
        self.push(Event::Packages(packages.to_vec()));
    }

    fn trace_list(&self, listings: &[TraceListing]) {
        self.push(Event::Traces(listings.to_vec()));
    }

    fn transfers(&self, transfers: &[Transfer]) {
        self.push(Event::Transfers(transfers.to_vec()));
    }

    fn version_info(&self, version: &str, _git_sha: Option<&str>, _build_time: Option<&str>) {
        self.push(Event::Version(version.to_string()));
    }

    fn progress(&self, _message: &str) -> ProgressBar {
        ProgressBar::hidden()
    }
}

/// A mock device plus everything else a command needs.
pub struct Harness {
    pub device: MockDevice,
    pub output: RecordingOutput,
    pub dir: tempfile::TempDir,
    /// Shared with every command context; trigger it to simulate Ctrl+C.
    pub interrupt: InterruptFlag,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            device: MockDevice::new(),
            output: RecordingOutput::default(),
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            interrupt: InterruptFlag::new(),
        }
    }

    /// Device with `apps` installed and debuggable.
    pub fn with_apps(apps: &[&str]) -> Self {
        let harness = Self::new();
        harness.device.set_packages(apps, apps);
        harness
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.path().join("settings.json")
    }

    /// Host folder inside the temp dir (not created).
    pub fn host_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// The settings file as the next command would see it.
    pub fn store(&self) -> PresetStore {
        PresetStore::open(self.settings_path()).expect("Failed to open settings")
    }

    /// Run `vk <argv>` without operator input.
    pub fn run(&self, argv: &[&str]) -> Result<()> {
        self.run_with(argv, &ScriptedPrompt::new(Vec::<String>::new()))
    }

    /// Run `vk <argv>` answering prompts from `answers`.
    pub fn answer(&self, argv: &[&str], answers: &[&str]) -> Result<()> {
        self.run_with(argv, &ScriptedPrompt::new(answers.iter().copied()))
    }

    /// Run `vk <argv>` with a custom operator.
    ///
    /// # Panics
    ///
    /// Panics if `argv` does not parse.
    pub fn run_with(&self, argv: &[&str], prompt: &dyn Prompt) -> Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("vk").chain(argv.iter().copied()))
            .unwrap_or_else(|e| panic!("Failed to parse {argv:?}: {e}"));
        let command = cli.command.expect("Missing subcommand");

        let mut ctx = Context::new(
            &self.device,
            self.store(),
            prompt,
            &self.output,
            self.interrupt.clone(),
        );
        ctx.wait = WaitOptions {
            interval: Duration::ZERO,
        };

        match &command {
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
            Commands::Version | Commands::Completions(_) => {
                panic!("{argv:?} does not reach the device")
            }
        }
    }

    /// Current layer state of the mock device.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.device).expect("Failed to read layer state")
    }
}
