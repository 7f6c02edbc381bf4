//! CLI argument definitions.

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::capture::FrameRange;

/// vk - Vulkan layer operations on Android devices.
///
/// Wherever an <app_name> is accepted, `?` selects the app from a menu of
/// debuggable packages and `!` reuses the last used app.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "vk", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Output format (text for humans, json for scripts)
    #[arg(long, default_value = "text", global = true, env = "VK_FORMAT")]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v info, -vv debug incl. every adb command, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Target device by serial number (required if multiple devices are attached)
    #[arg(long, short = 's', global = true, env = "ANDROID_SERIAL")]
    pub serial: Option<String>,

    /// Path to the adb executable
    #[arg(long, global = true, env = "VK_ADB", default_value = "adb")]
    pub adb: PathBuf,

    /// Settings file holding layer presets and last used names
    #[arg(long, global = true, env = "VK_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Layer sessions ===
    /// Dump API log with VK_LAYER_LUNARG_api_dump
    DumpApi(DumpApiArgs),

    /// Dump screenshots with VK_LAYER_LUNARG_screenshot
    DumpImg(DumpImgArgs),

    /// Record an API trace of an app with gfxreconstruct
    Record(RecordArgs),

    /// Validate an app with the Khronos validation layer
    Validate(ValidateArgs),

    /// Replay a trace on the device with the gfxreconstruct replayer
    Replay(ReplayArgs),

    // === Layer configuration ===
    /// Install layer binaries to the device
    Install(InstallArgs),

    /// Configure active layer settings
    Layer(LayerArgs),

    /// Save, load or delete layer presets
    Layerset(LayersetArgs),

    // === Traces ===
    /// Pull traces from the device
    Pull(PullArgs),

    /// Push traces to the device
    Push(PushArgs),

    /// Query apps, traces and layers on the device
    Query(QueryArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

/// File format of an API dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    #[default]
    Text,
    Html,
    Json,
}

impl DumpFormat {
    /// Value of the api_dump `output_format` property.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Json => "json",
        }
    }

    /// Extension of the dump file.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Html => "html",
            Self::Json => "json",
        }
    }
}

/// Dump the API calls of an app.
///
/// Without --app the layer is enabled globally and catches the next Vulkan
/// app launched (requires the layer in the global folder).
///
/// # Examples
///
/// ```bash
/// vk dump-api --app com.foo.bar
/// vk dump-api --app ? --range 5-8
/// ```
#[derive(Parser, Debug)]
pub struct DumpApiArgs {
    /// App to launch and dump (?/!/package)
    #[arg(long, value_name = "APP_NAME")]
    pub app: Option<String>,

    /// Output frame range "start(-count(-step))"
    #[arg(long, short = 'r', default_value = "0-0")]
    pub range: String,

    /// Output file format
    #[arg(long, short = 'f', default_value = "text", ignore_case = true)]
    pub format: DumpFormat,

    /// Show timestamp of function calls
    #[arg(long, short = 't')]
    pub timestamp: bool,

    /// Local output folder
    #[arg(long, short = 'd', default_value = "./output", value_name = "PATH")]
    pub destination: PathBuf,

    /// Base name of the pulled file (defaults to the app name)
    pub filename: Option<String>,
}

/// Dump screenshots of an app.
///
/// # Examples
///
/// ```bash
/// vk dump-img --app com.foo.bar
/// vk dump-img --app ? --range 10-5-3
/// ```
#[derive(Parser, Debug)]
pub struct DumpImgArgs {
    /// App to launch and capture (?/!/package)
    #[arg(long, value_name = "APP_NAME")]
    pub app: Option<String>,

    /// Frame range "start-count(-step)"
    #[arg(long, short = 'r', default_value = "1-5")]
    pub range: String,

    /// Local output folder
    #[arg(long, short = 'd', default_value = "./output", value_name = "PATH")]
    pub destination: PathBuf,

    /// Base name of the screenshot folder (defaults to the app name)
    pub filename: Option<String>,
}

/// Record an API trace.
///
/// # Examples
///
/// ```bash
/// vk record -f test.gfxr com.foo.bar
/// vk record --frames 100-200 --pull ./traces ?
/// ```
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// App to record (?/!/package)
    #[arg(default_value = "?", value_name = "APP_NAME")]
    pub app: String,

    /// Trace name; `.gfxr` is appended when missing
    #[arg(long, short = 'f', default_value = "capture.gfxr", value_name = "TRACE_NAME")]
    pub filename: String,

    /// Frames to capture: `*` or start[-end]
    #[arg(long, default_value = "*")]
    pub frames: FrameRange,

    /// Pull the trace (and log) to this local folder afterwards
    #[arg(long, value_name = "LOCAL_FOLDER")]
    pub pull: Option<PathBuf>,

    /// Write capture log messages next to the trace
    #[arg(long)]
    pub log: bool,
}

/// Run an app with the validation layer enabled.
///
/// # Examples
///
/// ```bash
/// vk validate --app com.foo.bar --check-sync
/// vk validate --app com.foo.bar -p
/// ```
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidateArgs {
    /// App to validate (?/!/package)
    #[arg(long, default_value = "?", value_name = "APP_NAME")]
    pub app: String,

    /// Check synchronization
    #[arg(long)]
    pub check_sync: bool,

    /// Check Arm best practices
    #[arg(long)]
    pub check_bp: bool,

    /// Disable core checks
    #[arg(long)]
    pub not_check_core: bool,

    /// Launch the app manually instead of starting it
    #[arg(long = "manual", short = 'p')]
    pub manual: bool,
}

/// Replay a trace.
///
/// TRACE_NAME is one of `?` (pick app and trace), `!` (pick a trace of the last
/// used app), a package name (pick one of its traces) or a trace file name.
///
/// # Examples
///
/// ```bash
/// vk replay com.foo.bar-test.gfxr
/// vk replay com.foo.bar-test.gfxr --screenshots 1,5-10
/// ```
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    #[arg(default_value = "?", value_name = "TRACE_NAME")]
    pub trace: String,

    /// Pause after replaying frame N
    #[arg(long, value_name = "N")]
    pub pause_frame: Option<u32>,

    /// Restrict rendering to the Nth surface object
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub surface_index: Option<i32>,

    /// Dump screenshots for the frames in <RANGE>, e.g. 1,5-10
    #[arg(long, value_name = "RANGE")]
    pub screenshots: Option<String>,

    /// Screenshot scale
    #[arg(long, default_value_t = 1.0)]
    pub screenshot_scale: f32,

    /// Prefix of screenshot file names
    #[arg(long, default_value = "screenshot")]
    pub screenshot_prefix: String,

    /// Skip failed allocations during capture
    #[arg(long, visible_alias = "sfa")]
    pub skip_failed_allocations: bool,

    /// Omit pipeline cache data
    #[arg(long, visible_alias = "opcd")]
    pub omit_pipeline_cache: bool,

    /// Local folder for screenshots (default ./output/<app>/<trace>)
    #[arg(long, value_name = "LOCAL_FOLDER")]
    pub pull: Option<PathBuf>,
}

/// Install layer binaries.
///
/// LAYER_PATH is a `.so` file, a folder of `.so` files, or `?` to pick from
/// the folder installed from last time. Without --app the layers are installed
/// globally, which requires root.
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Install into this app's data folder (?/!/package)
    #[arg(long, value_name = "APP_NAME")]
    pub app: Option<String>,

    pub layer_path: String,
}

/// Edit the active layer lists.
///
/// # Examples
///
/// ```bash
/// vk layer --add VK_LAYER_foo:VK_LAYER_bar
/// vk layer --app ? --add VK_LAYER_foo
/// vk layer --remove '*'
/// ```
#[derive(Parser, Debug)]
pub struct LayerArgs {
    /// Edit the per-app layers of this app (?/!/package)
    #[arg(long, value_name = "APP_NAME")]
    pub app: Option<String>,

    /// Add layers <layer1:layer2:layerN>
    #[arg(long, value_name = "LAYER_NAMES")]
    pub add: Option<String>,

    /// Remove layers <layer1:layer2:layerN>, or `*` for all
    #[arg(long, value_name = "LAYER_NAMES")]
    pub remove: Option<String>,

    /// Replace the layers with <layer1:layer2:layerN>
    #[arg(long, value_name = "LAYER_NAMES")]
    pub set: Option<String>,

    /// Clear every layer setting
    #[arg(long)]
    pub clear: bool,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("action").required(true).args(["save", "load", "delete"])))]
pub struct LayersetArgs {
    /// Preset name (`?` selects from a menu when loading)
    pub name: String,

    /// Save the current layer settings to the preset
    #[arg(long)]
    pub save: bool,

    /// Apply the preset to the device
    #[arg(long)]
    pub load: bool,

    /// Delete the preset
    #[arg(long)]
    pub delete: bool,
}

/// Pull traces.
///
/// PATH is a trace name (`<app_name>-<tag>.gfxr`), a package name for its
/// whole trace folder, `?` to select, or `!` for the last recorded trace.
#[derive(Parser, Debug)]
pub struct PullArgs {
    pub path: String,

    /// Local destination folder
    #[arg(long, short = 'd', default_value = "./output", value_name = "PATH")]
    pub destination: PathBuf,

    /// Overwrite local files without asking
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Trace file, or folder of trace files
    pub src_path: PathBuf,

    /// Overwrite files on the device without asking
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["app", "layer", "layerset", "trace"])))]
pub struct QueryArgs {
    /// Show installed third-party packages
    #[arg(long)]
    pub app: bool,

    /// Show the active layers
    #[arg(long)]
    pub layer: bool,

    /// Show the layer presets
    #[arg(long)]
    pub layerset: bool,

    /// Show traces of <APP_NAME> on the device (`?` to select, `*` for all)
    #[arg(long, value_name = "APP_NAME")]
    pub trace: Option<String>,

    /// Show the raw layer keys
    #[arg(long, requires = "layer")]
    pub detailed: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
