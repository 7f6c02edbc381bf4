//! vk library - Vulkan layer operations on Android devices.
//!
//! This library exposes the core functionality of the `vk` CLI for use in tests
//! and potentially other applications.
//!
//! # Modules
//!
//! - `device`: Device abstraction (adb-backed and in-memory mock)
//! - `session`: Scoped layer activation with guaranteed restoration
//! - `layers`: Ordered layer lists and layer edits
//! - `presets`: Settings file with named layer presets
//! - `transfer`: Safe-overwrite copies between host and device
//! - `names`: `<app>-<tag>` trace names
//! - `commands`: One function per CLI command
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod apps;
pub mod capture;
pub mod cli;
pub mod commands;
pub mod device;
pub mod error;
pub mod interrupt;
pub mod layers;
pub mod logging;
pub mod names;
pub mod output;
pub mod presets;
pub mod prompt;
pub mod repo;
pub mod session;
pub mod theme;
pub mod transfer;
