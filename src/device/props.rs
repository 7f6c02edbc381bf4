//! Typed access to the layer activation keys.

use tracing::trace;

use super::Device;
use crate::error::Result;
use crate::layers::LayerList;

/// Remote key names.
pub mod keys {
    /// System property: colon-joined global layer list.
    pub const GLOBAL_LAYERS: &str = "debug.vulkan.layers";
    /// Global setting: 0/1, per-app layers only load when set.
    pub const ENABLE_APP_LAYERS: &str = "enable_gpu_debug_layers";
    /// Global setting: package name receiving per-app layers.
    pub const DEBUG_APP: &str = "gpu_debug_app";
    /// Global setting: colon-joined per-app layer list.
    pub const APP_LAYERS: &str = "gpu_debug_layers";

    pub const VALIDATION_ENABLES: &str = "debug.vvl.enables";
    pub const VALIDATION_DISABLES: &str = "debug.vvl.disables";

    pub const API_DUMP_LOG_FILENAME: &str = "debug.vulkan.api_dump.log_filename";
    pub const API_DUMP_OUTPUT_FORMAT: &str = "debug.vulkan.api_dump.output_format";
    pub const API_DUMP_OUTPUT_RANGE: &str = "debug.vulkan.api_dump.output_range";
    pub const API_DUMP_DETAILED: &str = "debug.vulkan.api_dump.detailed";
    pub const API_DUMP_TIMESTAMP: &str = "debug.vulkan.api_dump.timestamp";

    pub const SCREENSHOT_FRAMES: &str = "debug.vulkan.screenshot";
    pub const SCREENSHOT_DIR: &str = "debug.vulkan.screenshot.dir";

    pub const CAPTURE_FILE: &str = "debug.gfxrecon.capture_file";
    pub const CAPTURE_FILE_TIMESTAMP: &str = "debug.gfxrecon.capture_file_timestamp";
    pub const CAPTURE_FRAMES: &str = "debug.gfxrecon.capture_frames";
    pub const CAPTURE_LOG_FILE: &str = "debug.gfxrecon.log_file";

    pub const BUILD_TYPE: &str = "ro.build.type";
}

/// Reads and writes the four layer activation keys of a device.
pub struct LayerProps<'d, D: Device + ?Sized> {
    device: &'d D,
}

impl<'d, D: Device + ?Sized> LayerProps<'d, D> {
    pub const fn new(device: &'d D) -> Self {
        Self { device }
    }

    pub fn global_layers(&self) -> Result<LayerList> {
        Ok(LayerList::parse(&self.device.get_prop(keys::GLOBAL_LAYERS)?))
    }

    pub fn set_global_layers(&self, layers: &LayerList) -> Result<()> {
        trace!(layers = %layers, "Writing global layers");
        self.device.set_prop(keys::GLOBAL_LAYERS, &layers.to_value())
    }

    pub fn enabled(&self) -> Result<bool> {
        Ok(self.device.get_setting(keys::ENABLE_APP_LAYERS)?.trim() == "1")
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.device
            .put_setting(keys::ENABLE_APP_LAYERS, if enabled { "1" } else { "0" })
    }

    /// The app receiving per-app layers; `None` when unset.
    pub fn app(&self) -> Result<Option<String>> {
        let value = self.device.get_setting(keys::DEBUG_APP)?;
        let value = value.trim();
        if value.is_empty() || value == "null" {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }

    pub fn set_app(&self, app: Option<&str>) -> Result<()> {
        self.device.put_setting(keys::DEBUG_APP, app.unwrap_or(""))
    }

    pub fn app_layers(&self) -> Result<LayerList> {
        Ok(LayerList::parse(&self.device.get_setting(keys::APP_LAYERS)?))
    }

    pub fn set_app_layers(&self, layers: &LayerList) -> Result<()> {
        trace!(layers = %layers, "Writing per-app layers");
        self.device.put_setting(keys::APP_LAYERS, &layers.to_value())
    }

    /// Raw colon-joined global value, as stored in presets.
    pub fn global_layers_value(&self) -> Result<String> {
        Ok(self.global_layers()?.to_value())
    }

    /// Raw colon-joined per-app value, as stored in presets.
    pub fn app_layers_value(&self) -> Result<String> {
        Ok(self.app_layers()?.to_value())
    }
}
