//! Persisted settings: layer presets and last-used names.
//!
//! Everything lives in one JSON record, read fully when the store is opened
//! and rewritten in full after every mutation:
//!
//! ```json
//! {
//!   "app_name": "com.foo.bar",
//!   "trace_name": "com.foo.bar-test.gfxr",
//!   "layer_dir": "/home/me/layers",
//!   "layerset": {
//!     "validation": ["", "com.foo.bar", "VK_LAYER_KHRONOS_validation"]
//!   }
//! }
//! ```
//!
//! Preset order is the order of the record.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::device::{Device, LayerProps};
use crate::error::{Missing, Result, VkError};
use crate::layers::LayerList;
use crate::prompt::{self, Prompt};

/// Input meaning "pick from a menu".
pub const SELECT: &str = "?";

/// A saved layer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PresetTuple", into = "PresetTuple")]
pub struct Preset {
    /// Colon-joined global layers.
    pub global_layers: String,
    pub app: Option<String>,
    /// Colon-joined per-app layers.
    pub app_layers: String,
}

type PresetTuple = (String, Option<String>, String);

impl From<PresetTuple> for Preset {
    fn from((global_layers, app, app_layers): PresetTuple) -> Self {
        Self {
            global_layers,
            app,
            app_layers,
        }
    }
}

impl From<Preset> for PresetTuple {
    fn from(p: Preset) -> Self {
        (p.global_layers, p.app, p.app_layers)
    }
}

impl Preset {
    /// Current layer configuration of `device`.
    pub fn capture<D: Device + ?Sized>(device: &D) -> Result<Self> {
        let props = LayerProps::new(device);
        Ok(Self {
            global_layers: props.global_layers_value()?,
            app: props.app()?,
            app_layers: props.app_layers_value()?,
        })
    }

    /// Write the preset's layers and app to `device`.
    ///
    /// The per-app enable flag is left as it is.
    pub fn apply<D: Device + ?Sized>(&self, device: &D) -> Result<()> {
        let props = LayerProps::new(device);
        props.set_global_layers(&LayerList::parse(&self.global_layers))?;
        props.set_app(self.app.as_deref())?;
        props.set_app_layers(&LayerList::parse(&self.app_layers))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsRecord {
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    trace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    layer_dir: Option<PathBuf>,
    #[serde(default)]
    layerset: serde_json::Map<String, serde_json::Value>,
}

/// The settings file.
#[derive(Debug)]
pub struct PresetStore {
    path: PathBuf,
    last_app: Option<String>,
    last_trace: Option<String>,
    layer_dir: Option<PathBuf>,
    presets: Vec<(String, Preset)>,
}

impl PresetStore {
    /// Default settings location: `<config dir>/vk/settings.json`.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            VkError::Other("Could not determine the configuration directory".to_string())
        })?;
        Ok(dir.join("vk").join("settings.json"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Load the store from `path`; a missing file is an empty store.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let record = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<SettingsRecord>(&content)
                .map_err(|e| VkError::SettingsParse(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file yet");
                SettingsRecord::default()
            }
            Err(e) => return Err(e.into()),
        };

        let mut presets = Vec::with_capacity(record.layerset.len());
        for (name, value) in record.layerset {
            let preset: Preset = serde_json::from_value(value).map_err(|e| {
                VkError::SettingsParse(format!("preset '{name}' in {}: {e}", path.display()))
            })?;
            presets.push((name, preset));
        }
        debug!(presets = presets.len(), "Loaded settings");

        Ok(Self {
            path,
            last_app: record.app_name,
            last_trace: record.trace_name,
            layer_dir: record.layer_dir,
            presets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Presets in stored order.
    pub fn list(&self) -> &[(String, Preset)] {
        &self.presets
    }

    pub fn names(&self) -> Vec<String> {
        self.presets.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Store `preset` under `name`, asking before replacing an existing one.
    ///
    /// A replaced preset keeps its position.
    #[instrument(skip(self, preset, prompt))]
    pub fn save(&mut self, name: &str, preset: Preset, prompt: &dyn Prompt) -> Result<()> {
        if name.is_empty() || name == SELECT {
            return Err(VkError::BadParameter(format!(
                "'{name}' is not a valid preset name"
            )));
        }

        if let Some(slot) = self.presets.iter_mut().find(|(n, _)| n == name) {
            if !prompt::confirm(prompt, &format!("Override existent preset {name}?"))? {
                return Err(VkError::UserAbort(format!("preset '{name}' kept")));
            }
            slot.1 = preset;
        } else {
            self.presets.push((name.to_string(), preset));
        }

        self.persist()?;
        info!(name, "Saved preset");
        Ok(())
    }

    /// Look up a preset; `?` shows a menu.
    pub fn load(&self, name: &str, prompt: &dyn Prompt) -> Result<(String, Preset)> {
        let name = if name == SELECT {
            let names = self.names();
            if names.is_empty() {
                return Err(VkError::not_found(Missing::Preset, SELECT));
            }
            prompt::choose(prompt, "Layer presets:", &names, "Please choose preset")?
        } else {
            name.to_string()
        };

        self.get(&name)
            .cloned()
            .map(|preset| (name.clone(), preset))
            .ok_or_else(|| VkError::not_found(Missing::Preset, name))
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, name: &str) -> Result<Preset> {
        let idx = self
            .presets
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| VkError::not_found(Missing::Preset, name))?;
        let (_, preset) = self.presets.remove(idx);
        self.persist()?;
        info!(name, "Deleted preset");
        Ok(preset)
    }

    pub fn last_app(&self) -> Option<&str> {
        self.last_app.as_deref()
    }

    pub fn set_last_app(&mut self, app: &str) -> Result<()> {
        self.last_app = Some(app.to_string());
        self.persist()
    }

    pub fn last_trace(&self) -> Option<&str> {
        self.last_trace.as_deref()
    }

    pub fn set_last_trace(&mut self, trace: &str) -> Result<()> {
        self.last_trace = Some(trace.to_string());
        self.persist()
    }

    /// Folder of the last directory install.
    pub fn layer_dir(&self) -> Option<&Path> {
        self.layer_dir.as_deref()
    }

    pub fn set_layer_dir(&mut self, dir: &Path) -> Result<()> {
        self.layer_dir = Some(dir.to_path_buf());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let mut layerset = serde_json::Map::new();
        for (name, preset) in &self.presets {
            let value = serde_json::to_value(preset)
                .map_err(|e| VkError::SettingsParse(e.to_string()))?;
            layerset.insert(name.clone(), value);
        }
        let record = SettingsRecord {
            app_name: self.last_app.clone(),
            trace_name: self.last_trace.clone(),
            layer_dir: self.layer_dir.clone(),
            layerset,
        };
        let content = serde_json::to_string_pretty(&record)
            .map_err(|e| VkError::SettingsParse(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "Settings written");
        Ok(())
    }
}
