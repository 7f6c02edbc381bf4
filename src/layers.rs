//! Ordered, duplicate-free layer lists and the edit operations on them.
//!
//! The order of a [`LayerList`] is the order in which the Vulkan loader
//! chains the layers, so it is preserved verbatim everywhere.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::device::{Device, LayerProps};
use crate::error::{Result, VkError};

/// Token meaning "every layer" in a remove request.
pub const ALL_LAYERS: &str = "*";

/// Ordered list of unique layer names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerList(Vec<String>);

impl LayerList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a colon-joined value as stored on the device.
    ///
    /// Empty strings and the `null` that `settings get` prints for unset keys
    /// both produce an empty list. Duplicates keep their first position.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == "null" {
            return Self::new();
        }
        Self::new().add(value.split(':').filter(|s| !s.is_empty()))
    }

    /// Colon-joined form written back to the device.
    #[must_use]
    pub fn to_value(&self) -> String {
        self.0.join(":")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn contains(&self, layer: &str) -> bool {
        self.0.iter().any(|l| l == layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Append every layer not already present, in `to_add` order.
    #[must_use]
    pub fn add<I, S>(mut self, to_add: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for layer in to_add {
            let layer = layer.as_ref();
            if !self.contains(layer) {
                self.0.push(layer.to_string());
            }
        }
        self
    }

    /// Keep the layers not named in `to_remove`. The `*` token removes all.
    #[must_use]
    pub fn remove<I, S>(self, to_remove: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let to_remove: Vec<String> = to_remove
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if to_remove.iter().any(|l| l == ALL_LAYERS) {
            return Self::new();
        }
        Self(
            self.0
                .into_iter()
                .filter(|l| !to_remove.contains(l))
                .collect(),
        )
    }

    /// Replace the whole list.
    #[must_use]
    pub fn set<I, S>(to_set: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new().add(to_set)
    }

    /// Append one layer, keeping the list unique.
    #[must_use]
    pub fn with(self, layer: &str) -> Self {
        self.add([layer])
    }
}

impl std::fmt::Display for LayerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&self.to_value())
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for LayerList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new().add(iter)
    }
}

/// A requested change to an active layer list, as given on the command line.
///
/// Each field holds a colon-joined list (`VK_LAYER_a:VK_LAYER_b`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerEdit {
    pub add: Option<String>,
    pub remove: Option<String>,
    pub set: Option<String>,
    pub clear: bool,
}

impl LayerEdit {
    /// Reject mutually exclusive combinations before anything touches the device.
    pub fn validate(&self) -> Result<()> {
        if self.add.is_some() && self.clear {
            return Err(VkError::UsageConflict(
                "--add can not be used with --clear".to_string(),
            ));
        }
        if self.set.is_some() && (self.add.is_some() || self.remove.is_some()) {
            return Err(VkError::UsageConflict(
                "--set can not be used with --add or --remove".to_string(),
            ));
        }
        Ok(())
    }

    /// Compute the new list from `current`.
    ///
    /// `set` replaces; otherwise `add` runs before `remove`.
    pub fn apply(&self, current: LayerList) -> Result<LayerList> {
        self.validate()?;
        if let Some(set) = &self.set {
            return Ok(LayerList::set(split(set)));
        }
        let mut layers = current;
        if let Some(add) = &self.add {
            layers = layers.add(split(add));
        }
        if let Some(remove) = &self.remove {
            layers = layers.remove(split(remove));
        }
        Ok(layers)
    }
}

fn split(value: &str) -> impl Iterator<Item = &str> {
    value.split(':').filter(|s| !s.is_empty())
}

/// Apply `edit` to the live configuration of `device`.
///
/// With an app, the per-app list is edited and per-app layers are enabled for
/// that app; otherwise the global list is edited. `clear` resets everything
/// regardless of `app`.
#[instrument(skip(device, edit))]
pub fn apply_edit<D: Device + ?Sized>(
    device: &D,
    app: Option<&str>,
    edit: &LayerEdit,
) -> Result<()> {
    edit.validate()?;
    let props = LayerProps::new(device);

    if edit.clear {
        return clear(device);
    }

    if let Some(app) = app {
        props.set_enabled(true)?;
        props.set_app(Some(app))?;
        let updated = edit.apply(props.app_layers()?)?;
        debug!(app, layers = %updated, "Updating per-app layers");
        props.set_app_layers(&updated)
    } else {
        let updated = edit.apply(props.global_layers()?)?;
        debug!(layers = %updated, "Updating global layers");
        props.set_global_layers(&updated)
    }
}

/// Hard reset: disable per-app layers and empty both layer lists.
#[instrument(skip(device))]
pub fn clear<D: Device + ?Sized>(device: &D) -> Result<()> {
    let props = LayerProps::new(device);
    props.set_enabled(false)?;
    props.set_app(None)?;
    props.set_app_layers(&LayerList::new())?;
    props.set_global_layers(&LayerList::new())?;
    debug!("Cleared all layer settings");
    Ok(())
}
