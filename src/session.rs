//! Scoped layer activation with guaranteed restoration.
//!
//! A [`ConfigSession`] snapshots the four layer activation keys (plus any side
//! properties it is asked to set), activates one purpose layer either globally
//! or for a single app, and writes the snapshot back when it is finished or
//! dropped. Restoration therefore runs on every way out of the guarded block:
//! normal return, a propagated error, an operator interrupt surfacing as
//! [`crate::error::VkError::Interrupted`], or a panic unwinding through it.
//!
//! Entry is not transactional. If a key write fails while entering, no session
//! exists and nothing is rolled back. A failed app launch after the writes does
//! restore.

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::device::{Device, LayerProps};
use crate::error::Result;
use crate::layers::LayerList;

/// Where the purpose layer is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// `debug.vulkan.layers`; applies to every Vulkan app.
    Global,
    /// Per-app layers for one package.
    App(String),
}

impl Scope {
    /// `Global` for `None`.
    pub fn from_app(app: Option<&str>) -> Self {
        app.map_or(Self::Global, |a| Self::App(a.to_string()))
    }

    pub fn app(&self) -> Option<&str> {
        match self {
            Self::Global => None,
            Self::App(app) => Some(app),
        }
    }
}

/// Whether entering the session (re)launches the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchPolicy {
    /// Leave the app alone; the caller drives it.
    #[default]
    Manual,
    /// Stop then start the app on entry (after waking the screen if
    /// `unlock`), and stop it again on exit.
    Restart { unlock: bool },
}

/// What a session activates.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub scope: Scope,
    pub layer: String,
    /// Extra system properties set for the duration of the session.
    pub side_props: Vec<(String, String)>,
    pub launch: LaunchPolicy,
}

impl SessionSpec {
    pub fn new(scope: Scope, layer: impl Into<String>) -> Self {
        Self {
            scope,
            layer: layer.into(),
            side_props: Vec::new(),
            launch: LaunchPolicy::Manual,
        }
    }

    pub fn global(layer: impl Into<String>) -> Self {
        Self::new(Scope::Global, layer)
    }

    pub fn for_app(app: impl Into<String>, layer: impl Into<String>) -> Self {
        Self::new(Scope::App(app.into()), layer)
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.side_props.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn restart_app(mut self, unlock: bool) -> Self {
        self.launch = LaunchPolicy::Restart { unlock };
        self
    }
}

/// The layer activation state of a device at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub global_layers: LayerList,
    pub enabled: bool,
    pub app: Option<String>,
    pub app_layers: LayerList,
}

impl Snapshot {
    /// Four independent reads; not atomic.
    pub fn capture<D: Device + ?Sized>(device: &D) -> Result<Self> {
        let props = LayerProps::new(device);
        Ok(Self {
            global_layers: props.global_layers()?,
            enabled: props.enabled()?,
            app: props.app()?,
            app_layers: props.app_layers()?,
        })
    }

    /// Write every field back, in capture order.
    pub fn restore<D: Device + ?Sized>(&self, device: &D) -> Result<()> {
        let props = LayerProps::new(device);
        props.set_global_layers(&self.global_layers)?;
        props.set_enabled(self.enabled)?;
        props.set_app(self.app.as_deref())?;
        props.set_app_layers(&self.app_layers)
    }
}

/// An open layer activation. Restores the device when finished or dropped.
pub struct ConfigSession<'d, D: Device + ?Sized> {
    device: &'d D,
    snapshot: Snapshot,
    side_snapshot: Vec<(String, String)>,
    driven: Option<String>,
    restored: bool,
}

impl<'d, D: Device + ?Sized> ConfigSession<'d, D> {
    /// Snapshot the device and activate `spec`.
    #[instrument(skip(device, spec), fields(scope = ?spec.scope, layer = %spec.layer))]
    pub fn enter(device: &'d D, spec: &SessionSpec) -> Result<Self> {
        let snapshot = Snapshot::capture(device)?;
        debug!(?snapshot, "Captured layer state");

        let mut side_snapshot = Vec::with_capacity(spec.side_props.len());
        for (key, value) in &spec.side_props {
            side_snapshot.push((key.clone(), device.get_prop(key)?));
            device.set_prop(key, value)?;
        }

        let props = LayerProps::new(device);
        props.set_enabled(true)?;

        match &spec.scope {
            Scope::Global => {
                props.set_global_layers(&snapshot.global_layers.clone().with(&spec.layer))?;
                props.set_app(None)?;
                props.set_app_layers(&LayerList::new())?;
            }
            Scope::App(app) => {
                props.set_global_layers(&LayerList::new())?;
                if snapshot.app.as_deref() == Some(app.as_str()) {
                    props.set_app_layers(&snapshot.app_layers.clone().with(&spec.layer))?;
                } else {
                    props.set_app(Some(app))?;
                    props.set_app_layers(&LayerList::set([spec.layer.as_str()]))?;
                }
            }
        }

        // From here on a failure drops the session, which restores.
        let mut session = Self {
            device,
            snapshot,
            side_snapshot,
            driven: None,
            restored: false,
        };
        if let (LaunchPolicy::Restart { unlock }, Some(app)) = (spec.launch, spec.scope.app()) {
            session.driven = Some(app.to_string());
            if unlock {
                device.unlock_screen()?;
            }
            device.stop_app(app)?;
            device.start_app(app)?;
        }

        info!("Layer session active");
        Ok(session)
    }

    /// State captured on entry.
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Restore now and report any failure.
    pub fn finish(mut self) -> Result<()> {
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        if let Some(app) = &self.driven {
            if let Err(e) = self.device.stop_app(app) {
                warn!(app, error = %e, "Failed to stop app before restoring layers");
            }
        }

        self.snapshot.restore(self.device)?;
        for (key, value) in &self.side_snapshot {
            self.device.set_prop(key, value)?;
        }
        info!("Layer state restored");
        Ok(())
    }
}

impl<D: Device + ?Sized> Drop for ConfigSession<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            error!(error = %e, "Failed to restore layer state");
        }
    }
}

/// Run `body` inside a session for `spec`.
///
/// The body's error wins over a restore error; the latter is logged.
pub fn with_session<D, T, F>(device: &D, spec: &SessionSpec, body: F) -> Result<T>
where
    D: Device + ?Sized,
    F: FnOnce(&ConfigSession<'_, D>) -> Result<T>,
{
    let session = ConfigSession::enter(device, spec)?;
    let result = body(&session);
    let restored = session.finish();
    match (result, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore_err)) => {
            error!(error = %restore_err, "Failed to restore layer state");
            Err(e)
        }
    }
}
