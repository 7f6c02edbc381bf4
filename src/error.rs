//! Error types for Vulkan layer CLI operations.

use thiserror::Error;

/// What kind of entity a [`VkError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    App,
    Preset,
    DeviceFile,
    TraceRepo,
    HostPath,
    Layer,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::App => "package",
            Self::Preset => "preset",
            Self::DeviceFile => "file on device",
            Self::TraceRepo => "trace repo",
            Self::HostPath => "host path",
            Self::Layer => "layer binary",
        };
        f.write_str(label)
    }
}

/// Primary error type for vk operations.
#[derive(Error, Debug)]
pub enum VkError {
    // Remote execution
    #[error("Execution failure [exit status: {status}]: {command}\n{output}")]
    ExecutionFailure {
        command: String,
        status: i32,
        output: String,
    },

    #[error("Failed to launch '{program}': {reason}")]
    ExecutorUnavailable { program: String, reason: String },

    // Lookup
    #[error("Can not find {kind} '{name}'")]
    NotFound { kind: Missing, name: String },

    // Usage
    #[error("{0}")]
    UsageConflict(String),

    #[error("Invalid value: {0}")]
    BadParameter(String),

    // Operator
    #[error("Aborted: {0}")]
    UserAbort(String),

    #[error("Interrupted by operator")]
    Interrupted,

    // Settings
    #[error("Settings parse error: {0}")]
    SettingsParse(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl VkError {
    /// Shorthand for a [`VkError::NotFound`].
    pub fn not_found(kind: Missing, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::UsageConflict(_)
                | Self::BadParameter(_)
                | Self::ExecutorUnavailable { .. }
        )
    }

    /// Returns true for operator-initiated terminations, which are not failures.
    pub const fn is_clean_abort(&self) -> bool {
        matches!(self, Self::UserAbort(_) | Self::Interrupted)
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ExecutorUnavailable { .. } => {
                Some("Install Android platform-tools or point --adb / VK_ADB at the adb binary")
            }
            Self::NotFound {
                kind: Missing::App, ..
            } => Some("Run: vk query --app"),
            Self::NotFound {
                kind: Missing::Preset,
                ..
            } => Some("Run: vk query --layerset"),
            Self::NotFound {
                kind: Missing::Layer,
                ..
            } => Some("Install the layer first: vk install --app <app_name> <layer.so>"),
            Self::UsageConflict(_) => Some("Run the command with --help to see valid combinations"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using VkError.
pub type Result<T> = std::result::Result<T, VkError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| VkError::Other(format!("{}: {e}", f().into())))
    }
}
