//! gfxreconstruct capture settings.

use std::fmt;
use std::str::FromStr;

use crate::device::keys;
use crate::error::VkError;

/// Frames to capture: every frame, or the half-open range `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameRange {
    #[default]
    All,
    Range { start: u32, end: u32 },
}

impl FromStr for FrameRange {
    type Err = VkError;

    /// `*`, `start` or `start-end`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value == "*" {
            return Ok(Self::All);
        }

        let bad = || VkError::BadParameter(format!("incorrect format {value}, should be (*|start[-end])"));
        let (start, end) = match value.split_once('-') {
            Some((start, end)) => (start, Some(end)),
            None => (value, None),
        };
        let start: u32 = start.parse().map_err(|_| bad())?;
        let end = match end {
            Some(end) => end.parse::<u32>().map_err(|_| bad())?,
            None => start.checked_add(1).ok_or_else(bad)?,
        };
        if end <= start {
            return Err(VkError::BadParameter(format!(
                "end index {end} is less than start index {start}!"
            )));
        }
        Ok(Self::Range { start, end })
    }
}

impl fmt::Display for FrameRange {
    /// The inclusive form gfxreconstruct expects (`5`, `5-9`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Range { start, end } if *end == start + 1 => write!(f, "{start}"),
            Self::Range { start, end } => write!(f, "{start}-{}", end - 1),
        }
    }
}

/// Capture properties for one recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Device path of the trace file.
    pub trace_path: String,
    pub frames: FrameRange,
    pub log: bool,
}

impl CaptureOptions {
    pub fn new(trace_path: impl Into<String>) -> Self {
        Self {
            trace_path: trace_path.into(),
            frames: FrameRange::All,
            log: false,
        }
    }

    /// Device path of the capture log, when logging.
    pub fn log_path(&self) -> Option<String> {
        self.log.then(|| format!("{}.log", self.trace_path))
    }

    /// System properties to set while recording.
    ///
    /// File timestamps stay off so the trace keeps its `<app>-<tag>` name.
    pub fn props(&self) -> Vec<(String, String)> {
        let mut props = vec![
            (keys::CAPTURE_FILE.to_string(), self.trace_path.clone()),
            (keys::CAPTURE_FILE_TIMESTAMP.to_string(), "false".to_string()),
        ];
        if let FrameRange::Range { .. } = self.frames {
            props.push((keys::CAPTURE_FRAMES.to_string(), self.frames.to_string()));
        }
        if let Some(log) = self.log_path() {
            props.push((keys::CAPTURE_LOG_FILE.to_string(), log));
        }
        props
    }
}
