//! Theme system for human-mode output.

use console::Style;

/// Visual theme for vk human-mode output.
///
/// Centralizes colors and styles for consistent rendering.
pub struct VkTheme {
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warning: Style,
    pub muted: Style,

    pub header: Style,
    pub label: Style,
    pub value: Style,
    pub layer: Style,
    pub app: Style,
}

impl Default for VkTheme {
    fn default() -> Self {
        Self {
            accent: Style::new().blue().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warning: Style::new().yellow().bold(),
            muted: Style::new().dim(),
            header: Style::new().blue().bold(),
            label: Style::new().dim(),
            value: Style::new().bold(),
            layer: Style::new().cyan(),
            app: Style::new().magenta().italic(),
        }
    }
}
