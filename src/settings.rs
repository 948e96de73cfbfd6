use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const PANEL_WIDTH: i32 = 600;
pub const PANEL_MIN_HEIGHT: i32 = 60;
pub const PANEL_LINE_HEIGHT: i32 = 25;
pub const PANEL_PADDING: i32 = 30;
pub const PANEL_OPACITY: f32 = 0.8;
pub const PANEL_TOP_OFFSET: i32 = 50;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OverlaySettings {
    /// Fixed panel width. The panel is always centered horizontally.
    #[serde(default = "default_width")]
    pub width: i32,
    /// Height used for a single line of text.
    #[serde(default = "default_min_height")]
    pub min_height: i32,
    #[serde(default = "default_line_height")]
    pub line_height: i32,
    /// Vertical padding added on top of the per-line height.
    #[serde(default = "default_padding")]
    pub padding: i32,
    /// Window alpha in `0.0..=1.0`.
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Distance from the top edge of the screen.
    #[serde(default = "default_top_offset")]
    pub top_offset: i32,
    /// Text wraps once it reaches this width.
    #[serde(default = "default_wrap_width")]
    pub wrap_width: i32,
    #[serde(default = "default_font_size")]
    pub font_size: i32,
    /// Screen size reported by the headless surface.
    #[serde(default = "default_headless_screen")]
    pub headless_screen: (i32, i32),
    /// Seconds an announced batch stays on screen before auto-hiding.
    #[serde(default = "default_show_duration")]
    pub show_duration: f64,
    /// Extra delay after the panel is hidden and before a capture proceeds.
    #[serde(default = "default_capture_settle_ms")]
    pub capture_settle_ms: u64,
    /// When enabled the logger starts at debug level and honours `RUST_LOG`.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional file that receives a copy of every log line.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_width() -> i32 {
    PANEL_WIDTH
}

fn default_min_height() -> i32 {
    PANEL_MIN_HEIGHT
}

fn default_line_height() -> i32 {
    PANEL_LINE_HEIGHT
}

fn default_padding() -> i32 {
    PANEL_PADDING
}

fn default_opacity() -> f32 {
    PANEL_OPACITY
}

fn default_top_offset() -> i32 {
    PANEL_TOP_OFFSET
}

fn default_wrap_width() -> i32 {
    550
}

fn default_font_size() -> i32 {
    16
}

fn default_headless_screen() -> (i32, i32) {
    (1920, 1080)
}

fn default_show_duration() -> f64 {
    1.0
}

fn default_capture_settle_ms() -> u64 {
    100
}

/// Alpha as the 0-255 byte expected by layered windows. Out of range values
/// are clamped.
pub fn opacity_to_alpha(opacity: f32) -> u8 {
    if !opacity.is_finite() {
        return u8::MAX;
    }
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            min_height: default_min_height(),
            line_height: default_line_height(),
            padding: default_padding(),
            opacity: default_opacity(),
            top_offset: default_top_offset(),
            wrap_width: default_wrap_width(),
            font_size: default_font_size(),
            headless_screen: default_headless_screen(),
            show_duration: default_show_duration(),
            capture_settle_ms: default_capture_settle_ms(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl OverlaySettings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(&content)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn sanitize(&mut self) {
        if !self.opacity.is_finite() {
            tracing::warn!(opacity = self.opacity, "invalid overlay opacity; using default");
            self.opacity = PANEL_OPACITY;
        }
        self.opacity = self.opacity.clamp(0.0, 1.0);
        if self.width <= 0 {
            tracing::warn!(width = self.width, "invalid overlay width; using default");
            self.width = PANEL_WIDTH;
        }
        if self.font_size <= 0 {
            tracing::warn!(font_size = self.font_size, "invalid overlay font size; using default");
            self.font_size = default_font_size();
        }
        self.min_height = self.min_height.max(1);
        self.line_height = self.line_height.max(1);
        self.padding = self.padding.max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_to_alpha_clamps_to_byte_range() {
        assert_eq!(opacity_to_alpha(0.0), 0);
        assert_eq!(opacity_to_alpha(1.0), 255);
        assert_eq!(opacity_to_alpha(-2.0), 0);
        assert_eq!(opacity_to_alpha(4.0), 255);
        assert_eq!(opacity_to_alpha(f32::NAN), 255);
    }

    #[test]
    fn defaults_match_compiled_in_geometry() {
        let settings = OverlaySettings::default();
        assert_eq!(settings.width, 600);
        assert_eq!(settings.min_height, 60);
        assert_eq!(settings.line_height, 25);
        assert_eq!(settings.padding, 30);
        assert_eq!(settings.top_offset, 50);
        assert!((settings.opacity - 0.8).abs() < f32::EPSILON);
        assert_eq!(opacity_to_alpha(settings.opacity), 204);
    }

    #[test]
    fn partial_json_fills_missing_fields_with_defaults() {
        let settings: OverlaySettings =
            serde_json::from_str(r#"{ "debug_logging": true, "capture_settle_ms": 5 }"#)
                .expect("partial settings should parse");
        assert!(settings.debug_logging);
        assert_eq!(settings.capture_settle_ms, 5);
        assert_eq!(settings.width, PANEL_WIDTH);
        assert_eq!(settings.show_duration, 1.0);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = OverlaySettings {
            opacity: 3.0,
            width: -5,
            line_height: 0,
            font_size: 0,
            ..OverlaySettings::default()
        };
        settings.sanitize();
        assert_eq!(settings.font_size, 16);
        assert_eq!(settings.opacity, 1.0);
        assert_eq!(settings.width, PANEL_WIDTH);
        assert_eq!(settings.line_height, 1);
    }
}
