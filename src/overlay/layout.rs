use crate::settings::OverlaySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Center,
    Left,
}

pub fn line_count(text: &str) -> usize {
    text.split('\n').count().max(1)
}

pub fn required_height(settings: &OverlaySettings, lines: usize) -> i32 {
    let lines = i32::try_from(lines).unwrap_or(i32::MAX);
    let content = lines
        .saturating_mul(settings.line_height)
        .saturating_add(settings.padding);
    content.max(settings.min_height)
}

pub fn centered_x(screen_width: i32, panel_width: i32) -> i32 {
    (screen_width - panel_width) / 2
}

/// Geometry for a panel displaying `text` on a screen `screen_width` wide.
pub fn panel_geometry(settings: &OverlaySettings, screen_width: i32, text: &str) -> PanelGeometry {
    PanelGeometry {
        x: centered_x(screen_width, settings.width),
        y: settings.top_offset,
        width: settings.width,
        height: required_height(settings, line_count(text)),
    }
}

/// Multi-line batches read better left-justified.
pub fn text_align(text: &str) -> TextAlign {
    if line_count(text) > 1 {
        TextAlign::Left
    } else {
        TextAlign::Center
    }
}
