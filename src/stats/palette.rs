//! Mapping of theme color classes and durations onto concrete colors. Renderers are free to
//! ignore this, statistics themselves only carry the raw class names.

use chrono::Duration;

use crate::utils::time::seconds_f64;

pub const FALLBACK_HEX: &str = "#e7e5e4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    pub id: &'static str,
    pub hex: &'static str,
    pub light_hex: &'static str,
}

const fn option(id: &'static str, hex: &'static str, light_hex: &'static str) -> ColorOption {
    ColorOption { id, hex, light_hex }
}

pub const COLOR_OPTIONS: &[ColorOption] = &[
    option("stone", "#a8a29e", "#e7e5e4"),
    option("gray", "#6b7280", "#e5e7eb"),
    option("slate", "#475569", "#e2e8f0"),
    option("red", "#ef4444", "#fecaca"),
    option("rose", "#f43f5e", "#fecdd3"),
    option("orange", "#f97316", "#fed7aa"),
    option("amber", "#f59e0b", "#fde68a"),
    option("yellow", "#eab308", "#fef08a"),
    option("lime", "#84cc16", "#d9f99d"),
    option("green", "#22c55e", "#bbf7d0"),
    option("emerald", "#10b981", "#a7f3d0"),
    option("teal", "#14b8a6", "#99f6e4"),
    option("cyan", "#06b6d4", "#a5f3fc"),
    option("sky", "#0ea5e9", "#bae6fd"),
    option("blue", "#3b82f6", "#bfdbfe"),
    option("indigo", "#6366f1", "#c7d2fe"),
    option("violet", "#8b5cf6", "#ddd6fe"),
    option("purple", "#a855f7", "#e9d5ff"),
    option("fuchsia", "#d946ef", "#f5d0fe"),
    option("pink", "#ec4899", "#fbcfe8"),
];

const TODO_COLORS: [&str; 10] = [
    "#fee2e2", "#ffedd5", "#fef9c3", "#dcfce7", "#ccfbf1", "#dbeafe", "#e0e7ff", "#f3e8ff",
    "#fce7f3", "#ffe4e6",
];

pub fn color_option(id: &str) -> Option<&'static ColorOption> {
    COLOR_OPTIONS.iter().find(|v| v.id == id)
}

/// Extracts `red` out of class strings like `text-red-600` or `bg-red-50 border-...`.
/// A bare color id is accepted as well.
pub fn color_id(class: &str) -> Option<&str> {
    if color_option(class.trim()).is_some() {
        return Some(class.trim());
    }
    class.split_whitespace().find_map(|token| {
        let rest = token
            .strip_prefix("text-")
            .or_else(|| token.strip_prefix("bg-"))?;
        let (id, _) = rest.split_once('-')?;
        (!id.is_empty() && id.bytes().all(|b| b.is_ascii_lowercase())).then_some(id)
    })
}

/// Hex color of a theme class. Unknown classes fall back to light stone.
pub fn class_hex(class: &str, light: bool) -> &'static str {
    match color_id(class).and_then(color_option) {
        Some(option) if light => option.light_hex,
        Some(option) => option.hex,
        None => FALLBACK_HEX,
    }
}

/// Color assigned to the n-th todo category.
pub fn todo_category_color(index: usize) -> &'static str {
    TODO_COLORS[index % TODO_COLORS.len()]
}

/// Fill intensity of a heatmap cell for the amount of time logged.
pub fn heat_opacity(duration: Duration) -> f64 {
    let hours = seconds_f64(duration) / 3600.;
    if hours < 0.5 {
        0.15
    } else if hours < 1. {
        0.3
    } else if hours < 2. {
        0.5
    } else if hours < 4. {
        0.7
    } else {
        1.
    }
}

/// Black or white text, whichever reads better on `hex` (YIQ brightness).
pub fn contrast_text_color(hex: &str) -> &'static str {
    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|v| u8::from_str_radix(v, 16).ok())
            .unwrap_or(0) as u32
    };
    let yiq = (channel(0..2) * 299 + channel(2..4) * 587 + channel(4..6) * 114) / 1000;
    if yiq >= 128 { "#000000" } else { "#ffffff" }
}
