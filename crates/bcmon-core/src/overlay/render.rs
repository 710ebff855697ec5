//! Overlay content and its ASS serialization
//!
//! The overlay is built as a structured [`OverlayFrame`] and only turned into
//! ASS event text (the format mpv's `osd-overlay` command takes) in
//! [`OverlayFrame::to_ass`].

use super::layout::{Alignment, OverlayLayout, Rect, TextSlot};
use crate::config::OverlayStyle;
use std::fmt::Write;

/// Everything needed to draw one overlay update
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFrame {
    pub layout: OverlayLayout,
    /// Main timecode text (may be the sentinel)
    pub timecode: String,
    /// Drop-frame indicator suffix, e.g. `DF`
    pub indicator: Option<String>,
    /// Filled fraction of the progress bar (0.0-1.0)
    pub progress: Option<f64>,
    /// Info block lines, one per slot in `layout.info_lines`
    pub info: Vec<String>,
}

impl OverlayFrame {
    /// Serialize to ASS events, one event per line
    pub fn to_ass(&self, style: &OverlayStyle) -> String {
        let mut out = String::new();
        let alpha = ass_alpha(style.opacity);

        if let Some(slot) = &self.layout.timecode {
            out.push_str(&text_event(slot, style, &style.color, &alpha));
            out.push_str(&ass_escape(&self.timecode));
            if let (Some(indicator), Some(size)) = (&self.indicator, self.layout.indicator_size) {
                let _ = write!(
                    out,
                    "{{\\fs{:.0}\\1c{}}} {}",
                    size,
                    ass_color(&style.indicator_color),
                    ass_escape(indicator)
                );
            }
            out.push('\n');
        }

        if let Some(bar) = &self.layout.progress_bar {
            let track_alpha = ass_alpha(style.opacity * style.progress_track_opacity);
            out.push_str(&rect_event(bar, &style.progress_color, &track_alpha));
            out.push('\n');

            let filled = self.progress.unwrap_or(0.0).clamp(0.0, 1.0);
            if filled > 0.0 {
                let fill = Rect {
                    width: bar.width * filled,
                    ..*bar
                };
                out.push_str(&rect_event(&fill, &style.progress_color, &alpha));
                out.push('\n');
            }
        }

        for (slot, line) in self.layout.info_lines.iter().zip(&self.info) {
            out.push_str(&text_event(slot, style, &style.color, &alpha));
            out.push_str(&ass_escape(line));
            out.push('\n');
        }

        out
    }
}

fn text_event(slot: &TextSlot, style: &OverlayStyle, color: &str, alpha: &str) -> String {
    let an = match slot.alignment {
        Alignment::BottomCenter => 2,
        Alignment::TopLeft => 7,
    };
    format!(
        "{{\\an{}\\pos({:.0},{:.0})\\fn{}\\fs{:.0}\\bord{}\\shad0\\1c{}\\3c{}\\alpha{}}}",
        an,
        slot.anchor.x,
        slot.anchor.y,
        style.font,
        slot.size,
        style.border_size,
        ass_color(color),
        ass_color(&style.border_color),
        alpha
    )
}

fn rect_event(rect: &Rect, color: &str, alpha: &str) -> String {
    format!(
        "{{\\an7\\pos({:.0},{:.0})\\bord0\\shad0\\1c{}\\alpha{}\\p1}}m 0 0 l {w:.0} 0 {w:.0} {h:.0} 0 {h:.0}{{\\p0}}",
        rect.x,
        rect.y,
        ass_color(color),
        alpha,
        w = rect.width,
        h = rect.height
    )
}

/// Convert `RRGGBB` to ASS `&HBBGGRR&`; invalid input renders white
pub fn ass_color(rgb: &str) -> String {
    let hex = rgb.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return "&HFFFFFF&".to_string();
    }
    let hex = hex.to_ascii_uppercase();
    format!("&H{}{}{}&", &hex[4..6], &hex[2..4], &hex[0..2])
}

/// Convert opacity (1.0 = opaque) to ASS alpha `&HXX&` (00 = opaque)
pub fn ass_alpha(opacity: f64) -> String {
    let transparency = (1.0 - opacity.clamp(0.0, 1.0)) * 255.0;
    format!("&H{:02X}&", transparency.round() as u8)
}

/// Escape text so it cannot open override blocks
pub fn ass_escape(text: &str) -> String {
    text.replace('\\', "\\\u{200B}")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
}
