//! Responsive overlay layout
//!
//! [`compute_layout`] is a pure function of viewport size, safe-area margins,
//! display mode and geometry settings. Every size is derived from the
//! viewport, so the layout follows window resizes and fullscreen switches.

use super::DisplayMode;
use crate::config::OverlayGeometry;
use crate::host::{SafeMargins, Viewport};

/// Placeholder viewport used until the host reports real dimensions
pub const PLACEHOLDER_VIEWPORT: Viewport = Viewport {
    width: 1280,
    height: 720,
};

/// Point in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Where a text element hangs off its anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Anchor is the bottom-centre of the text
    BottomCenter,
    /// Anchor is the top-left of the text
    TopLeft,
}

/// Positioned text element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSlot {
    pub anchor: Point,
    pub alignment: Alignment,
    /// Font size in pixels
    pub size: f64,
}

/// Computed overlay layout
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    /// Viewport the layout was computed for
    pub viewport: Viewport,
    /// Area inside all margins
    pub safe_area: Rect,
    /// Main timecode, bottom-centre of the safe area
    pub timecode: Option<TextSlot>,
    /// Font size of the drop-frame indicator suffix (rendered after the timecode)
    pub indicator_size: Option<f64>,
    /// Progress bar track, centred above the timecode
    pub progress_bar: Option<Rect>,
    /// Info block lines, top-left of the safe area
    pub info_lines: Vec<TextSlot>,
}

impl OverlayLayout {
    /// Layout with nothing to draw
    pub fn empty(viewport: Viewport, safe_area: Rect) -> Self {
        Self {
            viewport,
            safe_area,
            timecode: None,
            indicator_size: None,
            progress_bar: None,
            info_lines: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.timecode.is_none() && self.progress_bar.is_none() && self.info_lines.is_empty()
    }
}

/// Safe area: viewport minus host margins minus the configured relative inset
pub fn safe_area(viewport: Viewport, margins: &SafeMargins, geometry: &OverlayGeometry) -> Rect {
    let width = viewport.width as f64;
    let height = viewport.height as f64;
    let inset_x = width * geometry.safe_margin;
    let inset_y = height * geometry.safe_margin;

    let left = margins.left.max(0.0) + inset_x;
    let top = margins.top.max(0.0) + inset_y;
    let right = margins.right.max(0.0) + inset_x;
    let bottom = margins.bottom.max(0.0) + inset_y;

    Rect {
        x: left,
        y: top,
        width: (width - left - right).max(0.0),
        height: (height - top - bottom).max(0.0),
    }
}

/// Main timecode size: `clamp(height * font_scale, font_min, font_max)`
pub fn timecode_size(viewport: Viewport, geometry: &OverlayGeometry) -> f64 {
    clamp_size(
        viewport.height as f64 * geometry.font_scale,
        geometry.font_min,
        geometry.font_max,
    )
}

/// Compute the overlay layout
///
/// `info_line_count` is the number of enabled info-block metrics; it only
/// matters in [`DisplayMode::Full`].
pub fn compute_layout(
    viewport: Viewport,
    margins: &SafeMargins,
    mode: DisplayMode,
    geometry: &OverlayGeometry,
    info_line_count: usize,
) -> OverlayLayout {
    let safe = safe_area(viewport, margins, geometry);
    let mut layout = OverlayLayout::empty(viewport, safe);

    if mode == DisplayMode::Off {
        return layout;
    }

    let mut size = timecode_size(viewport, geometry);
    if mode == DisplayMode::Minimal {
        size = (size * geometry.minimal_scale).max(1.0);
    }

    let anchor = Point {
        x: safe.center_x(),
        y: safe.bottom(),
    };
    layout.timecode = Some(TextSlot {
        anchor,
        alignment: Alignment::BottomCenter,
        size,
    });

    if mode == DisplayMode::Minimal {
        return layout;
    }

    layout.indicator_size = Some((size * geometry.indicator_scale).max(1.0));

    if mode == DisplayMode::TimecodeOnly {
        return layout;
    }

    // Full: progress bar above the timecode, info block top-left
    let bar_width = safe.width * geometry.progress_width;
    let bar_height = (size * geometry.progress_height).max(1.0);
    let gap = size * geometry.progress_gap;
    layout.progress_bar = Some(Rect {
        x: safe.center_x() - bar_width / 2.0,
        y: anchor.y - size - gap - bar_height,
        width: bar_width,
        height: bar_height,
    });

    let line_size = clamp_size(
        viewport.height as f64 * geometry.info_scale,
        geometry.info_min,
        geometry.info_max,
    );
    let step = line_size * geometry.line_spacing;
    layout.info_lines = (0..info_line_count)
        .map(|i| TextSlot {
            anchor: Point {
                x: safe.x,
                y: safe.y + step * i as f64,
            },
            alignment: Alignment::TopLeft,
            size: line_size,
        })
        .collect();

    layout
}

fn clamp_size(value: f64, min: f64, max: f64) -> f64 {
    // min wins over max for misconfigured bounds
    value.min(max).max(min)
}
