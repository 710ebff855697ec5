//! Frame rate classification
//!
//! Players report frame rates as floats that are often only an approximation
//! of the real rational rate (`29.97` for `30000/1001`). Classification maps
//! such a value onto a [`FramerateProfile`] that decides between drop-frame
//! and non-drop-frame timecode.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Frame rate substituted when the host reports nothing usable
pub const FALLBACK_FPS: u32 = 25;

/// Highest frame rate accepted as plausible metadata
const MAX_PLAUSIBLE_FPS: f64 = 1000.0;

/// Relative tolerance for matching NTSC-derived rates
///
/// Scales the absolute epsilon with the rate: ~0.0096 at 23.976,
/// ~0.048 at 119.88. Both are well below the 0.1% gap to the integer rate.
const NTSC_RELATIVE_TOLERANCE: f64 = 4e-4;

/// NTSC-derived rates: integer base and the decimal approximation found in metadata
const NTSC_RATES: [(u32, f64); 5] = [
    (24, 23.976),
    (30, 29.97),
    (48, 47.952),
    (60, 59.94),
    (120, 119.88),
];

/// Reasons a frame rate cannot be classified
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FramerateError {
    #[error("No frame rate available")]
    Missing,

    #[error("Implausible frame rate: {0}")]
    Implausible(f64),
}

/// Classified frame rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramerateProfile {
    /// Frame rate as reported (or the fallback rate)
    pub nominal_fps: f64,
    /// Integer frame base used for timecode arithmetic
    pub rounded_fps: u32,
    /// Whether drop-frame numbering applies
    pub drop_frame: bool,
    /// Separator between seconds and frames (`;` for DF, `:` for NDF)
    pub separator: char,
}

impl FramerateProfile {
    /// Classify a frame rate, substituting the 25 fps fallback for unusable input
    ///
    /// The fallback is reported with a warning; use [`Self::try_classify`] to
    /// handle it yourself.
    pub fn classify(fps: Option<f64>) -> Self {
        Self::try_classify(fps).unwrap_or_else(|e| {
            tracing::warn!(error = %e, fallback_fps = FALLBACK_FPS, "framerate_fallback");
            Self::fallback()
        })
    }

    /// Classify a frame rate
    ///
    /// # Example
    /// ```
    /// use bcmon_core::timecode::FramerateProfile;
    ///
    /// let profile = FramerateProfile::try_classify(Some(29.97)).unwrap();
    /// assert!(profile.drop_frame);
    /// assert_eq!(profile.rounded_fps, 30);
    /// assert_eq!(profile.separator, ';');
    /// ```
    pub fn try_classify(fps: Option<f64>) -> Result<Self, FramerateError> {
        let fps = fps.ok_or(FramerateError::Missing)?;
        if !fps.is_finite() || fps < 0.5 || fps > MAX_PLAUSIBLE_FPS {
            return Err(FramerateError::Implausible(fps));
        }

        for (base, approx) in NTSC_RATES {
            let exact = base as f64 * 1000.0 / 1001.0;
            let tolerance = exact * NTSC_RELATIVE_TOLERANCE;
            if (fps - exact).abs() <= tolerance || (fps - approx).abs() <= tolerance {
                return Ok(Self {
                    nominal_fps: fps,
                    rounded_fps: base,
                    drop_frame: true,
                    separator: ';',
                });
            }
        }

        Ok(Self {
            nominal_fps: fps,
            rounded_fps: fps.round() as u32,
            drop_frame: false,
            separator: ':',
        })
    }

    /// 25 fps non-drop-frame profile used when metadata is unusable
    pub fn fallback() -> Self {
        Self {
            nominal_fps: FALLBACK_FPS as f64,
            rounded_fps: FALLBACK_FPS,
            drop_frame: false,
            separator: ':',
        }
    }

    /// Real frames per second used to count frames from elapsed time
    ///
    /// Drop-frame profiles use the exact `base * 1000 / 1001` rate rather
    /// than the (possibly truncated) reported value.
    pub fn frame_rate(&self) -> f64 {
        if self.drop_frame {
            self.rounded_fps as f64 * 1000.0 / 1001.0
        } else {
            self.nominal_fps
        }
    }

    /// Short label for the info block, e.g. `29.97 DF` or `25 NDF`
    pub fn label(&self) -> String {
        let marker = if self.drop_frame { "DF" } else { "NDF" };
        format!("{} {}", format_rate(self.frame_rate()), marker)
    }
}

impl fmt::Display for FramerateProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", format_rate(self.frame_rate()))
    }
}

/// Format a rate with up to three decimals and no trailing zeros
fn format_rate(rate: f64) -> String {
    let text = format!("{:.3}", rate);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
