//! Timecode values, formatting and parsing

use super::drop_frame::{adjust_frame_count, real_frame_count};
use super::framerate::FramerateProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Display used when no valid position is available
pub const SENTINEL: &str = "--:--:--:--";

/// Absorbs float error when converting seconds to a frame count
/// (60.06 s * 30000/1001 must count 1800 frames, not 1799)
const FRAME_EPSILON: f64 = 1e-6;

/// Errors from [`TimecodeValue::parse`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimecodeParseError {
    #[error("Expected HH:MM:SS:FF or HH:MM:SS;FF, got: {0}")]
    Format(String),

    #[error("Invalid {field}: {value}")]
    Field { field: &'static str, value: String },

    #[error("Minutes and seconds must be < 60: {0}")]
    OutOfRange(String),
}

/// A SMPTE timecode address
///
/// Invariant: `minutes < 60`, `seconds < 60` and `frames` below the integer
/// frame base it was built with. Hours are not wrapped at 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimecodeValue {
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u32,
    pub drop_frame: bool,
}

impl TimecodeValue {
    /// Decompose a timecode-visible frame number into an address
    ///
    /// `frame_number` must already be drop-frame adjusted when `drop_frame`
    /// is set (see [`adjust_frame_count`]).
    pub fn from_frame_number(frame_number: u64, rounded_fps: u32, drop_frame: bool) -> Self {
        let fps = rounded_fps.max(1) as u64;
        let total_seconds = frame_number / fps;

        Self {
            hours: (total_seconds / 3600) as u32,
            minutes: ((total_seconds / 60) % 60) as u8,
            seconds: (total_seconds % 60) as u8,
            frames: (frame_number % fps) as u32,
            drop_frame,
        }
    }

    /// Timecode for a real frame count under `profile`
    pub fn from_frame_count(total_frames: u64, profile: &FramerateProfile) -> Self {
        let frame_number = if profile.drop_frame {
            adjust_frame_count(total_frames, profile.rounded_fps)
        } else {
            total_frames
        };
        Self::from_frame_number(frame_number, profile.rounded_fps, profile.drop_frame)
    }

    /// Timecode for an elapsed time in seconds
    ///
    /// Returns None for negative, NaN or infinite input.
    pub fn from_seconds(seconds: f64, profile: &FramerateProfile) -> Option<Self> {
        frames_from_seconds(seconds, profile)
            .map(|frames| Self::from_frame_count(frames, profile))
    }

    /// Real frame count of this address under `profile`
    pub fn to_frame_count(&self, profile: &FramerateProfile) -> u64 {
        let fps = profile.rounded_fps as u64;
        let total_minutes = self.hours as u64 * 60 + self.minutes as u64;
        let frame_number = (total_minutes * 60 + self.seconds as u64) * fps + self.frames as u64;

        if self.drop_frame && profile.drop_frame {
            real_frame_count(frame_number, total_minutes, profile.rounded_fps)
        } else {
            frame_number
        }
    }

    /// Separator between seconds and frames
    pub fn separator(&self) -> char {
        if self.drop_frame {
            ';'
        } else {
            ':'
        }
    }

    /// Parse `HH:MM:SS:FF` (non-drop-frame) or `HH:MM:SS;FF` (drop-frame)
    ///
    /// Drop-frame is taken from the last separator. Frames are not checked
    /// against a frame base since the string carries none.
    pub fn parse(s: &str) -> Result<Self, TimecodeParseError> {
        let s = s.trim();
        let parts: Vec<&str> = s.split([':', ';']).collect();
        if parts.len() != 4 {
            return Err(TimecodeParseError::Format(s.to_string()));
        }

        let field = |name: &'static str, value: &str| {
            value.parse::<u32>().map_err(|_| TimecodeParseError::Field {
                field: name,
                value: value.to_string(),
            })
        };

        let hours = field("hours", parts[0])?;
        let minutes = field("minutes", parts[1])?;
        let seconds = field("seconds", parts[2])?;
        let frames = field("frames", parts[3])?;

        if minutes > 59 || seconds > 59 {
            return Err(TimecodeParseError::OutOfRange(s.to_string()));
        }

        let frames_separator = s.len() - parts[3].len() - 1;
        let drop_frame = s.as_bytes().get(frames_separator) == Some(&b';');

        Ok(Self {
            hours,
            minutes: minutes as u8,
            seconds: seconds as u8,
            frames,
            drop_frame,
        })
    }
}

impl fmt::Display for TimecodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours,
            self.minutes,
            self.seconds,
            self.separator(),
            self.frames
        )
    }
}

impl FromStr for TimecodeValue {
    type Err = TimecodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Number of whole frames elapsed after `seconds` under `profile`
pub fn frames_from_seconds(seconds: f64, profile: &FramerateProfile) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * profile.frame_rate() + FRAME_EPSILON).floor() as u64)
}

/// Format a playback position as timecode
///
/// Missing or negative `seconds` yields [`SENTINEL`]. Identical input always
/// produces an identical string.
///
/// # Example
/// ```
/// use bcmon_core::timecode::format_timecode;
///
/// assert_eq!(format_timecode(Some(3601.0), Some(25.0)), "01:00:01:00");
/// assert_eq!(format_timecode(None, Some(25.0)), "--:--:--:--");
/// ```
pub fn format_timecode(seconds: Option<f64>, fps: Option<f64>) -> String {
    let profile = FramerateProfile::classify(fps);
    format_with_profile(seconds, &profile)
}

/// Format a playback position with an already classified frame rate
pub fn format_with_profile(seconds: Option<f64>, profile: &FramerateProfile) -> String {
    seconds
        .and_then(|s| TimecodeValue::from_seconds(s, profile))
        .map(|tc| tc.to_string())
        .unwrap_or_else(|| SENTINEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn df30() -> FramerateProfile {
        FramerateProfile::classify(Some(29.97))
    }

    #[test]
    fn test_non_drop_frame_hour() {
        assert_eq!(format_timecode(Some(3601.0), Some(25.0)), "01:00:01:00");
    }

    #[test]
    fn test_non_drop_frame_frames() {
        // 0.5 s at 25 fps = frame 12.5 -> 12
        assert_eq!(format_timecode(Some(0.5), Some(25.0)), "00:00:00:12");
        assert_eq!(format_timecode(Some(59.96), Some(25.0)), "00:00:59:24");
    }

    #[test]
    fn test_drop_frame_boundary() {
        let profile = df30();
        let before = TimecodeValue::from_frame_count(1799, &profile);
        let after = TimecodeValue::from_frame_count(1800, &profile);
        assert_eq!(before.to_string(), "00:00:59;29");
        assert_eq!(after.to_string(), "00:01:00;02");
    }

    #[test]
    fn test_drop_frame_from_seconds() {
        // Frame 1800 at 30000/1001 starts at 60.06 s
        assert_eq!(format_timecode(Some(60.06), Some(29.97)), "00:01:00;02");
        assert_eq!(format_timecode(Some(600.0), Some(29.97)), "00:10:00;00");
    }

    #[test]
    fn test_sentinel_for_missing_or_negative() {
        assert_eq!(format_timecode(None, Some(25.0)), SENTINEL);
        assert_eq!(format_timecode(Some(-0.5), Some(25.0)), SENTINEL);
        assert_eq!(format_timecode(Some(f64::NAN), Some(25.0)), SENTINEL);
    }

    #[test]
    fn test_huge_position_does_not_overflow() {
        let tc = format_timecode(Some(1e300), Some(29.97));
        assert_ne!(tc, SENTINEL);
        assert!(tc.contains(';'));
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let first = format_timecode(Some(1234.567), Some(59.94));
        let second = format_timecode(Some(1234.567), Some(59.94));
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_rate_when_fps_missing() {
        assert_eq!(format_timecode(Some(1.0), None), "00:00:01:00");
    }

    #[test]
    fn test_hours_do_not_wrap() {
        assert_eq!(format_timecode(Some(25.0 * 3600.0), Some(25.0)), "25:00:00:00");
    }

    #[test]
    fn test_field_ranges_hold() {
        let profile = FramerateProfile::classify(Some(59.94));
        for frame in (0..500_000u64).step_by(997) {
            let tc = TimecodeValue::from_frame_count(frame, &profile);
            assert!(tc.minutes < 60);
            assert!(tc.seconds < 60);
            assert!(tc.frames < profile.rounded_fps);
        }
    }

    #[test]
    fn test_to_frame_count_round_trip() {
        let profile = df30();
        for frame in [0u64, 1799, 1800, 17982, 107_892, 200_000] {
            let tc = TimecodeValue::from_frame_count(frame, &profile);
            assert_eq!(tc.to_frame_count(&profile), frame, "{}", tc);
        }
    }

    #[test]
    fn test_parse() {
        let tc = TimecodeValue::parse("01:30:45:12").unwrap();
        assert_eq!((tc.hours, tc.minutes, tc.seconds, tc.frames), (1, 30, 45, 12));
        assert!(!tc.drop_frame);

        let tc: TimecodeValue = "00:01:00;02".parse().unwrap();
        assert!(tc.drop_frame);
        assert_eq!(tc.to_string(), "00:01:00;02");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            TimecodeValue::parse("01:02:03"),
            Err(TimecodeParseError::Format(_))
        ));
        assert!(matches!(
            TimecodeValue::parse("01:xx:03:04"),
            Err(TimecodeParseError::Field { field: "minutes", .. })
        ));
        assert!(matches!(
            TimecodeValue::parse("01:61:03:04"),
            Err(TimecodeParseError::OutOfRange(_))
        ));
    }
}
