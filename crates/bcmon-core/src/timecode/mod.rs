//! SMPTE timecode engine
//!
//! This module converts a playback position into broadcast timecode:
//! - Frame rate classification, NTSC-derived rates become drop-frame ([`framerate`])
//! - SMPTE 12M drop-frame frame-number compensation ([`drop_frame`])
//! - `HH:MM:SS:FF` / `HH:MM:SS;FF` formatting and parsing ([`format`])

pub mod drop_frame;
pub mod format;
pub mod framerate;

pub use format::{format_timecode, TimecodeValue, SENTINEL};
pub use framerate::FramerateProfile;
