//! bcmon - Broadcast monitor for mpv
//!
//! This library re-exports the timecode overlay and audio routing engines
//! from `bcmon-core` and the mpv IPC adapter from `bcmon-ipc`.

pub use bcmon_core::{audio, command, config, host, overlay, session, testing, timecode};

pub use bcmon_core::{
    AppConfig, AudioRouter, ControlCommand, FramerateProfile, Host, HostEvent, Session,
    TimecodeOverlay, TimecodeValue, VERSION,
};

pub use bcmon_ipc as ipc;
