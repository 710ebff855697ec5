//! bcmon Core - Timecode overlay and audio routing engines
//!
//! This library holds the algorithmic side of bcmon, a broadcast monitor that
//! runs next to a media player (mpv). It converts the playback position into
//! SMPTE drop-frame/non-drop-frame timecode for an on-screen overlay, and
//! builds pan-matrix and loudness-normalisation filter chains for
//! multi-channel audio.
//!
//! The player itself is abstracted behind the [`host::Host`] trait; all
//! engine state lives in a [`session::Session`].

pub mod audio;
pub mod command;
pub mod config;
pub mod host;
pub mod overlay;
pub mod session;
pub mod testing;
pub mod timecode;

pub use audio::router::AudioRouter;
pub use command::ControlCommand;
pub use config::AppConfig;
pub use host::{Host, HostEvent};
pub use overlay::TimecodeOverlay;
pub use session::Session;
pub use timecode::{FramerateProfile, TimecodeValue};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
