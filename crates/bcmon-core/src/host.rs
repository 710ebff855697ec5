//! Media player host abstraction
//!
//! Everything bcmon reads from or sends to the player goes through [`Host`].
//! The engines never talk to the player directly, which keeps them
//! synchronous and lets tests drive them with [`crate::testing::RecordingHost`].

use crate::audio::chain::FilterStage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Playback clock as reported by the host
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackClock {
    /// Current position in seconds (None before the first frame)
    pub time_position: Option<f64>,
    /// Total duration in seconds (None for live or unknown streams)
    pub duration: Option<f64>,
    /// Whether playback is paused
    pub paused: bool,
}

impl PlaybackClock {
    /// Remaining time in seconds, if both position and duration are known
    pub fn remaining(&self) -> Option<f64> {
        match (self.time_position, self.duration) {
            (Some(pos), Some(dur)) => Some((dur - pos).max(0.0)),
            _ => None,
        }
    }
}

/// OSD viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Safe-area margins reported by the host, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeMargins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Entry of the host's track list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Track id
    pub id: u32,
    /// Track type as reported by the host ("audio", "video", "sub")
    pub kind: String,
    /// Whether the track is currently selected
    pub selected: bool,
}

impl TrackInfo {
    pub fn is_audio(&self) -> bool {
        self.kind == "audio"
    }
}

/// Raw channel-count property value
///
/// Depending on the demuxer the primary property is either a number or a
/// channel layout name such as `5.1(side)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCount {
    Count(u32),
    Layout(String),
}

/// Handle for a deferred callback scheduled with [`Host::add_timeout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Notifications delivered from the host to a [`crate::Session`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A new file finished loading
    FileLoaded,
    /// Playback of the current file ended or the file was unloaded
    EndFile,
    /// Playback position changed
    PositionChanged,
    /// Pause state changed
    PauseChanged(bool),
    /// OSD dimensions changed
    ViewportChanged(Viewport),
    /// Duration or frame rate metadata changed
    MetadataChanged,
    /// Audio channel count or layout changed
    AudioParamsChanged,
}

/// Media player host
///
/// Read accessors return the most recent value the host knows about. Commands
/// are fire-and-forget; the host reports failures through its own logging.
pub trait Host {
    /// Current playback clock
    fn clock(&self) -> PlaybackClock;

    /// Frame rate reported by the container
    fn container_fps(&self) -> Option<f64>;

    /// Frame rate estimated from the decoded video stream
    fn stream_fps(&self) -> Option<f64>;

    /// OSD size, None until the first dimension notification
    fn viewport(&self) -> Option<Viewport>;

    /// Safe-area margins inside the viewport
    fn safe_margins(&self) -> SafeMargins;

    /// Playback position in percent (0-100)
    fn percent_position(&self) -> Option<f64>;

    /// All tracks of the current file
    fn track_list(&self) -> Vec<TrackInfo>;

    /// Primary channel-count property of the active audio track
    fn channel_count(&self) -> Option<ChannelCount>;

    /// Secondary, always-numeric channel-count property
    fn fallback_channel_count(&self) -> Option<u32>;

    /// Codec name of the active audio track
    fn audio_codec(&self) -> Option<String>;

    /// Sample rate of the active audio track in Hz
    fn sample_rate(&self) -> Option<u32>;

    /// Replace the overlay with `content` rendered at `viewport` resolution
    fn set_overlay(&mut self, viewport: Viewport, content: &str);

    /// Remove the overlay
    fn clear_overlay(&mut self);

    /// Show a transient OSD message
    fn show_message(&mut self, text: &str, duration: Duration);

    /// Remove all audio filters owned by bcmon
    fn clear_audio_filters(&mut self);

    /// Append one filter stage to the audio filter graph
    fn append_audio_filter(&mut self, stage: &FilterStage);

    /// Schedule a deferred callback; the host later calls
    /// [`crate::Session::on_timer`] with the returned id
    fn add_timeout(&mut self, delay: Duration) -> TimerId;

    /// Cancel a deferred callback; unknown ids are ignored
    fn kill_timeout(&mut self, id: TimerId);

    /// Start or stop delivering [`HostEvent::PositionChanged`]
    fn observe_position(&mut self, enabled: bool);

    /// Frame rate with the container -> stream fallback chain
    ///
    /// Returns None when neither property is usable; the framerate classifier
    /// then substitutes its own default.
    fn framerate(&self) -> Option<f64> {
        self.container_fps()
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .or_else(|| self.stream_fps().filter(|fps| fps.is_finite() && *fps > 0.0))
    }
}
