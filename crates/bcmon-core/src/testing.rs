//! In-memory host
//!
//! [`RecordingHost`] answers property reads from public fields and records
//! every command it receives. Timers are queued and only fire when the
//! caller drains them, which makes the deferred-render behaviour observable.

use crate::audio::chain::{FilterChain, FilterStage};
use crate::host::{ChannelCount, Host, PlaybackClock, SafeMargins, TimerId, TrackInfo, Viewport};
use crate::overlay::TimecodeOverlay;
use crate::session::Session;
use std::time::Duration;

/// Upper bound on timer rounds drained by the `fire_*` helpers
const MAX_TIMER_ROUNDS: usize = 64;

/// Command received by a [`RecordingHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    SetOverlay { viewport: Viewport, content: String },
    ClearOverlay,
    ShowMessage { text: String, duration: Duration },
    ClearAudioFilters,
    AppendAudioFilter(FilterStage),
    ObservePosition(bool),
    AddTimeout { id: TimerId, delay: Duration },
    KillTimeout(TimerId),
}

/// Host double with settable properties and a command log
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub clock: PlaybackClock,
    pub container_fps: Option<f64>,
    pub stream_fps: Option<f64>,
    pub viewport: Option<Viewport>,
    pub margins: SafeMargins,
    pub percent_position: Option<f64>,
    pub tracks: Vec<TrackInfo>,
    pub channel_count: Option<ChannelCount>,
    pub fallback_channel_count: Option<u32>,
    pub audio_codec: Option<String>,
    pub sample_rate: Option<u32>,

    commands: Vec<HostCommand>,
    timers: Vec<TimerId>,
    next_timer: u64,
    overlay: Option<(Viewport, String)>,
    overlay_renders: usize,
    filters: FilterChain,
    position_observed: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands received since creation or the last [`Self::take_commands`]
    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Timers scheduled and neither fired nor cancelled, oldest first
    pub fn pending_timers(&self) -> Vec<TimerId> {
        self.timers.clone()
    }

    /// Remove and return all pending timers
    pub fn take_timers(&mut self) -> Vec<TimerId> {
        std::mem::take(&mut self.timers)
    }

    /// Texts of the transient messages in the command log
    pub fn messages(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                HostCommand::ShowMessage { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Total number of overlay submissions
    pub fn overlay_renders(&self) -> usize {
        self.overlay_renders
    }

    /// Overlay currently shown, None after a clear
    pub fn last_overlay(&self) -> Option<(Viewport, &str)> {
        self.overlay
            .as_ref()
            .map(|(viewport, content)| (*viewport, content.as_str()))
    }

    /// Audio filter chain currently installed
    pub fn filter_chain(&self) -> FilterChain {
        self.filters.clone()
    }

    pub fn position_observed(&self) -> bool {
        self.position_observed
    }
}

impl Host for RecordingHost {
    fn clock(&self) -> PlaybackClock {
        self.clock
    }

    fn container_fps(&self) -> Option<f64> {
        self.container_fps
    }

    fn stream_fps(&self) -> Option<f64> {
        self.stream_fps
    }

    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn safe_margins(&self) -> SafeMargins {
        self.margins
    }

    fn percent_position(&self) -> Option<f64> {
        self.percent_position
    }

    fn track_list(&self) -> Vec<TrackInfo> {
        self.tracks.clone()
    }

    fn channel_count(&self) -> Option<ChannelCount> {
        self.channel_count.clone()
    }

    fn fallback_channel_count(&self) -> Option<u32> {
        self.fallback_channel_count
    }

    fn audio_codec(&self) -> Option<String> {
        self.audio_codec.clone()
    }

    fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    fn set_overlay(&mut self, viewport: Viewport, content: &str) {
        self.overlay = Some((viewport, content.to_string()));
        self.overlay_renders += 1;
        self.commands.push(HostCommand::SetOverlay {
            viewport,
            content: content.to_string(),
        });
    }

    fn clear_overlay(&mut self) {
        self.overlay = None;
        self.commands.push(HostCommand::ClearOverlay);
    }

    fn show_message(&mut self, text: &str, duration: Duration) {
        self.commands.push(HostCommand::ShowMessage {
            text: text.to_string(),
            duration,
        });
    }

    fn clear_audio_filters(&mut self) {
        self.filters.clear();
        self.commands.push(HostCommand::ClearAudioFilters);
    }

    fn append_audio_filter(&mut self, stage: &FilterStage) {
        self.filters.push(stage.clone());
        self.commands.push(HostCommand::AppendAudioFilter(stage.clone()));
    }

    fn add_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.timers.push(id);
        self.commands.push(HostCommand::AddTimeout { id, delay });
        id
    }

    fn kill_timeout(&mut self, id: TimerId) {
        self.timers.retain(|t| *t != id);
        self.commands.push(HostCommand::KillTimeout(id));
    }

    fn observe_position(&mut self, enabled: bool) {
        self.position_observed = enabled;
        self.commands.push(HostCommand::ObservePosition(enabled));
    }
}

/// Fire pending timers into `session` until none are left
///
/// Returns the number of timers fired.
pub fn fire_timers(host: &mut RecordingHost, session: &mut Session) -> usize {
    drain_timers(host, |host, id| {
        session.on_timer(host, id);
    })
}

/// Fire pending timers into a bare overlay engine until none are left
pub fn fire_overlay_timers(host: &mut RecordingHost, overlay: &mut TimecodeOverlay) -> usize {
    drain_timers(host, |host, id| {
        overlay.on_timer(host, id);
    })
}

fn drain_timers(
    host: &mut RecordingHost,
    mut fire: impl FnMut(&mut RecordingHost, TimerId),
) -> usize {
    let mut fired = 0;
    for _ in 0..MAX_TIMER_ROUNDS {
        let due = host.take_timers();
        if due.is_empty() {
            break;
        }
        for id in due {
            fire(host, id);
            fired += 1;
        }
    }
    fired
}
