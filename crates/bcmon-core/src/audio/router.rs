//! Audio routing state machine
//!
//! [`AudioRouter`] owns the routing mode and the loudness cycle. Every
//! transition rebuilds the whole filter chain from both and replaces the
//! host's chain with clear-then-append, so the host never sees a partially
//! updated graph.
//!
//! ```text
//! command ─> plan_routing(mode, channels) ─┐
//!            build_loudness_stage(current) ─┴─> clear + append ─> message
//!                    │ error
//!                    └─> message + warn, previous chain stays active
//! ```

use super::chain::{FilterChain, FilterStage};
use super::loudness::{build_loudness_stage, LoudnessCycle, LoudnessProfile};
use super::routing::{plan_routing, RoutingError, RoutingMode};
use super::track::AudioTrackDescriptor;
use crate::host::Host;
use std::time::Duration;

/// Routing and loudness state machine
#[derive(Debug)]
pub struct AudioRouter {
    mode: RoutingMode,
    loudness: LoudnessCycle,
    /// Chain most recently submitted to the host
    chain: FilterChain,
    /// Channel count the current chain was built for
    channels: u32,
    /// A file is loaded
    loaded: bool,
    message_duration: Duration,
}

impl AudioRouter {
    pub fn new(profiles: Vec<LoudnessProfile>, message_duration: Duration) -> Self {
        Self {
            mode: RoutingMode::Default,
            loudness: LoudnessCycle::new(profiles),
            chain: FilterChain::new(),
            channels: 0,
            loaded: false,
            message_duration,
        }
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    /// Active loudness profile, None when off
    pub fn loudness(&self) -> Option<&LoudnessProfile> {
        self.loudness.current()
    }

    /// Chain most recently submitted to the host
    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// `Routing: ... | Loudness: ...`
    pub fn describe(&self) -> String {
        let loudness = self
            .loudness
            .current()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "off".to_string());
        format!("Routing: {} | Loudness: {}", self.mode, loudness)
    }

    /// New file: back to Default routing with loudness off
    ///
    /// Applies the Default chain without a confirmation message. If the
    /// channel count is not known yet the chain is simply cleared.
    pub fn on_file_loaded(&mut self, host: &mut dyn Host) {
        self.mode = RoutingMode::Default;
        self.loudness.reset();
        self.loaded = true;

        let track = AudioTrackDescriptor::query(host);
        self.channels = track.channel_count;
        match self.build_chain(RoutingMode::Default, track.channel_count) {
            Ok(chain) => self.submit(host, chain),
            Err(_) => self.submit(host, FilterChain::new()),
        }
        tracing::debug!(channels = track.channel_count, "audio_router_reset");
    }

    /// Channel information changed: rebuild the current chain silently
    ///
    /// mpv publishes `audio-params` once the decoder runs, which is usually
    /// after `file-loaded`. A mode that no longer fits the new channel count
    /// falls back to Default.
    pub fn on_audio_params(&mut self, host: &mut dyn Host) {
        if !self.loaded {
            return;
        }
        let track = AudioTrackDescriptor::query(host);
        if track.channel_count == 0 || track.channel_count == self.channels {
            return;
        }
        self.channels = track.channel_count;

        let chain = match self.build_chain(self.mode, self.channels) {
            Ok(chain) => chain,
            Err(e) => {
                tracing::warn!(error = %e, routing = %self.mode, "audio_routing_reset_for_new_layout");
                self.mode = RoutingMode::Default;
                self.build_chain(RoutingMode::Default, self.channels)
                    .unwrap_or_default()
            }
        };
        if chain != self.chain {
            self.submit(host, chain);
        }
        tracing::debug!(channels = self.channels, routing = %self.mode, "audio_params_changed");
    }

    /// File unloaded: drop the chain
    pub fn on_end_file(&mut self, host: &mut dyn Host) {
        self.loaded = false;
        self.channels = 0;
        if !self.chain.is_empty() {
            self.submit(host, FilterChain::new());
        }
    }

    /// `reset`: Default routing, loudness profile kept
    pub fn reset(&mut self, host: &mut dyn Host) -> Result<(), RoutingError> {
        self.transition(host, RoutingMode::Default)
    }

    /// `pair:<n>`
    pub fn pair(&mut self, host: &mut dyn Host, pair: u32) -> Result<(), RoutingError> {
        self.transition(host, RoutingMode::StereoPair(pair))
    }

    /// `solo:<n>`
    pub fn solo(&mut self, host: &mut dyn Host, channel: u32) -> Result<(), RoutingError> {
        self.transition(host, RoutingMode::Solo(channel))
    }

    /// Even/odd power-preserving downmix of all channels
    ///
    /// No inbound command selects this mode directly. Default uses the same
    /// matrix for more than two channels; this is for callers that drive the
    /// router without going through [`crate::command::ControlCommand`].
    pub fn downmix(&mut self, host: &mut dyn Host) -> Result<(), RoutingError> {
        self.transition(host, RoutingMode::AllChannelDownmix)
    }

    /// `toggleLoudness`: advance the loudness cycle and resubmit the chain
    /// with the current routing
    pub fn toggle_loudness(&mut self, host: &mut dyn Host) -> Result<(), RoutingError> {
        self.loudness.advance();
        let result = self.transition(host, self.mode);
        if result.is_err() {
            self.loudness.retreat();
        }
        result
    }

    /// `showAudioInfo`: track properties and current state as a message
    pub fn show_info(&self, host: &mut dyn Host) {
        let track = AudioTrackDescriptor::query(host);
        let text = format!("{}\n{}", track.summary(), self.describe());
        host.show_message(&text, self.message_duration);
    }

    fn transition(&mut self, host: &mut dyn Host, mode: RoutingMode) -> Result<(), RoutingError> {
        let track = AudioTrackDescriptor::query(host);
        match self.build_chain(mode, track.channel_count) {
            Ok(chain) => {
                self.mode = mode;
                self.channels = track.channel_count;
                self.submit(host, chain);
                let text = self.describe();
                tracing::info!(
                    routing = %self.mode,
                    loudness = self.loudness.name(),
                    channels = track.channel_count,
                    "audio_routing_applied"
                );
                host.show_message(&text, self.message_duration);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, requested = %mode, "audio_routing_rejected");
                host.show_message(&format!("Audio: {}", e), self.message_duration);
                Err(e)
            }
        }
    }

    fn build_chain(&self, mode: RoutingMode, channels: u32) -> Result<FilterChain, RoutingError> {
        let mut chain = FilterChain::new();
        if let Some(matrix) = plan_routing(mode, channels)? {
            chain.push(FilterStage::Pan(matrix));
        }
        if let Some(stage) = build_loudness_stage(self.loudness.current()) {
            chain.push(FilterStage::Loudness(stage));
        }
        Ok(chain)
    }

    fn submit(&mut self, host: &mut dyn Host, chain: FilterChain) {
        host.clear_audio_filters();
        for stage in &chain {
            host.append_audio_filter(stage);
        }
        self.chain = chain;
    }
}
