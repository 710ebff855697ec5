//! Session context
//!
//! [`Session`] owns both engines and is the only entry point the host
//! adapter uses: host events, fired timers and inbound commands all go
//! through it.

use crate::audio::router::AudioRouter;
use crate::command::ControlCommand;
use crate::config::AppConfig;
use crate::host::{Host, HostEvent, TimerId};
use crate::overlay::TimecodeOverlay;

/// Per-player state of both engines
#[derive(Debug)]
pub struct Session {
    pub overlay: TimecodeOverlay,
    pub audio: AudioRouter,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            overlay: TimecodeOverlay::new(config),
            audio: AudioRouter::new(config.loudness_profiles.clone(), config.message_duration()),
        }
    }

    /// Route a host notification to the engines
    pub fn handle_event(&mut self, host: &mut dyn Host, event: HostEvent) {
        tracing::trace!(?event, "host_event");
        match event {
            HostEvent::FileLoaded => {
                tracing::info!(fps = ?host.framerate(), "file_loaded");
                self.audio.on_file_loaded(host);
                self.overlay.start(host);
            }
            HostEvent::EndFile => {
                tracing::info!("end_file");
                self.overlay.stop(host);
                self.audio.on_end_file(host);
            }
            HostEvent::PositionChanged => self.overlay.on_position(host),
            HostEvent::PauseChanged(paused) => self.overlay.on_pause(host, paused),
            HostEvent::ViewportChanged(viewport) => self.overlay.on_viewport(host, viewport),
            HostEvent::MetadataChanged => self.overlay.on_metadata(host),
            HostEvent::AudioParamsChanged => self.audio.on_audio_params(host),
        }
    }

    /// A timer scheduled through [`Host::add_timeout`] fired
    pub fn on_timer(&mut self, host: &mut dyn Host, id: TimerId) {
        if !self.overlay.on_timer(host, id) {
            tracing::trace!(timer = id.0, "unknown_timer_ignored");
        }
    }

    /// Parse and run an inbound command string
    ///
    /// Malformed or unknown commands are dropped without any user-visible
    /// feedback. Returns the command that ran, if any.
    pub fn dispatch(&mut self, host: &mut dyn Host, input: &str) -> Option<ControlCommand> {
        match ControlCommand::parse(input) {
            Ok(command) => {
                self.execute(host, command);
                Some(command)
            }
            Err(e) => {
                tracing::debug!(input, error = %e, "command_ignored");
                None
            }
        }
    }

    /// Run a parsed command
    ///
    /// Routing failures are already reported to the user by the router.
    pub fn execute(&mut self, host: &mut dyn Host, command: ControlCommand) {
        tracing::debug!(%command, "command");
        let result = match command {
            ControlCommand::Reset => self.audio.reset(host),
            ControlCommand::Pair(n) => self.audio.pair(host, n),
            ControlCommand::Solo(n) => self.audio.solo(host, n),
            ControlCommand::ToggleLoudness => self.audio.toggle_loudness(host),
            ControlCommand::ShowAudioInfo => {
                self.audio.show_info(host);
                Ok(())
            }
            ControlCommand::CycleDisplayMode => {
                self.overlay.cycle_mode(host);
                Ok(())
            }
            ControlCommand::ToggleCountdown => {
                self.overlay.toggle_countdown(host);
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::trace!(%command, error = %e, "command_failed");
        }
    }
}
