//! Render scheduling
//!
//! Coalesces bursts of host notifications into at most one render per
//! deferred callback. The scheduler only decides *when* to render; the
//! caller ([`super::TimecodeOverlay`]) does the rendering.
//!
//! ```text
//! position ─┐
//! position ─┼─> pending = true ─> one timer ─> on_timer() ─> render once
//! viewport ─┘
//! ```

use crate::host::{Host, TimerId};
use std::time::Duration;

/// Kind of notification that may trigger a render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Position,
    Pause,
    Viewport,
    Metadata,
    DisplayMode,
}

/// Single-threaded render scheduler
#[derive(Debug)]
pub struct UpdateScheduler {
    /// Deferral applied to every scheduled render
    refresh_interval: Duration,
    /// A render was requested since the last one ran
    pending: bool,
    /// The one outstanding deferred render, if any
    scheduled: Option<TimerId>,
    /// Whether position updates are currently subscribed at the host
    position_observed: bool,
    paused: bool,
    /// False while the display mode is Off
    enabled: bool,
    /// True between file-loaded and end-of-file
    active: bool,
    /// Renders released by [`Self::on_timer`] or forced
    renders: u64,
}

impl UpdateScheduler {
    pub fn new(refresh_interval: Duration, enabled: bool) -> Self {
        Self {
            refresh_interval,
            pending: false,
            scheduled: None,
            position_observed: false,
            paused: false,
            enabled,
            active: false,
            renders: 0,
        }
    }

    /// Begin scheduling for a newly loaded file
    ///
    /// Returns true when the caller should render immediately.
    pub fn start(&mut self, host: &mut dyn Host, paused: bool) -> bool {
        self.cancel(host);
        self.active = true;
        self.paused = paused;
        if self.enabled {
            self.set_position_observed(host, true);
            self.renders += 1;
            true
        } else {
            false
        }
    }

    /// Stop scheduling: cancels the outstanding timer and unsubscribes
    pub fn stop(&mut self, host: &mut dyn Host) {
        self.cancel(host);
        self.set_position_observed(host, false);
        self.active = false;
    }

    /// Record a notification and schedule a deferred render if none is pending
    ///
    /// Position notifications are ignored while paused.
    pub fn notify(&mut self, host: &mut dyn Host, source: UpdateSource) {
        if !self.active || !self.enabled {
            return;
        }
        if source == UpdateSource::Position && (self.paused || !self.position_observed) {
            return;
        }

        self.pending = true;
        if self.scheduled.is_none() {
            let id = host.add_timeout(self.refresh_interval);
            tracing::trace!(timer = id.0, ?source, "render_scheduled");
            self.scheduled = Some(id);
        }
    }

    /// Handle a fired timer
    ///
    /// Returns true when the caller should render now. Timers that are not
    /// the current one (cancelled or superseded) are ignored.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.scheduled != Some(id) {
            tracing::trace!(timer = id.0, "stale_timer_ignored");
            return false;
        }
        self.scheduled = None;
        let due = std::mem::take(&mut self.pending) && self.active && self.enabled;
        if due {
            self.renders += 1;
        }
        due
    }

    /// Update the pause state
    ///
    /// Pausing schedules one more render so the overlay shows the frame
    /// playback stopped on. Unpausing returns true: the caller renders
    /// immediately and any deferred render is dropped.
    pub fn set_paused(&mut self, host: &mut dyn Host, paused: bool) -> bool {
        let was_paused = std::mem::replace(&mut self.paused, paused);
        if paused {
            self.notify(host, UpdateSource::Pause);
            return false;
        }
        if was_paused && self.active && self.enabled {
            self.cancel(host);
            self.renders += 1;
            return true;
        }
        self.notify(host, UpdateSource::Pause);
        false
    }

    /// Enable or disable rendering when the display mode changes
    ///
    /// Disabling cancels any pending render and unsubscribes from position
    /// updates; the caller clears the overlay. Enabling resubscribes and
    /// returns true so the caller renders immediately.
    pub fn set_enabled(&mut self, host: &mut dyn Host, enabled: bool) -> bool {
        self.enabled = enabled;
        self.cancel(host);
        if !self.active {
            return false;
        }
        self.set_position_observed(host, enabled);
        if enabled {
            self.renders += 1;
        }
        enabled
    }

    /// Invalidate the outstanding timer, if any
    pub fn cancel(&mut self, host: &mut dyn Host) {
        if let Some(id) = self.scheduled.take() {
            host.kill_timeout(id);
            tracing::trace!(timer = id.0, "render_cancelled");
        }
        self.pending = false;
    }

    fn set_position_observed(&mut self, host: &mut dyn Host, observed: bool) {
        if self.position_observed != observed {
            host.observe_position(observed);
            self.position_observed = observed;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn scheduled(&self) -> Option<TimerId> {
        self.scheduled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn position_observed(&self) -> bool {
        self.position_observed
    }

    /// Number of renders released so far
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}
