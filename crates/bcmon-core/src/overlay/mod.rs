//! Timecode overlay engine
//!
//! Ties the timecode formatter to the OSD:
//! - Responsive layout from viewport size and safe area ([`layout`])
//! - Structured overlay content and ASS serialization ([`render`])
//! - Notification coalescing into deferred renders ([`scheduler`])
//!
//! [`TimecodeOverlay`] owns the display mode, the countdown flag and the
//! scheduler; nothing else mutates them.

pub mod layout;
pub mod render;
pub mod scheduler;

use crate::config::{AppConfig, InfoBlockConfig, OverlayGeometry, OverlayStyle};
use crate::host::{Host, TimerId, Viewport};
use crate::timecode::format::format_with_profile;
use crate::timecode::framerate::FramerateProfile;
use crate::timecode::SENTINEL;
use layout::{compute_layout, PLACEHOLDER_VIEWPORT};
use render::OverlayFrame;
use scheduler::{UpdateScheduler, UpdateSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What the overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Timecode, drop-frame indicator, progress bar and info block
    #[default]
    #[serde(rename = "full")]
    Full,
    /// Timecode and drop-frame indicator
    #[serde(rename = "tc_only")]
    TimecodeOnly,
    /// Reduced-size timecode
    #[serde(rename = "minimal")]
    Minimal,
    /// Overlay hidden
    #[serde(rename = "off")]
    Off,
}

impl DisplayMode {
    /// Next mode in the cycle Full -> TimecodeOnly -> Minimal -> Off -> Full
    pub fn next(self) -> Self {
        match self {
            DisplayMode::Full => DisplayMode::TimecodeOnly,
            DisplayMode::TimecodeOnly => DisplayMode::Minimal,
            DisplayMode::Minimal => DisplayMode::Off,
            DisplayMode::Off => DisplayMode::Full,
        }
    }

    /// Config name of the mode
    pub fn name(self) -> &'static str {
        match self {
            DisplayMode::Full => "full",
            DisplayMode::TimecodeOnly => "tc_only",
            DisplayMode::Minimal => "minimal",
            DisplayMode::Off => "off",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DisplayMode::Full => "Full",
            DisplayMode::TimecodeOnly => "Timecode only",
            DisplayMode::Minimal => "Minimal",
            DisplayMode::Off => "Off",
        };
        f.write_str(label)
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(DisplayMode::Full),
            "tc_only" => Ok(DisplayMode::TimecodeOnly),
            "minimal" => Ok(DisplayMode::Minimal),
            "off" => Ok(DisplayMode::Off),
            other => Err(format!("Unknown display mode: {}", other)),
        }
    }
}

/// Timecode overlay engine
#[derive(Debug)]
pub struct TimecodeOverlay {
    geometry: OverlayGeometry,
    style: OverlayStyle,
    info: InfoBlockConfig,
    message_duration: Duration,
    mode: DisplayMode,
    countdown: bool,
    /// Last dimensions reported by the host
    viewport: Option<Viewport>,
    scheduler: UpdateScheduler,
    /// Most recently submitted overlay content
    last_content: Option<String>,
    /// Framerate fallback already reported for the current file
    fallback_reported: bool,
}

impl TimecodeOverlay {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            geometry: config.geometry.clone(),
            style: config.style.clone(),
            info: config.info,
            message_duration: config.message_duration(),
            mode: config.mode,
            countdown: false,
            viewport: None,
            scheduler: UpdateScheduler::new(config.refresh_interval(), config.mode != DisplayMode::Off),
            last_content: None,
            fallback_reported: false,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn countdown(&self) -> bool {
        self.countdown
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// Most recently submitted overlay content (None after a clear)
    pub fn last_content(&self) -> Option<&str> {
        self.last_content.as_deref()
    }

    /// A file finished loading: start rendering
    pub fn start(&mut self, host: &mut dyn Host) {
        self.fallback_reported = false;
        if let Some(viewport) = host.viewport() {
            self.viewport = Some(viewport);
        }
        let paused = host.clock().paused;
        if self.scheduler.start(host, paused) {
            self.render(host);
        }
    }

    /// The file was unloaded: cancel timers and clear the overlay
    pub fn stop(&mut self, host: &mut dyn Host) {
        self.scheduler.stop(host);
        self.clear(host);
    }

    pub fn on_position(&mut self, host: &mut dyn Host) {
        self.scheduler.notify(host, UpdateSource::Position);
    }

    pub fn on_pause(&mut self, host: &mut dyn Host, paused: bool) {
        if self.scheduler.set_paused(host, paused) {
            self.render(host);
        }
    }

    pub fn on_viewport(&mut self, host: &mut dyn Host, viewport: Viewport) {
        if viewport.width == 0 || viewport.height == 0 {
            return;
        }
        self.viewport = Some(viewport);
        self.scheduler.notify(host, UpdateSource::Viewport);
    }

    pub fn on_metadata(&mut self, host: &mut dyn Host) {
        self.scheduler.notify(host, UpdateSource::Metadata);
    }

    /// Handle a fired timer; returns false when the timer was not ours
    pub fn on_timer(&mut self, host: &mut dyn Host, id: TimerId) -> bool {
        if self.scheduler.scheduled() != Some(id) {
            return false;
        }
        if self.scheduler.on_timer(id) {
            self.render(host);
        }
        true
    }

    /// Switch to the next display mode and confirm it on screen
    pub fn cycle_mode(&mut self, host: &mut dyn Host) -> DisplayMode {
        let mode = self.mode.next();
        self.set_mode(host, mode);
        host.show_message(&format!("Timecode: {}", mode), self.message_duration);
        mode
    }

    /// Switch display mode
    pub fn set_mode(&mut self, host: &mut dyn Host, mode: DisplayMode) {
        if mode == self.mode {
            return;
        }
        let was_off = self.mode == DisplayMode::Off;
        self.mode = mode;
        tracing::info!(mode = mode.name(), "display_mode_changed");

        if mode == DisplayMode::Off {
            self.scheduler.set_enabled(host, false);
            self.clear(host);
        } else if was_off {
            if self.scheduler.set_enabled(host, true) {
                self.render(host);
            }
        } else {
            self.scheduler.notify(host, UpdateSource::DisplayMode);
        }
    }

    /// Toggle between elapsed and remaining time for the main timecode
    pub fn toggle_countdown(&mut self, host: &mut dyn Host) -> bool {
        self.countdown = !self.countdown;
        let label = if self.countdown { "remaining" } else { "elapsed" };
        host.show_message(&format!("Timecode: {}", label), self.message_duration);
        self.scheduler.notify(host, UpdateSource::DisplayMode);
        self.countdown
    }

    /// Build the overlay content for the current host state
    pub fn frame(&mut self, host: &dyn Host) -> OverlayFrame {
        let clock = host.clock();
        let profile = self.profile(host);
        let viewport = self.viewport.unwrap_or(PLACEHOLDER_VIEWPORT);
        let info = self.info_lines(host, &profile);
        let layout = compute_layout(
            viewport,
            &host.safe_margins(),
            self.mode,
            &self.geometry,
            info.len(),
        );

        let timecode = if self.countdown {
            match clock.remaining() {
                Some(remaining) => format!("-{}", format_with_profile(Some(remaining), &profile)),
                None => SENTINEL.to_string(),
            }
        } else {
            format_with_profile(clock.time_position, &profile)
        };

        let progress = host
            .percent_position()
            .map(|p| p / 100.0)
            .or_else(|| match (clock.time_position, clock.duration) {
                (Some(pos), Some(dur)) if dur > 0.0 => Some(pos / dur),
                _ => None,
            })
            .map(|p| p.clamp(0.0, 1.0));

        OverlayFrame {
            layout,
            timecode,
            indicator: Some(if profile.drop_frame { "DF" } else { "NDF" }.to_string()),
            progress,
            info,
        }
    }

    /// Recompute and submit the overlay
    pub fn render(&mut self, host: &mut dyn Host) {
        if self.mode == DisplayMode::Off {
            return;
        }
        let frame = self.frame(host);
        let content = frame.to_ass(&self.style);
        tracing::trace!(timecode = %frame.timecode, "overlay_render");
        host.set_overlay(frame.layout.viewport, &content);
        self.last_content = Some(content);
    }

    fn clear(&mut self, host: &mut dyn Host) {
        host.clear_overlay();
        self.last_content = None;
    }

    fn profile(&mut self, host: &dyn Host) -> FramerateProfile {
        match FramerateProfile::try_classify(host.framerate()) {
            Ok(profile) => profile,
            Err(e) => {
                if !self.fallback_reported {
                    tracing::warn!(error = %e, "framerate_fallback");
                    self.fallback_reported = true;
                }
                FramerateProfile::fallback()
            }
        }
    }

    fn info_lines(&self, host: &dyn Host, profile: &FramerateProfile) -> Vec<String> {
        if self.mode != DisplayMode::Full {
            return Vec::new();
        }
        let clock = host.clock();
        let mut lines = Vec::new();
        if self.info.show_elapsed {
            lines.push(format!("Elapsed   {}", clock_time(clock.time_position)));
        }
        if self.info.show_remaining {
            lines.push(format!("Remaining {}", clock_time(clock.remaining())));
        }
        if self.info.show_duration {
            lines.push(format!("Duration  {}", clock_time(clock.duration)));
        }
        if self.info.show_framerate {
            lines.push(format!("Rate      {}", profile.label()));
        }
        if self.info.show_clock {
            lines.push(format!(
                "Clock     {}",
                chrono::Local::now().format("%H:%M:%S")
            ));
        }
        lines
    }
}

/// `HH:MM:SS.mmm`, or dashes when unknown
fn clock_time(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let millis = (s * 1000.0).round() as u64;
            format!(
                "{:02}:{:02}:{:02}.{:03}",
                millis / 3_600_000,
                (millis / 60_000) % 60,
                (millis / 1000) % 60,
                millis % 1000
            )
        }
        _ => "--:--:--.---".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fire_overlay_timers, HostCommand, RecordingHost};

    fn playing_host() -> RecordingHost {
        let mut host = RecordingHost::new();
        host.clock.time_position = Some(60.06);
        host.clock.duration = Some(120.12);
        host.container_fps = Some(29.97);
        host.viewport = Some(Viewport::new(1920, 1080));
        host
    }

    #[test]
    fn test_mode_cycle_order() {
        let mut mode = DisplayMode::Full;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.next();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![
                DisplayMode::TimecodeOnly,
                DisplayMode::Minimal,
                DisplayMode::Off,
                DisplayMode::Full
            ]
        );
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in [
            DisplayMode::Full,
            DisplayMode::TimecodeOnly,
            DisplayMode::Minimal,
            DisplayMode::Off,
        ] {
            assert_eq!(mode.name().parse::<DisplayMode>().unwrap(), mode);
        }
        assert!("bogus".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_start_renders_immediately() {
        let mut host = playing_host();
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        overlay.start(&mut host);
        assert_eq!(host.overlay_renders(), 1);
        assert!(overlay.last_content().unwrap().contains("00:01:00;02"));
    }

    #[test]
    fn test_frame_has_df_indicator_and_progress() {
        let host = playing_host();
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        let frame = overlay.frame(&host);
        assert_eq!(frame.timecode, "00:01:00;02");
        assert_eq!(frame.indicator.as_deref(), Some("DF"));
        approx::assert_relative_eq!(frame.progress.unwrap(), 0.5, epsilon = 1e-9);
        assert_eq!(frame.info.len(), 4);
        assert_eq!(frame.info[3], "Rate      29.97 DF");
    }

    #[test]
    fn test_percent_position_preferred_for_progress() {
        let mut host = playing_host();
        host.percent_position = Some(25.0);
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        approx::assert_relative_eq!(overlay.frame(&host).progress.unwrap(), 0.25);
    }

    #[test]
    fn test_missing_position_renders_sentinel() {
        let mut host = playing_host();
        host.clock.time_position = None;
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        assert_eq!(overlay.frame(&host).timecode, SENTINEL);
    }

    #[test]
    fn test_countdown_shows_remaining() {
        let mut host = playing_host();
        host.clock.time_position = Some(0.0);
        host.clock.duration = Some(60.06);
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        overlay.start(&mut host);
        assert!(overlay.toggle_countdown(&mut host));
        assert_eq!(overlay.frame(&host).timecode, "-00:01:00;02");

        host.clock.duration = None;
        assert_eq!(overlay.frame(&host).timecode, SENTINEL);
    }

    #[test]
    fn test_off_clears_and_unsubscribes() {
        let mut host = playing_host();
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        overlay.start(&mut host);
        overlay.set_mode(&mut host, DisplayMode::Off);

        assert!(host.commands().contains(&HostCommand::ClearOverlay));
        assert!(host.commands().contains(&HostCommand::ObservePosition(false)));
        assert!(overlay.last_content().is_none());

        let renders = host.overlay_renders();
        overlay.on_position(&mut host);
        overlay.on_viewport(&mut host, Viewport::new(1280, 720));
        fire_overlay_timers(&mut host, &mut overlay);
        assert_eq!(host.overlay_renders(), renders);
    }

    #[test]
    fn test_leaving_off_renders_immediately() {
        let config = AppConfig {
            mode: DisplayMode::Off,
            ..Default::default()
        };
        let mut host = playing_host();
        let mut overlay = TimecodeOverlay::new(&config);
        overlay.start(&mut host);
        assert_eq!(host.overlay_renders(), 0);
        assert!(!overlay.scheduler().position_observed());

        overlay.cycle_mode(&mut host);
        assert_eq!(overlay.mode(), DisplayMode::Full);
        assert_eq!(host.overlay_renders(), 1);
        assert!(overlay.scheduler().position_observed());
    }

    #[test]
    fn test_viewport_change_rescales() {
        let mut host = playing_host();
        let mut overlay = TimecodeOverlay::new(&AppConfig::default());
        overlay.start(&mut host);

        overlay.on_viewport(&mut host, Viewport::new(1280, 720));
        fire_overlay_timers(&mut host, &mut overlay);
        assert_eq!(
            host.last_overlay().map(|(viewport, _)| viewport),
            Some(Viewport::new(1280, 720))
        );
    }

    #[test]
    fn test_clock_time() {
        assert_eq!(clock_time(Some(3661.5)), "01:01:01.500");
        assert_eq!(clock_time(None), "--:--:--.---");
        assert_eq!(clock_time(Some(-1.0)), "--:--:--.---");
    }
}
