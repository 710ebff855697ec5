//! E2E tests for overlay scheduling
//!
//! Checks render coalescing, pause handling, display-mode switching and
//! teardown through the session, counting what reaches the host.

use bcmon::host::{HostEvent, Viewport};
use bcmon::overlay::DisplayMode;
use bcmon::testing::{fire_timers, HostCommand, RecordingHost};
use bcmon::{AppConfig, Session};

fn playing() -> (RecordingHost, Session) {
    let mut host = RecordingHost::new();
    host.clock.time_position = Some(0.0);
    host.clock.duration = Some(600.0);
    host.container_fps = Some(29.97);
    host.viewport = Some(Viewport::new(1920, 1080));

    let mut session = Session::new(&AppConfig::default());
    session.handle_event(&mut host, HostEvent::FileLoaded);
    (host, session)
}

#[test]
fn test_n_notifications_one_render() {
    let (mut host, mut session) = playing();
    let before = host.overlay_renders();

    for n in [1usize, 5, 100] {
        for i in 0..n {
            host.clock.time_position = Some(i as f64 / 30.0);
            session.handle_event(&mut host, HostEvent::PositionChanged);
        }
        session.handle_event(&mut host, HostEvent::ViewportChanged(Viewport::new(1280, 720)));
        assert_eq!(host.pending_timers().len(), 1, "burst of {}", n);
        fire_timers(&mut host, &mut session);
    }
    assert_eq!(host.overlay_renders(), before + 3);
}

#[test]
fn test_paused_ignores_position() {
    let (mut host, mut session) = playing();
    session.handle_event(&mut host, HostEvent::PauseChanged(true));
    fire_timers(&mut host, &mut session);
    let renders = host.overlay_renders();

    for _ in 0..10 {
        session.handle_event(&mut host, HostEvent::PositionChanged);
    }
    assert_eq!(fire_timers(&mut host, &mut session), 0);
    assert_eq!(host.overlay_renders(), renders);

    // Unpause renders at once, without waiting for a timer
    session.handle_event(&mut host, HostEvent::PauseChanged(false));
    assert_eq!(host.overlay_renders(), renders + 1);
    assert!(host.pending_timers().is_empty());
}

#[test]
fn test_off_mode_cancels_pending_render() {
    let (mut host, mut session) = playing();
    session.handle_event(&mut host, HostEvent::PositionChanged);
    let pending = host.pending_timers();
    assert_eq!(pending.len(), 1);

    for _ in 0..3 {
        session.dispatch(&mut host, "cycleDisplayMode");
    }
    assert_eq!(session.overlay.mode(), DisplayMode::Off);
    assert!(host.pending_timers().is_empty());
    assert!(host.last_overlay().is_none());
    assert!(!host.position_observed());

    // A stale callback delivered anyway does nothing
    let renders = host.overlay_renders();
    session.on_timer(&mut host, pending[0]);
    assert_eq!(host.overlay_renders(), renders);

    session.dispatch(&mut host, "cycleDisplayMode");
    assert_eq!(session.overlay.mode(), DisplayMode::Full);
    assert_eq!(host.overlay_renders(), renders + 1);
    assert!(host.position_observed());
}

#[test]
fn test_end_file_cancels_everything() {
    let (mut host, mut session) = playing();
    session.handle_event(&mut host, HostEvent::PositionChanged);
    session.handle_event(&mut host, HostEvent::EndFile);

    assert!(host.pending_timers().is_empty());
    assert!(host.last_overlay().is_none());
    assert_eq!(fire_timers(&mut host, &mut session), 0);

    // Late notifications after unload are dropped
    session.handle_event(&mut host, HostEvent::MetadataChanged);
    assert!(host.pending_timers().is_empty());
}

#[test]
fn test_a_replacement_timer_follows_a_kill() {
    let (mut host, mut session) = playing();
    session.handle_event(&mut host, HostEvent::PauseChanged(true));
    session.handle_event(&mut host, HostEvent::PauseChanged(false));
    session.handle_event(&mut host, HostEvent::PositionChanged);

    let commands = host.commands();
    let kill = commands
        .iter()
        .position(|c| matches!(c, HostCommand::KillTimeout(_)))
        .unwrap();
    let last_add = commands
        .iter()
        .rposition(|c| matches!(c, HostCommand::AddTimeout { .. }))
        .unwrap();
    assert!(kill < last_add);
    assert_eq!(host.pending_timers().len(), 1);
}

#[test]
fn test_overlay_follows_viewport() {
    let (mut host, mut session) = playing();
    host.clock.time_position = Some(60.06);
    session.handle_event(&mut host, HostEvent::ViewportChanged(Viewport::new(3840, 2160)));
    fire_timers(&mut host, &mut session);

    let (viewport, content) = host.last_overlay().unwrap();
    assert_eq!(viewport, Viewport::new(3840, 2160));
    assert!(content.contains("00:01:00;02"));
    // 2160 * 0.055 = 118.8 -> fs119
    assert!(content.contains("\\fs119"));
}

#[test]
fn test_countdown_and_modes_render_differently() {
    let (mut host, mut session) = playing();
    host.clock.time_position = Some(539.94);
    session.dispatch(&mut host, "toggleCountdown");
    fire_timers(&mut host, &mut session);
    let full = host.last_overlay().unwrap().1.to_string();
    assert!(full.contains("-00:01:00;02"));

    session.dispatch(&mut host, "cycleDisplayMode");
    session.dispatch(&mut host, "cycleDisplayMode");
    fire_timers(&mut host, &mut session);
    let minimal = host.last_overlay().unwrap().1.to_string();
    assert_eq!(minimal.lines().count(), 1);
    assert!(full.lines().count() > minimal.lines().count());
}
