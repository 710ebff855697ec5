//! [`Host`] implementation backed by an mpv IPC connection
//!
//! [`MpvHost`] is synchronous: property reads come from a cache filled by
//! `property-change` events, and commands are encoded into an outbox that
//! the connection loop flushes after each event. Timers are deadlines the
//! loop sleeps on.

use crate::protocol::{Request, OBSERVED_PROPERTIES, POSITION_OBSERVER};
use bcmon_core::audio::chain::FilterStage;
use bcmon_core::host::{
    ChannelCount, Host, HostEvent, PlaybackClock, SafeMargins, TimerId, TrackInfo, Viewport,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// `osd-overlay` id owned by bcmon
const OVERLAY_ID: u64 = 1;

/// Last known values of the observed properties
#[derive(Debug, Default)]
struct PropertyCache {
    time_pos: Option<f64>,
    duration: Option<f64>,
    paused: bool,
    container_fps: Option<f64>,
    stream_fps: Option<f64>,
    viewport: Option<Viewport>,
    margins: SafeMargins,
    percent_pos: Option<f64>,
    tracks: Vec<TrackInfo>,
    channels: Option<ChannelCount>,
    channel_count: Option<u32>,
    codec: Option<String>,
    sample_rate: Option<u32>,
}

/// mpv host state for one connection
#[derive(Debug, Default)]
pub struct MpvHost {
    props: PropertyCache,
    outbox: Vec<String>,
    next_request: u64,
    timers: BTreeMap<TimerId, Instant>,
    next_timer: u64,
    /// Labels of filters bcmon added and has not removed yet
    installed_filters: Vec<&'static str>,
}

impl MpvHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the property observers every session needs
    pub fn observe_properties(&mut self) {
        for (id, name) in OBSERVED_PROPERTIES {
            self.send(json!(["observe_property", id, name]));
        }
    }

    /// Encoded request lines waiting to be written
    pub fn take_outbox(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// Earliest timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    /// Remove and return timers due at `now`, in scheduling order
    pub fn take_due_timers(&mut self, now: Instant) -> Vec<TimerId> {
        let due: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &due {
            self.timers.remove(id);
        }
        due
    }

    /// Store a property value and map it to a session event
    pub fn apply_property(&mut self, name: &str, data: &Value) -> Option<HostEvent> {
        let p = &mut self.props;
        match name {
            "time-pos" => {
                p.time_pos = data.as_f64();
                Some(HostEvent::PositionChanged)
            }
            "pause" => {
                p.paused = data.as_bool().unwrap_or(false);
                Some(HostEvent::PauseChanged(p.paused))
            }
            "duration" => {
                p.duration = data.as_f64();
                Some(HostEvent::MetadataChanged)
            }
            "container-fps" => {
                p.container_fps = data.as_f64();
                Some(HostEvent::MetadataChanged)
            }
            "estimated-vf-fps" => {
                p.stream_fps = data.as_f64();
                Some(HostEvent::MetadataChanged)
            }
            "osd-dimensions" => {
                let field = |key: &str| data.get(key).and_then(Value::as_f64);
                let width = field("w").unwrap_or(0.0) as u32;
                let height = field("h").unwrap_or(0.0) as u32;
                p.margins = SafeMargins {
                    left: field("ml").unwrap_or(0.0),
                    top: field("mt").unwrap_or(0.0),
                    right: field("mr").unwrap_or(0.0),
                    bottom: field("mb").unwrap_or(0.0),
                };
                if width == 0 || height == 0 {
                    return None;
                }
                let viewport = Viewport::new(width, height);
                p.viewport = Some(viewport);
                Some(HostEvent::ViewportChanged(viewport))
            }
            "percent-pos" => {
                p.percent_pos = data.as_f64();
                None
            }
            "track-list" => {
                p.tracks = parse_tracks(data);
                None
            }
            "audio-params/channels" => {
                p.channels = match data {
                    Value::Number(n) => n.as_u64().map(|n| ChannelCount::Count(n as u32)),
                    Value::String(s) => Some(match s.parse::<u32>() {
                        Ok(n) => ChannelCount::Count(n),
                        Err(_) => ChannelCount::Layout(s.clone()),
                    }),
                    _ => None,
                };
                Some(HostEvent::AudioParamsChanged)
            }
            "audio-params/channel-count" => {
                p.channel_count = data.as_u64().map(|n| n as u32);
                Some(HostEvent::AudioParamsChanged)
            }
            "audio-codec-name" => {
                p.codec = data.as_str().map(str::to_string);
                None
            }
            "audio-params/samplerate" => {
                p.sample_rate = data.as_u64().map(|n| n as u32);
                None
            }
            other => {
                tracing::trace!(property = other, "unhandled_property");
                None
            }
        }
    }

    fn send(&mut self, command: Value) {
        self.next_request += 1;
        let request = Request {
            command,
            request_id: self.next_request,
        };
        match request.encode() {
            Ok(line) => self.outbox.push(line),
            Err(e) => tracing::warn!(error = %e, "Failed to encode mpv request"),
        }
    }
}

fn parse_tracks(data: &Value) -> Vec<TrackInfo> {
    data.as_array()
        .map(|tracks| {
            tracks
                .iter()
                .map(|t| TrackInfo {
                    id: t.get("id").and_then(Value::as_u64).unwrap_or(0) as u32,
                    kind: t
                        .get("type")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    selected: t.get("selected").and_then(Value::as_bool).unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default()
}

impl Host for MpvHost {
    fn clock(&self) -> PlaybackClock {
        PlaybackClock {
            time_position: self.props.time_pos,
            duration: self.props.duration,
            paused: self.props.paused,
        }
    }

    fn container_fps(&self) -> Option<f64> {
        self.props.container_fps
    }

    fn stream_fps(&self) -> Option<f64> {
        self.props.stream_fps
    }

    fn viewport(&self) -> Option<Viewport> {
        self.props.viewport
    }

    fn safe_margins(&self) -> SafeMargins {
        self.props.margins
    }

    fn percent_position(&self) -> Option<f64> {
        self.props.percent_pos
    }

    fn track_list(&self) -> Vec<TrackInfo> {
        self.props.tracks.clone()
    }

    fn channel_count(&self) -> Option<ChannelCount> {
        self.props.channels.clone()
    }

    fn fallback_channel_count(&self) -> Option<u32> {
        self.props.channel_count
    }

    fn audio_codec(&self) -> Option<String> {
        self.props.codec.clone()
    }

    fn sample_rate(&self) -> Option<u32> {
        self.props.sample_rate
    }

    fn set_overlay(&mut self, viewport: Viewport, content: &str) {
        self.send(json!({
            "name": "osd-overlay",
            "id": OVERLAY_ID,
            "format": "ass-events",
            "data": content,
            "res_x": viewport.width,
            "res_y": viewport.height,
        }));
    }

    fn clear_overlay(&mut self) {
        self.send(json!({
            "name": "osd-overlay",
            "id": OVERLAY_ID,
            "format": "none",
            "data": "",
        }));
    }

    fn show_message(&mut self, text: &str, duration: Duration) {
        self.send(json!(["show-text", text, duration.as_millis() as u64]));
    }

    fn clear_audio_filters(&mut self) {
        for label in std::mem::take(&mut self.installed_filters) {
            self.send(json!(["af", "remove", format!("@{}", label)]));
        }
    }

    fn append_audio_filter(&mut self, stage: &FilterStage) {
        let label = stage.label();
        self.send(json!([
            "af",
            "add",
            format!("@{}:lavfi=[{}]", label, stage.to_lavfi())
        ]));
        self.installed_filters.push(label);
    }

    fn add_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.timers.insert(id, Instant::now() + delay);
        id
    }

    fn kill_timeout(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    fn observe_position(&mut self, enabled: bool) {
        if enabled {
            self.send(json!(["observe_property", POSITION_OBSERVER, "time-pos"]));
        } else {
            self.send(json!(["unobserve_property", POSITION_OBSERVER]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcmon_core::audio::loudness::{build_loudness_stage, LoudnessProfile};

    fn commands(host: &mut MpvHost) -> Vec<Value> {
        host.take_outbox()
            .iter()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["command"].clone())
            .collect()
    }

    #[test]
    fn test_osd_dimensions_update_viewport_and_margins() {
        let mut host = MpvHost::new();
        let event = host.apply_property(
            "osd-dimensions",
            &json!({"w": 1920, "h": 1080, "par": 1.0, "aspect": 1.78, "mt": 0, "mb": 40, "ml": 0, "mr": 0}),
        );
        assert_eq!(event, Some(HostEvent::ViewportChanged(Viewport::new(1920, 1080))));
        assert_eq!(host.safe_margins().bottom, 40.0);
    }

    #[test]
    fn test_zero_dimensions_are_ignored() {
        let mut host = MpvHost::new();
        assert_eq!(host.apply_property("osd-dimensions", &json!({"w": 0, "h": 0})), None);
        assert_eq!(host.viewport(), None);
    }

    #[test]
    fn test_channel_layout_and_fallback() {
        let mut host = MpvHost::new();
        assert_eq!(
            host.apply_property("audio-params/channels", &json!("5.1(side)")),
            Some(HostEvent::AudioParamsChanged)
        );
        assert_eq!(
            host.apply_property("audio-params/channel-count", &json!(6)),
            Some(HostEvent::AudioParamsChanged)
        );
        assert_eq!(
            host.channel_count(),
            Some(ChannelCount::Layout("5.1(side)".to_string()))
        );
        assert_eq!(host.fallback_channel_count(), Some(6));

        host.apply_property("audio-params/channels", &json!("8"));
        assert_eq!(host.channel_count(), Some(ChannelCount::Count(8)));
    }

    #[test]
    fn test_unavailable_property_clears_value() {
        let mut host = MpvHost::new();
        host.apply_property("time-pos", &json!(3.5));
        assert_eq!(host.clock().time_position, Some(3.5));
        host.apply_property("time-pos", &Value::Null);
        assert_eq!(host.clock().time_position, None);
    }

    #[test]
    fn test_track_list_parsing() {
        let mut host = MpvHost::new();
        host.apply_property(
            "track-list",
            &json!([
                {"id": 1, "type": "video", "selected": true},
                {"id": 1, "type": "audio", "selected": true, "codec": "pcm_s24le"},
                {"id": 2, "type": "audio", "selected": false}
            ]),
        );
        assert_eq!(host.track_list().iter().filter(|t| t.is_audio()).count(), 2);
    }

    #[test]
    fn test_filter_commands_use_labels() {
        let mut host = MpvHost::new();
        let stage = FilterStage::Loudness(
            build_loudness_stage(Some(&LoudnessProfile::ebu_r128())).unwrap(),
        );
        host.clear_audio_filters();
        host.append_audio_filter(&stage);
        host.clear_audio_filters();

        let sent = commands(&mut host);
        assert_eq!(
            sent,
            vec![
                json!(["af", "add", "@bcmon_loudnorm:lavfi=[loudnorm=I=-23:TP=-1:LRA=11:linear=true]"]),
                json!(["af", "remove", "@bcmon_loudnorm"]),
            ]
        );
    }

    #[test]
    fn test_overlay_commands() {
        let mut host = MpvHost::new();
        host.set_overlay(Viewport::new(1280, 720), "{\\an2}00:00:01:00");
        host.clear_overlay();
        let sent = commands(&mut host);
        assert_eq!(sent[0]["name"], "osd-overlay");
        assert_eq!(sent[0]["format"], "ass-events");
        assert_eq!(sent[0]["res_y"], 720);
        assert_eq!(sent[1]["format"], "none");
    }

    #[test]
    fn test_position_observer_toggle() {
        let mut host = MpvHost::new();
        host.observe_position(true);
        host.observe_position(false);
        assert_eq!(
            commands(&mut host),
            vec![
                json!(["observe_property", 1, "time-pos"]),
                json!(["unobserve_property", 1]),
            ]
        );
    }

    #[test]
    fn test_request_ids_increase() {
        let mut host = MpvHost::new();
        host.observe_properties();
        let ids: Vec<u64> = host
            .take_outbox()
            .iter()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["request_id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids.len(), OBSERVED_PROPERTIES.len());
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_by_deadline() {
        let mut host = MpvHost::new();
        let soon = host.add_timeout(Duration::ZERO);
        let later = host.add_timeout(Duration::from_millis(100));
        let killed = host.add_timeout(Duration::ZERO);
        host.kill_timeout(killed);

        assert_eq!(host.take_due_timers(Instant::now()), vec![soon]);
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(host.take_due_timers(Instant::now()), vec![later]);
        assert_eq!(host.next_deadline(), None);
    }
}
