//! Active audio track properties

use crate::host::{ChannelCount, Host};
use serde::Serialize;

/// Properties of the active audio track, queried per command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioTrackDescriptor {
    /// 0 when the host reports nothing usable
    pub channel_count: u32,
    /// Number of audio tracks in the file
    pub track_count: u32,
    pub codec_name: String,
    /// Hz, 0 when unknown
    pub sample_rate: u32,
}

impl AudioTrackDescriptor {
    /// Query the host
    ///
    /// Channel count resolution: a numeric primary value wins; a layout name
    /// defers to the numeric fallback property and, failing that, to the
    /// channel count implied by the layout name.
    pub fn query(host: &dyn Host) -> Self {
        let channel_count = match host.channel_count() {
            Some(ChannelCount::Count(n)) if n > 0 => Some(n),
            Some(ChannelCount::Layout(layout)) => host
                .fallback_channel_count()
                .filter(|n| *n > 0)
                .or_else(|| channels_from_layout(&layout)),
            _ => host.fallback_channel_count().filter(|n| *n > 0),
        }
        .unwrap_or(0);

        let track_count = host.track_list().iter().filter(|t| t.is_audio()).count() as u32;

        Self {
            channel_count,
            track_count,
            codec_name: host.audio_codec().unwrap_or_else(|| "unknown".to_string()),
            sample_rate: host.sample_rate().unwrap_or(0),
        }
    }

    /// One-line summary for the audio info message
    pub fn summary(&self) -> String {
        let rate = if self.sample_rate > 0 {
            format!("{:.1} kHz", self.sample_rate as f64 / 1000.0)
        } else {
            "? kHz".to_string()
        };
        format!(
            "{} ch | {} | {} | {} audio track{}",
            self.channel_count,
            self.codec_name,
            rate,
            self.track_count,
            if self.track_count == 1 { "" } else { "s" }
        )
    }
}

/// Channel count implied by a layout name such as `5.1(side)` or `stereo`
pub fn channels_from_layout(layout: &str) -> Option<u32> {
    let name = layout.trim().to_ascii_lowercase();
    let base = name.split('(').next().unwrap_or("").trim();

    match base {
        "mono" => return Some(1),
        "stereo" | "downmix" => return Some(2),
        "quad" => return Some(4),
        "hexagonal" => return Some(6),
        "octagonal" => return Some(8),
        _ => {}
    }

    // "5.1" -> 5 + 1, "7.1.4" -> 7 + 1 + 4, "3.0" -> 3
    let parts: Option<Vec<u32>> = base.split('.').map(|p| p.parse::<u32>().ok()).collect();
    match parts {
        Some(parts) if (2..=3).contains(&parts.len()) => {
            let total: u32 = parts.iter().sum();
            (total > 0).then_some(total)
        }
        _ => base.parse::<u32>().ok().filter(|n| *n > 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TrackInfo;
    use crate::testing::RecordingHost;

    #[test]
    fn test_layout_names() {
        assert_eq!(channels_from_layout("5.1"), Some(6));
        assert_eq!(channels_from_layout("5.1(side)"), Some(6));
        assert_eq!(channels_from_layout("7.1"), Some(8));
        assert_eq!(channels_from_layout("Stereo"), Some(2));
        assert_eq!(channels_from_layout("mono"), Some(1));
        assert_eq!(channels_from_layout("quad"), Some(4));
        assert_eq!(channels_from_layout("7.1.4"), Some(12));
        assert_eq!(channels_from_layout("16"), Some(16));
        assert_eq!(channels_from_layout("unknown"), None);
    }

    #[test]
    fn test_numeric_primary_wins() {
        let mut host = RecordingHost::new();
        host.channel_count = Some(ChannelCount::Count(8));
        host.fallback_channel_count = Some(2);
        assert_eq!(AudioTrackDescriptor::query(&host).channel_count, 8);
    }

    #[test]
    fn test_layout_name_uses_fallback_property() {
        let mut host = RecordingHost::new();
        host.channel_count = Some(ChannelCount::Layout("5.1(side)".to_string()));
        host.fallback_channel_count = Some(6);
        assert_eq!(AudioTrackDescriptor::query(&host).channel_count, 6);

        host.fallback_channel_count = None;
        assert_eq!(AudioTrackDescriptor::query(&host).channel_count, 6);
    }

    #[test]
    fn test_nothing_usable_is_zero() {
        let host = RecordingHost::new();
        let track = AudioTrackDescriptor::query(&host);
        assert_eq!(track.channel_count, 0);
        assert_eq!(track.codec_name, "unknown");
    }

    #[test]
    fn test_track_count_only_counts_audio() {
        let mut host = RecordingHost::new();
        host.tracks = vec![
            TrackInfo { id: 1, kind: "video".into(), selected: true },
            TrackInfo { id: 1, kind: "audio".into(), selected: true },
            TrackInfo { id: 2, kind: "audio".into(), selected: false },
            TrackInfo { id: 1, kind: "sub".into(), selected: false },
        ];
        host.audio_codec = Some("pcm_s24le".to_string());
        host.sample_rate = Some(48000);
        host.channel_count = Some(ChannelCount::Count(16));

        let track = AudioTrackDescriptor::query(&host);
        assert_eq!(track.track_count, 2);
        assert_eq!(track.summary(), "16 ch | pcm_s24le | 48.0 kHz | 2 audio tracks");
    }
}
