//! mpv JSON IPC wire format
//!
//! Newline-delimited JSON in both directions. Outgoing requests carry a
//! `command` (positional array or named-argument object) and a
//! `request_id`; incoming lines are either events or replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Observer id used for `time-pos` (toggled by the overlay scheduler)
pub const POSITION_OBSERVER: u64 = 1;

/// Properties observed for the whole connection, with their observer ids
pub const OBSERVED_PROPERTIES: [(u64, &str); 11] = [
    (2, "pause"),
    (3, "duration"),
    (4, "container-fps"),
    (5, "estimated-vf-fps"),
    (6, "osd-dimensions"),
    (7, "percent-pos"),
    (8, "track-list"),
    (9, "audio-params/channels"),
    (10, "audio-params/channel-count"),
    (11, "audio-codec-name"),
    (12, "audio-params/samplerate"),
];

/// Raw incoming line
#[derive(Debug, Deserialize)]
struct RawMessage {
    event: Option<String>,
    name: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    args: Vec<String>,
    reason: Option<String>,
    error: Option<String>,
    request_id: Option<u64>,
}

/// Decoded incoming line
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Observed property changed; `data` is null when unavailable
    PropertyChange { name: String, data: Value },
    FileLoaded,
    EndFile { reason: Option<String> },
    /// `script-message` from key bindings or other clients
    ClientMessage(Vec<String>),
    Shutdown,
    /// Reply to one of our requests
    Reply {
        request_id: Option<u64>,
        error: String,
    },
    /// Any other event
    Other(String),
}

impl Inbound {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let raw: RawMessage = serde_json::from_str(line)?;

        let Some(event) = raw.event else {
            return Ok(Inbound::Reply {
                request_id: raw.request_id,
                error: raw.error.unwrap_or_else(|| "success".to_string()),
            });
        };

        Ok(match event.as_str() {
            "property-change" => Inbound::PropertyChange {
                name: raw.name.unwrap_or_default(),
                data: raw.data,
            },
            "file-loaded" => Inbound::FileLoaded,
            "end-file" => Inbound::EndFile { reason: raw.reason },
            "client-message" => Inbound::ClientMessage(raw.args),
            "shutdown" => Inbound::Shutdown,
            _ => Inbound::Other(event),
        })
    }
}

/// Outgoing request
#[derive(Debug, Serialize)]
pub struct Request {
    pub command: Value,
    pub request_id: u64,
}

impl Request {
    /// Encode as one newline-terminated line
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_property_change() {
        let msg = Inbound::parse(r#"{"event":"property-change","id":1,"name":"time-pos","data":12.5}"#)
            .unwrap();
        assert_eq!(
            msg,
            Inbound::PropertyChange {
                name: "time-pos".to_string(),
                data: json!(12.5)
            }
        );
    }

    #[test]
    fn test_parse_unavailable_property() {
        let msg = Inbound::parse(r#"{"event":"property-change","id":3,"name":"duration"}"#).unwrap();
        assert!(matches!(msg, Inbound::PropertyChange { data: Value::Null, .. }));
    }

    #[test]
    fn test_parse_events() {
        assert_eq!(
            Inbound::parse(r#"{"event":"file-loaded"}"#).unwrap(),
            Inbound::FileLoaded
        );
        assert_eq!(
            Inbound::parse(r#"{"event":"end-file","reason":"eof","playlist_entry_id":1}"#).unwrap(),
            Inbound::EndFile {
                reason: Some("eof".to_string())
            }
        );
        assert_eq!(
            Inbound::parse(r#"{"event":"client-message","args":["pair:2"]}"#).unwrap(),
            Inbound::ClientMessage(vec!["pair:2".to_string()])
        );
        assert_eq!(
            Inbound::parse(r#"{"event":"seek"}"#).unwrap(),
            Inbound::Other("seek".to_string())
        );
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(
            Inbound::parse(r#"{"request_id":7,"error":"property unavailable"}"#).unwrap(),
            Inbound::Reply {
                request_id: Some(7),
                error: "property unavailable".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Inbound::parse("not json").is_err());
    }

    #[test]
    fn test_encode_request() {
        let line = Request {
            command: json!(["show-text", "hi", 2000]),
            request_id: 4,
        }
        .encode()
        .unwrap();
        assert_eq!(line, "{\"command\":[\"show-text\",\"hi\",2000],\"request_id\":4}\n");
    }
}
