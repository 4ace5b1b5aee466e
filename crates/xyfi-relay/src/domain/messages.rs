//! JSON event frames for the browser-facing WebSocket protocol.
//!
//! Browsers emit named events with positional arguments.  On the wire each
//! WebSocket text frame carries exactly one event:
//!
//! ```json
//! {"event":"position","args":[[0.25,0.75]]}
//! {"event":"push","args":["9f0c2b..."]}
//! ```
//!
//! Inbound frames from remotes are interpreted as [`RemoteEvent`]s.  Outbound
//! frames to screens are produced from [`ScreenEvent`]s.  Payloads forwarded
//! to screens are kept as raw [`serde_json::Value`]s so they reach viewers
//! exactly as the remote sent them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use xyfi_core::Position;

/// Failure to parse or serialize an [`EventFrame`].
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid event frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),
}

/// One named event with its positional arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            event: event.into(),
            args,
        }
    }

    /// Parses a WebSocket text frame.
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes this frame for a WebSocket text frame.
    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// The first argument, or `null` when the event carried none.
    pub fn first_arg(&self) -> &Value {
        self.args.first().unwrap_or(&Value::Null)
    }
}

// ── Remote → relay ────────────────────────────────────────────────────────────

/// An event received on the `/remotes` channel.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    /// Pointer position; the payload is forwarded verbatim to screens.
    Position(Value),
    /// Touch state; the payload is boolean-like.
    Touching(Value),
    /// Any other event name.
    Unknown(String),
}

impl RemoteEvent {
    pub fn from_frame(frame: EventFrame) -> Self {
        let payload = frame.first_arg().clone();
        match frame.event.as_str() {
            "position" => RemoteEvent::Position(payload),
            "touching" => RemoteEvent::Touching(payload),
            _ => RemoteEvent::Unknown(frame.event),
        }
    }
}

/// How a `position` payload is treated for the outbound datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionPayload {
    /// `[]`: the remote has no position yet.
    Empty,
    /// `[x, y]` with two numbers.
    Point(Position),
    /// Anything else.
    Malformed,
}

impl PositionPayload {
    pub fn from_json(payload: &Value) -> Self {
        let Some(items) = payload.as_array() else {
            return PositionPayload::Malformed;
        };
        match items.as_slice() {
            [] => PositionPayload::Empty,
            [x, y] => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => PositionPayload::Point(Position::new(x as f32, y as f32)),
                _ => PositionPayload::Malformed,
            },
            _ => PositionPayload::Malformed,
        }
    }
}

/// Interprets a boolean-like `touching` payload.
///
/// Booleans map directly, the strings `"true"` and `"1"` (case-insensitive)
/// are true, numbers are true when non-zero, and everything else is false.
pub fn touching_from_json(payload: &Value) -> bool {
    match payload {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
        _ => false,
    }
}

// ── Relay → screen ────────────────────────────────────────────────────────────

/// An event delivered on the `/screens` channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    /// Sent once to a newly connected screen.
    Initialize {
        /// Raw connection ids of every live remote, sorted.
        remote_ids: Vec<String>,
        /// `host:port` phones should connect to.
        address: String,
    },
    /// A remote connected; carries its bare id.
    Push { id: String },
    /// A remote disconnected; carries its raw connection id.
    Pop { raw_id: String },
    /// A remote moved; carries its bare id and the payload as received.
    Position { id: String, position: Value },
}

impl ScreenEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ScreenEvent::Initialize { .. } => "initialize",
            ScreenEvent::Push { .. } => "push",
            ScreenEvent::Pop { .. } => "pop",
            ScreenEvent::Position { .. } => "position",
        }
    }

    pub fn to_frame(&self) -> EventFrame {
        let args = match self {
            ScreenEvent::Initialize {
                remote_ids,
                address,
            } => vec![json!({ "remoteIDs": remote_ids, "address": address })],
            ScreenEvent::Push { id } => vec![json!(id)],
            ScreenEvent::Pop { raw_id } => vec![json!(raw_id)],
            ScreenEvent::Position { id, position } => vec![json!(id), position.clone()],
        };
        EventFrame::new(self.name(), args)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position_frame() {
        // Arrange
        let text = r#"{"event":"position","args":[[3,4]]}"#;
        // Act
        let frame = EventFrame::parse(text).unwrap();
        // Assert
        assert_eq!(frame.event, "position");
        assert_eq!(frame.args, vec![json!([3, 4])]);
    }

    #[test]
    fn test_parse_frame_without_args() {
        let frame = EventFrame::parse(r#"{"event":"touching"}"#).unwrap();
        assert!(frame.args.is_empty());
        assert_eq!(frame.first_arg(), &Value::Null);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            EventFrame::parse("not json"),
            Err(MessageError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_remote_event_dispatch_by_name() {
        let position = EventFrame::new("position", vec![json!([1, 2])]);
        let touching = EventFrame::new("touching", vec![json!(true)]);
        let other = EventFrame::new("wave", vec![]);

        assert_eq!(
            RemoteEvent::from_frame(position),
            RemoteEvent::Position(json!([1, 2]))
        );
        assert_eq!(
            RemoteEvent::from_frame(touching),
            RemoteEvent::Touching(json!(true))
        );
        assert_eq!(
            RemoteEvent::from_frame(other),
            RemoteEvent::Unknown("wave".to_string())
        );
    }

    #[test]
    fn test_position_payload_variants() {
        assert_eq!(PositionPayload::from_json(&json!([])), PositionPayload::Empty);
        assert_eq!(
            PositionPayload::from_json(&json!([1.5, -2.25])),
            PositionPayload::Point(Position::new(1.5, -2.25))
        );
        assert_eq!(
            PositionPayload::from_json(&json!([3, 4])),
            PositionPayload::Point(Position::new(3.0, 4.0))
        );
    }

    #[test]
    fn test_position_payload_malformed_shapes() {
        for payload in [
            json!(null),
            json!("3,4"),
            json!({"x": 3, "y": 4}),
            json!([3]),
            json!([3, 4, 5]),
            json!(["3", 4]),
        ] {
            assert_eq!(
                PositionPayload::from_json(&payload),
                PositionPayload::Malformed,
                "payload {payload} should be malformed"
            );
        }
    }

    #[test]
    fn test_touching_interpretation() {
        assert!(touching_from_json(&json!(true)));
        assert!(!touching_from_json(&json!(false)));
        assert!(touching_from_json(&json!("true")));
        assert!(touching_from_json(&json!("TRUE")));
        assert!(touching_from_json(&json!("1")));
        assert!(!touching_from_json(&json!("false")));
        assert!(touching_from_json(&json!(1)));
        assert!(!touching_from_json(&json!(0)));
        assert!(!touching_from_json(&Value::Null));
    }

    #[test]
    fn test_initialize_frame_shape() {
        // Arrange
        let event = ScreenEvent::Initialize {
            remote_ids: vec!["/remotes#A".to_string(), "/remotes#B".to_string()],
            address: "10.0.0.2:8443".to_string(),
        };
        // Act
        let json = event.to_frame().to_json().unwrap();
        // Assert
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "initialize",
                "args": [{"remoteIDs": ["/remotes#A", "/remotes#B"], "address": "10.0.0.2:8443"}]
            })
        );
    }

    #[test]
    fn test_push_pop_position_frames() {
        let push = ScreenEvent::Push { id: "R1".into() }.to_frame();
        assert_eq!(push, EventFrame::new("push", vec![json!("R1")]));

        let pop = ScreenEvent::Pop { raw_id: "/remotes#R1".into() }.to_frame();
        assert_eq!(pop, EventFrame::new("pop", vec![json!("/remotes#R1")]));

        let position = ScreenEvent::Position {
            id: "R1".into(),
            position: json!([]),
        }
        .to_frame();
        assert_eq!(position, EventFrame::new("position", vec![json!("R1"), json!([])]));
    }
}
