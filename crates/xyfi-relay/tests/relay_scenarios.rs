//! End-to-end relay scenarios without WebSocket transport.
//!
//! Each test drives a [`RelayCore`] wired to a real [`UdpDatagramSink`] and
//! reads the engine side back from a plain UDP socket, so the full path from
//! a remote event to an OSC datagram is covered.

use std::net::UdpSocket;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use xyfi_core::{
    decode_message, DisplayColor, IdentityRegistry, OscArg, OscMessage, RandomSource, RemoteId,
    SeededRandom,
};
use xyfi_relay::application::RelayCore;
use xyfi_relay::domain::{EventFrame, ScreenEvent};
use xyfi_relay::infrastructure::UdpDatagramSink;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Always picks the first palette entry and perturbs position 1 to `0`.
struct AlwaysFirst;

impl RandomSource for AlwaysFirst {
    fn pick_index(&mut self, _len: usize) -> usize {
        0
    }
    fn perturb_position(&mut self) -> usize {
        1
    }
    fn digit(&mut self) -> u8 {
        0
    }
}

struct Engine {
    socket: UdpSocket,
}

impl Engine {
    fn bind() -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        Self { socket }
    }

    fn sink(&self) -> Arc<UdpDatagramSink> {
        Arc::new(UdpDatagramSink::bind(self.socket.local_addr().unwrap()).unwrap())
    }

    fn recv(&self) -> Option<OscMessage> {
        let mut buf = [0u8; 512];
        let (len, _) = self.socket.recv_from(&mut buf).ok()?;
        Some(decode_message(&buf[..len]).unwrap())
    }
}

fn make_core<R: RandomSource>(engine: &Engine, random: R) -> RelayCore<R> {
    RelayCore::new(
        IdentityRegistry::with_random(random),
        engine.sink(),
        "192.168.1.20:8443",
        32,
    )
}

fn drain(rx: &mut mpsc::Receiver<ScreenEvent>) -> Vec<ScreenEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_connect_registers_identity_and_pushes_to_screens() {
    // Arrange
    let engine = Engine::bind();
    let core = make_core(&engine, SeededRandom::new(11));
    let (_, mut screen) = core.screen_connected();
    drain(&mut screen);

    // Act
    core.remote_connected("/remotes#R1");

    // Assert
    assert_eq!(drain(&mut screen), vec![ScreenEvent::Push { id: "R1".into() }]);
    let snapshot = core.snapshot();
    let (color, ticks) = snapshot.get(&RemoteId::new("R1")).expect("R1 registered");
    assert_eq!(color.as_str().len(), 7);
    assert_eq!(*ticks, 0);
}

#[test]
fn test_empty_position_broadcasts_without_datagram() {
    let engine = Engine::bind();
    let core = make_core(&engine, SeededRandom::new(11));
    core.remote_connected("/remotes#R1");
    let (_, mut screen) = core.screen_connected();
    drain(&mut screen);

    core.handle_remote_frame("/remotes#R1", EventFrame::parse(r#"{"event":"position","args":[[]]}"#).unwrap());

    assert_eq!(
        drain(&mut screen),
        vec![ScreenEvent::Position {
            id: "R1".into(),
            position: json!([]),
        }]
    );
    assert!(engine.recv().is_none(), "no datagram for an empty position");
}

#[test]
fn test_position_then_disconnect() {
    // Arrange
    let engine = Engine::bind();
    let core = make_core(&engine, SeededRandom::new(11));
    core.remote_connected("/remotes#R1");
    let (_, mut screen) = core.screen_connected();
    drain(&mut screen);

    // Act
    core.remote_position("/remotes#R1", json!([3, 4]));
    core.remote_disconnected("/remotes#R1");

    // Assert
    assert_eq!(
        drain(&mut screen),
        vec![
            ScreenEvent::Position {
                id: "R1".into(),
                position: json!([3, 4]),
            },
            ScreenEvent::Pop {
                raw_id: "/remotes#R1".into()
            },
        ]
    );
    let datagram = engine.recv().expect("position datagram");
    assert_eq!(datagram.address, "/unity/pointing");
    assert_eq!(
        datagram.args,
        vec![OscArg::from("R1"), OscArg::Float(3.0), OscArg::Float(4.0)]
    );
    assert!(!core.snapshot().iter().any(|(id, _)| id.as_str() == "R1"));
}

#[test]
fn test_touching_reaches_engine() {
    let engine = Engine::bind();
    let core = make_core(&engine, SeededRandom::new(11));

    core.remote_touching("/remotes#XYZ", &json!(true));

    let datagram = engine.recv().expect("touch datagram");
    assert_eq!(datagram.address, "/unity/touching");
    assert_eq!(datagram.args, vec![OscArg::from("XYZ"), OscArg::from("true")]);
}

#[test]
fn test_forced_color_collision_is_perturbed() {
    // Arrange
    let engine = Engine::bind();
    let core = make_core(&engine, AlwaysFirst);

    // Act
    core.remote_connected("/remotes#A");
    core.remote_connected("/remotes#B");

    // Assert
    let snapshot = core.snapshot();
    let a = &snapshot.get(&RemoteId::new("A")).unwrap().0;
    let b = &snapshot.get(&RemoteId::new("B")).unwrap().0;
    assert_ne!(a, b);
    let mut expected: Vec<char> = a.as_str().chars().collect();
    expected[1] = '0';
    assert_eq!(*b, DisplayColor::new(expected.into_iter().collect::<String>()));
}

#[test]
fn test_idle_ticks_accumulate_until_position() {
    let engine = Engine::bind();
    let core = make_core(&engine, SeededRandom::new(11));
    core.remote_connected("/remotes#R1");

    for _ in 0..3 {
        core.tick_idle();
    }
    assert_eq!(core.snapshot().get(&RemoteId::new("R1")).unwrap().1, 3);

    core.remote_position("/remotes#R1", json!([0.5, 0.5]));
    assert_eq!(core.snapshot().get(&RemoteId::new("R1")).unwrap().1, 0);
}

#[test]
fn test_late_screen_is_initialized_with_live_remotes() {
    let engine = Engine::bind();
    let core = make_core(&engine, SeededRandom::new(11));
    core.remote_connected("/remotes#R2");
    core.remote_connected("/remotes#R1");
    core.remote_connected("/remotes#R3");
    core.remote_disconnected("/remotes#R3");

    let (_, mut screen) = core.screen_connected();

    assert_eq!(
        drain(&mut screen),
        vec![ScreenEvent::Initialize {
            remote_ids: vec!["/remotes#R1".into(), "/remotes#R2".into()],
            address: "192.168.1.20:8443".into(),
        }]
    );
}

#[test]
fn test_snapshot_serializes_to_id_color_ticks() {
    let engine = Engine::bind();
    let core = make_core(&engine, AlwaysFirst);
    core.remote_connected("/remotes#R1");
    core.tick_idle();

    let value = serde_json::to_value(core.snapshot()).unwrap();

    let entry = &value["R1"];
    assert!(entry[0].as_str().unwrap().starts_with('#'));
    assert_eq!(entry[1], json!(1));
}
