//! Testing utilities for matchday.
//!
//! - [`EventBuilder`] / [`events_file_json`]: game events without JSON noise
//! - [`MemoryConnector`] + [`ServerEnd`]: an in-process broker connection
//! - [`RecordingConsole`]: captures what the driver would print

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use matchday::{Frame, GameEvent, Updates};
use matchday_client::{Connector, Console, FrameSink, FrameSource};
use tokio::sync::mpsc;

// ============================================================================
// Events
// ============================================================================

/// Builder for [`GameEvent`] values.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event: GameEvent,
}

impl EventBuilder {
    pub fn new(team_a: &str, team_b: &str) -> Self {
        Self {
            event: GameEvent {
                team_a: team_a.to_string(),
                team_b: team_b.to_string(),
                name: "event".to_string(),
                time: 0,
                general_updates: Updates::new(),
                team_a_updates: Updates::new(),
                team_b_updates: Updates::new(),
                description: String::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.event.name = name.to_string();
        self
    }

    pub fn time(mut self, time: i64) -> Self {
        self.event.time = time;
        self
    }

    pub fn general(mut self, key: &str, value: &str) -> Self {
        self.event
            .general_updates
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn team_a(mut self, key: &str, value: &str) -> Self {
        self.event
            .team_a_updates
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn team_b(mut self, key: &str, value: &str) -> Self {
        self.event
            .team_b_updates
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.event.description = description.to_string();
        self
    }

    pub fn build(self) -> GameEvent {
        self.event
    }
}

/// Render events as a `report` events file. All events must share teams.
pub fn events_file_json(events: &[GameEvent]) -> String {
    let (team_a, team_b) = events
        .first()
        .map(|e| (e.team_a.as_str(), e.team_b.as_str()))
        .unwrap_or(("Team A", "Team B"));

    let events: Vec<serde_json::Value> = events
        .iter()
        .map(|e| {
            serde_json::json!({
                "event name": e.name,
                "time": e.time,
                "general game updates": e.general_updates,
                "team a updates": e.team_a_updates,
                "team b updates": e.team_b_updates,
                "description": e.description,
            })
        })
        .collect();

    serde_json::json!({
        "team a": team_a,
        "team b": team_b,
        "events": events,
    })
    .to_string()
}

/// A MESSAGE frame as the broker would deliver `event` published by `user`.
pub fn message_frame(destination: &str, user: &str, event: &GameEvent) -> String {
    Frame::new(matchday::Verb::Message)
        .header("subscription", 0)
        .header("message-id", 0)
        .header("destination", destination)
        .header("user", user)
        .body(event.to_body(user))
        .encode()
}

// ============================================================================
// Transport
// ============================================================================

/// Client half of an in-memory connection: frames the server sends.
pub struct MemoryFrameSource {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl FrameSource for MemoryFrameSource {
    async fn recv_frame(&mut self) -> Result<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

/// Client half of an in-memory connection: frames the client sends.
pub struct MemoryFrameSink {
    tx: mpsc::UnboundedSender<Frame>,
}

#[async_trait]
impl FrameSink for MemoryFrameSink {
    async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.tx
            .send(frame.clone())
            .map_err(|_| anyhow!("server end closed"))
    }
}

/// The broker's side of an in-memory connection.
pub struct ServerEnd {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<Frame>,
}

impl ServerEnd {
    /// Deliver a raw frame to the client.
    pub fn send(&self, raw: impl Into<String>) {
        // client gone is fine for tests
        let _ = self.to_client.send(raw.into());
    }

    /// Next frame the client sent, or `None` once the client dropped its sink.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_client.recv().await
    }

    /// Frames already sent by the client, without waiting.
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

/// Create a connected source/sink pair and the server end that drives it.
pub fn memory_connection() -> (MemoryFrameSource, MemoryFrameSink, ServerEnd) {
    let (to_client, rx) = mpsc::unbounded_channel();
    let (tx, from_client) = mpsc::unbounded_channel();
    (
        MemoryFrameSource { rx },
        MemoryFrameSink { tx },
        ServerEnd {
            to_client,
            from_client,
        },
    )
}

/// Connector that hands out pre-accepted in-memory connections in order.
/// With none queued, `connect` fails like a refused TCP connection.
#[derive(Default)]
pub struct MemoryConnector {
    pending: Mutex<VecDeque<(MemoryFrameSource, MemoryFrameSink)>>,
    attempts: Mutex<Vec<String>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a connection for the next `connect` call.
    pub fn accept_next(&self) -> ServerEnd {
        let (source, sink, server) = memory_connection();
        self.pending
            .lock()
            .unwrap()
            .push_back((source, sink));
        server
    }

    /// Addresses passed to `connect`, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Source = MemoryFrameSource;
    type Sink = MemoryFrameSink;

    async fn connect(&self, addr: &str) -> Result<(MemoryFrameSource, MemoryFrameSink)> {
        self.attempts.lock().unwrap().push(addr.to_string());
        self.pending
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("connection refused: {addr}"))
    }
}

// ============================================================================
// Console
// ============================================================================

/// Console that records every printed line. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsole {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl Console for RecordingConsole {
    fn print(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
