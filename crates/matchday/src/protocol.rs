//! Control and dispatch.
//!
//! [`StompProtocol`] is shared between the command thread and the transport
//! reader thread. Every method takes `&self`; all mutable state sits behind a
//! single mutex that is held for one map read or mutation sequence at a time
//! and never across I/O.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::command::UserCommand;
use crate::config::ProtocolConfig;
use crate::error::ProtocolError;
use crate::event::{EventsFile, GameEvent, GameKey};
use crate::flag::RunFlag;
use crate::frame::{Frame, Verb};
use crate::receipt::{PendingAction, ReceiptId, ReceiptTracker};
use crate::store::EventStore;
use crate::subscription::{SubscriptionId, SubscriptionRegistry};
use crate::summary::Summary;

/// Frames produced by one user command, in send order.
pub type Outgoing = SmallVec<[Frame; 1]>;

/// What a server frame meant for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reception {
    /// Handshake accepted.
    Connected { version: Option<String> },
    /// The server rejected something. The session is over.
    Error { message: String, body: String },
    /// A receipt arrived. `action` is `None` for ids this session never issued.
    Receipt {
        id: ReceiptId,
        action: Option<PendingAction>,
    },
    /// A published event for `game` by `user`.
    Message {
        game: GameKey,
        user: String,
        outcome: Ingest,
    },
    /// Unknown verb or unreadable frame.
    Ignored,
}

/// Result of ingesting a MESSAGE body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Stored,
    /// Published by this session's own user; already stored by `report`.
    OwnEcho,
    /// The body did not decode as an event and was dropped.
    Malformed,
}

#[derive(Debug, Default)]
struct SessionState {
    username: Option<String>,
    subscriptions: SubscriptionRegistry,
    receipts: ReceiptTracker,
    store: EventStore,
}

/// Client-side protocol engine.
#[derive(Debug)]
pub struct StompProtocol {
    config: ProtocolConfig,
    running: RunFlag,
    state: Mutex<SessionState>,
    dropped: AtomicU64,
}

impl StompProtocol {
    pub fn new(running: RunFlag) -> Self {
        Self::with_config(ProtocolConfig::default(), running)
    }

    pub fn with_config(config: ProtocolConfig, running: RunFlag) -> Self {
        Self {
            config,
            running,
            state: Mutex::new(SessionState::default()),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn running(&self) -> &RunFlag {
        &self.running
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // every critical section leaves the state consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn username(&self) -> Option<String> {
        self.state().username.clone()
    }

    pub fn set_username(&self, username: impl Into<String>) {
        let username = username.into();
        info!(user = %username, "session user set");
        self.state().username = Some(username);
    }

    /// Active subscription id for `game`, if joined.
    pub fn subscription(&self, game: &str) -> Option<SubscriptionId> {
        self.state().subscriptions.get(game)
    }

    pub fn pending_receipts(&self) -> usize {
        self.state().receipts.pending_count()
    }

    /// MESSAGE frames discarded because their body did not decode.
    pub fn dropped_messages(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Build the CONNECT frame for a login attempt.
    pub fn connect_frame(&self, username: &str, password: &str) -> Frame {
        Frame::new(Verb::Connect)
            .header("accept-version", &self.config.accept_version)
            .header("host", &self.config.host)
            .header("login", username)
            .header("passcode", password)
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Interpret one user command line.
    ///
    /// Unrecognized verbs produce no frames and no error.
    pub fn process_input(&self, line: &str) -> Result<Outgoing, ProtocolError> {
        match UserCommand::parse(line)? {
            Some(command) => self.execute(command),
            None => {
                debug!(line, "ignoring unrecognized command");
                Ok(Outgoing::new())
            }
        }
    }

    pub fn execute(&self, command: UserCommand) -> Result<Outgoing, ProtocolError> {
        match command {
            UserCommand::Login { username, .. } => {
                self.set_username(username);
                Ok(Outgoing::new())
            }
            UserCommand::Join { game } => {
                self.ensure_open()?;
                Ok(smallvec::smallvec![self.join(&game)])
            }
            UserCommand::Exit { game } => {
                self.ensure_open()?;
                Ok(self.exit(&game).into_iter().collect())
            }
            UserCommand::Logout => {
                self.ensure_open()?;
                Ok(smallvec::smallvec![self.logout()])
            }
            UserCommand::Report { path } => {
                self.ensure_open()?;
                self.report(&path)
            }
            UserCommand::Summary { game, user, output } => {
                self.write_summary(&game, &user, &output)?;
                Ok(Outgoing::new())
            }
        }
    }

    fn ensure_open(&self) -> Result<(), ProtocolError> {
        if self.running.is_running() {
            Ok(())
        } else {
            Err(ProtocolError::SessionClosed)
        }
    }

    /// Subscribe to `game`'s channel.
    pub fn join(&self, game: &str) -> Frame {
        let (subscription_id, receipt_id) = {
            let mut state = self.state();
            let (subscription_id, replaced) = state.subscriptions.subscribe(game);
            if let Some(previous) = replaced {
                warn!(game, previous, subscription_id, "rejoined an active channel");
            }
            let receipt_id = state
                .receipts
                .issue(PendingAction::Joined(game.to_string()));
            (subscription_id, receipt_id)
        };
        debug!(game, subscription_id, receipt_id, "subscribing");

        Frame::new(Verb::Subscribe)
            .header("destination", self.config.destination(game))
            .header("id", subscription_id)
            .header("receipt", receipt_id)
    }

    /// Unsubscribe from `game`. Returns `None` when not subscribed.
    ///
    /// The subscription is released immediately, before the receipt arrives.
    pub fn exit(&self, game: &str) -> Option<Frame> {
        let (subscription_id, receipt_id) = {
            let mut state = self.state();
            let subscription_id = state.subscriptions.unsubscribe(game)?;
            let receipt_id = state
                .receipts
                .issue(PendingAction::Exited(game.to_string()));
            (subscription_id, receipt_id)
        };
        debug!(game, subscription_id, receipt_id, "unsubscribing");

        Some(
            Frame::new(Verb::Unsubscribe)
                .header("id", subscription_id)
                .header("receipt", receipt_id),
        )
    }

    pub fn logout(&self) -> Frame {
        let receipt_id = self.state().receipts.issue(PendingAction::Disconnect);
        debug!(receipt_id, "disconnecting");
        Frame::new(Verb::Disconnect).header("receipt", receipt_id)
    }

    /// Load an events file and publish every event in file order.
    pub fn report(&self, path: &Path) -> Result<Outgoing, ProtocolError> {
        let file = EventsFile::load(path)?;
        self.report_events(file)
    }

    /// Store each event under this session's user and build one SEND per event.
    ///
    /// Frames mirror input order; events are not sorted here.
    pub fn report_events(&self, file: EventsFile) -> Result<Outgoing, ProtocolError> {
        let user = self.username().ok_or(ProtocolError::NotLoggedIn)?;
        let game = file.game_key();
        let destination = self.config.destination(game.as_str());

        let mut frames = Outgoing::with_capacity(file.events.len());
        for event in file.events {
            let frame = Frame::new(Verb::Send)
                .header("destination", &destination)
                .header("user", &user)
                .body(event.to_body(&user));
            self.state().store.append(game.clone(), &user, event);
            frames.push(frame);
        }
        info!(game = %game, events = frames.len(), "reported events");
        Ok(frames)
    }

    // ------------------------------------------------------------------
    // Summaries
    // ------------------------------------------------------------------

    /// Summarize `user`'s events for `game`, or `None` if there are none.
    pub fn render_summary(&self, game: &str, user: &str) -> Option<Summary> {
        let events = self.state().store.events(game, user)?.to_vec();
        Some(Summary::build(&events))
    }

    /// Users with stored events for `game`, sorted.
    pub fn reporters(&self, game: &str) -> Vec<String> {
        self.state()
            .store
            .reporters(game)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Write the summary to `output`. Returns `false`, writing nothing, when
    /// no events exist for the game and user.
    pub fn write_summary(
        &self,
        game: &str,
        user: &str,
        output: &Path,
    ) -> Result<bool, ProtocolError> {
        let Some(summary) = self.render_summary(game, user) else {
            debug!(game, user, "no events to summarize");
            return Ok(false);
        };
        summary.write_to(output)?;
        info!(game, user, output = %output.display(), "summary written");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Server frames
    // ------------------------------------------------------------------

    /// Decode and handle one raw server frame.
    pub fn process_frame(&self, raw: &str) -> Reception {
        match Frame::decode(raw) {
            Some(frame) => self.handle_frame(&frame),
            None => Reception::Ignored,
        }
    }

    pub fn handle_frame(&self, frame: &Frame) -> Reception {
        match frame.verb() {
            Some(Verb::Connected) => {
                info!(version = ?frame.get("version"), "login successful");
                Reception::Connected {
                    version: frame.get("version").map(str::to_string),
                }
            }
            Some(Verb::Error) => {
                let message = frame.get("message").unwrap_or_default().to_string();
                warn!(message = %message, "server error, closing session");
                self.running.stop();
                Reception::Error {
                    message,
                    body: frame.body_text().to_string(),
                }
            }
            Some(Verb::Receipt) => match frame
                .get("receipt-id")
                .and_then(|id| id.trim().parse::<ReceiptId>().ok())
            {
                Some(id) => Reception::Receipt {
                    id,
                    action: self.resolve_receipt(id),
                },
                None => {
                    debug!("receipt without a usable receipt-id");
                    Reception::Ignored
                }
            },
            Some(Verb::Message) => {
                let destination = frame.get("destination").unwrap_or_default();
                let user = frame.get("user").unwrap_or_default();
                Reception::Message {
                    game: GameKey::from_destination(destination),
                    user: user.to_string(),
                    outcome: self.ingest_message(destination, user, frame.body_text()),
                }
            }
            _ => {
                debug!(command = frame.command(), "ignoring frame");
                Reception::Ignored
            }
        }
    }

    /// Consume a pending receipt. Resolving the DISCONNECT receipt stops the
    /// session. Unknown ids resolve to `None`.
    pub fn resolve_receipt(&self, id: ReceiptId) -> Option<PendingAction> {
        let action = self.state().receipts.resolve(id);
        match &action {
            Some(PendingAction::Disconnect) => {
                info!(receipt_id = id, "disconnect acknowledged");
                self.running.stop();
            }
            Some(action) => debug!(receipt_id = id, %action, "receipt resolved"),
            None => debug!(receipt_id = id, "unknown receipt"),
        }
        action
    }

    /// Store an event published by another user.
    ///
    /// The session's own events come back from the broker too; those were
    /// stored by [`report_events`](Self::report_events) and are skipped.
    /// Bodies that do not decode are dropped without surfacing an error.
    pub fn ingest_message(&self, destination: &str, user: &str, body: &str) -> Ingest {
        let game = GameKey::from_destination(destination);
        if self.state().username.as_deref() == Some(user) {
            return Ingest::OwnEcho;
        }

        match GameEvent::parse_body(body) {
            Ok(event) => {
                self.state().store.append(game, user, event);
                Ingest::Stored
            }
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(game = %game, user, error = %err, "dropping malformed event");
                Ingest::Malformed
            }
        }
    }
}
