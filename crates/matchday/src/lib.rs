//! # Matchday
//!
//! A client-side STOMP protocol engine for live game reporting. Users join a
//! game's channel, publish events from a file, receive events other users
//! publish, and render per-user game summaries.
//!
//! ## Core Concepts
//!
//! The engine separates **what the user asked for** from **what the server
//! told us**:
//! - [`UserCommand`] = Intent (a command line, turned into outgoing frames)
//! - [`Reception`] = Facts (a decoded server frame and what it changed)
//!
//! The engine performs no network I/O. It returns frames for a transport to
//! send and consumes raw frames a transport received. The only files it
//! touches are the `report` input and the `summary` output.
//!
//! ## Architecture
//!
//! ```text
//! Command thread                         Transport reader thread
//!     │                                           │
//!     ▼ process_input(line)                       ▼ process_frame(raw)
//! StompProtocol ───────────────────────────── StompProtocol
//!     │                                           │
//!     ├─► SubscriptionRegistry  (join / exit)     ├─► ReceiptTracker (RECEIPT)
//!     ├─► ReceiptTracker        (join / exit /    ├─► EventStore     (MESSAGE)
//!     │                          logout)          └─► RunFlag.stop() (ERROR,
//!     ├─► EventStore            (report)                  DISCONNECT receipt)
//!     └─► Summary               (summary)
//!     │
//!     ▼ Outgoing frames
//! Transport.send()
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Ids only move forward** - Subscription and receipt ids are never reused
//!    within a session
//! 2. **One subscription per channel** - Joining again replaces the id
//! 3. **Receipts resolve once** - Unknown or repeated receipt ids are ignored
//! 4. **Arrival order is kept** - Each (game, user) bucket is append-only
//! 5. **Own events are stored once** - By `report`, never by MESSAGE echo
//! 6. **One lock** - Registry, tracker and store share one mutex, never held
//!    across I/O
//!
//! ## Example
//!
//! ```ignore
//! use matchday::{RunFlag, StompProtocol};
//!
//! let running = RunFlag::new(false);
//! let protocol = StompProtocol::new(running.clone());
//!
//! // the driver sends CONNECT and reads the reply
//! transport.send(&protocol.connect_frame("meni", "films"))?;
//! protocol.process_frame(&transport.recv()?);
//! running.start();
//! protocol.set_username("meni");
//!
//! for frame in protocol.process_input("join germany_japan")? {
//!     transport.send(&frame)?;
//! }
//! ```

mod command;
mod config;
mod error;
mod event;
mod flag;
mod frame;
mod protocol;
mod receipt;
mod store;
mod subscription;
mod summary;

// Re-export the engine
pub use protocol::{Ingest, Outgoing, Reception, StompProtocol};

// Re-export wire types
pub use frame::{Frame, Headers, UnknownVerb, Verb, FRAME_TERMINATOR};

// Re-export domain types
pub use event::{EventsFile, GameEvent, GameKey, Updates};
pub use store::EventStore;
pub use summary::Summary;

// Re-export bookkeeping types
pub use receipt::{PendingAction, ReceiptId, ReceiptTracker};
pub use subscription::{SubscriptionId, SubscriptionRegistry};

// Re-export command, config and signal types
pub use command::UserCommand;
pub use config::ProtocolConfig;
pub use flag::RunFlag;

// Re-export error types
pub use error::{CommandError, ConfigError, EventParseError, EventsFileError, ProtocolError};
