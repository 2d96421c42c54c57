//! Receipt correlation.

use std::collections::HashMap;
use std::fmt;

/// Correlation id attached to a frame that expects a RECEIPT.
pub type ReceiptId = u64;

/// What a pending receipt acknowledges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Joined(String),
    Exited(String),
    /// Acknowledging this ends the session.
    Disconnect,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingAction::Joined(channel) => write!(f, "Joined channel {channel}"),
            PendingAction::Exited(channel) => write!(f, "Exited channel {channel}"),
            PendingAction::Disconnect => f.write_str("DISCONNECT"),
        }
    }
}

/// Pending receipts keyed by id. Each entry is consumed at most once.
#[derive(Debug, Default)]
pub struct ReceiptTracker {
    next_id: ReceiptId,
    pending: HashMap<ReceiptId, PendingAction>,
}

impl ReceiptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, action: PendingAction) -> ReceiptId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, action);
        id
    }

    /// Remove and return the action for `id`. Unknown ids yield `None`.
    pub fn resolve(&mut self, id: ReceiptId) -> Option<PendingAction> {
        self.pending.remove(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
