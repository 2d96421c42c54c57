//! Per-game, per-user event storage.

use std::collections::HashMap;

use crate::event::{GameEvent, GameKey};

/// game → user → events in arrival order.
///
/// Buckets are created on first insert and never removed.
#[derive(Debug, Default)]
pub struct EventStore {
    games: HashMap<GameKey, HashMap<String, Vec<GameEvent>>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, game: GameKey, user: &str, event: GameEvent) {
        self.games
            .entry(game)
            .or_default()
            .entry(user.to_string())
            .or_default()
            .push(event);
    }

    /// Events `user` reported for `game`, in arrival order.
    pub fn events(&self, game: &str, user: &str) -> Option<&[GameEvent]> {
        self.games
            .get(game)
            .and_then(|users| users.get(user))
            .map(Vec::as_slice)
    }

    /// Users with at least one event for `game`, sorted.
    pub fn reporters(&self, game: &str) -> Vec<&str> {
        let mut users: Vec<&str> = self
            .games
            .get(game)
            .map(|users| users.keys().map(String::as_str).collect())
            .unwrap_or_default();
        users.sort_unstable();
        users
    }
}
