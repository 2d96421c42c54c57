//! Game summary rendering.
//!
//! A summary folds one user's events for one game into aggregated stats and
//! a chronological list of event reports:
//!
//! ```text
//! Germany vs Japan
//! Game stats:
//! General stats:
//! active: true
//! Germany stats:
//! goals: 1
//! Japan stats:
//! Game event reports:
//! 1980 - goal!!!!:
//!
//! GOOOAAALLL!!!
//!
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::ProtocolError;
use crate::event::{GameEvent, Updates};

const FALLBACK_TEAM_A: &str = "Team A";
const FALLBACK_TEAM_B: &str = "Team B";

/// Aggregated view of an event sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    team_a: String,
    team_b: String,
    general: Updates,
    team_a_stats: Updates,
    team_b_stats: Updates,
    /// Sorted by time; ties keep arrival order.
    events: Vec<GameEvent>,
}

impl Summary {
    pub fn build(events: &[GameEvent]) -> Self {
        let mut sorted = events.to_vec();
        // stable: equal times keep arrival order
        sorted.sort_by_key(|event| event.time);

        let mut general = Updates::new();
        let mut team_a_stats = Updates::new();
        let mut team_b_stats = Updates::new();
        for event in &sorted {
            fold(&mut general, &event.general_updates);
            fold(&mut team_a_stats, &event.team_a_updates);
            fold(&mut team_b_stats, &event.team_b_updates);
        }

        let (team_a, team_b) = match sorted.first() {
            Some(first) => (first.team_a.clone(), first.team_b.clone()),
            None => (FALLBACK_TEAM_A.to_string(), FALLBACK_TEAM_B.to_string()),
        };

        Self {
            team_a,
            team_b,
            general,
            team_a_stats,
            team_b_stats,
            events: sorted,
        }
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn general_stats(&self) -> &Updates {
        &self.general
    }

    pub fn team_a_stats(&self) -> &Updates {
        &self.team_a_stats
    }

    pub fn team_b_stats(&self) -> &Updates {
        &self.team_b_stats
    }

    /// Write the rendered summary to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), ProtocolError> {
        fs::write(path, self.to_string()).map_err(|source| ProtocolError::SummaryWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn fold(acc: &mut Updates, updates: &Updates) {
    for (key, value) in updates {
        acc.insert(key.clone(), value.clone());
    }
}

fn write_stats(f: &mut fmt::Formatter<'_>, stats: &Updates) -> fmt::Result {
    for (key, value) in stats {
        writeln!(f, "{key}: {value}")?;
    }
    Ok(())
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} vs {}", self.team_a, self.team_b)?;
        writeln!(f, "Game stats:")?;
        writeln!(f, "General stats:")?;
        write_stats(f, &self.general)?;
        writeln!(f, "{} stats:", self.team_a)?;
        write_stats(f, &self.team_a_stats)?;
        writeln!(f, "{} stats:", self.team_b)?;
        write_stats(f, &self.team_b_stats)?;
        writeln!(f, "Game event reports:")?;
        for event in &self.events {
            writeln!(f, "{} - {}:", event.time, event.name)?;
            writeln!(f)?;
            writeln!(f, "{}", event.description)?;
            writeln!(f)?;
        }
        Ok(())
    }
}
