//! Game events and their two external representations.
//!
//! Events arrive either from a JSON events file (the `report` command) or
//! as the text body of a MESSAGE frame published by another user. Both
//! decode into the same immutable [`GameEvent`].

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EventParseError, EventsFileError};

/// Key/value updates carried by an event. Keys are unique; the last write wins.
pub type Updates = BTreeMap<String, String>;

/// Identifies a game's channel and its report bucket: `teamA_teamB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameKey(String);

impl GameKey {
    pub fn new(team_a: &str, team_b: &str) -> Self {
        Self(format!("{team_a}_{team_b}"))
    }

    /// Derive the key from a destination header: everything after the last `/`.
    pub fn from_destination(destination: &str) -> Self {
        let name = destination
            .rsplit_once('/')
            .map_or(destination, |(_, name)| name);
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameKey {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for GameKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for GameKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One timestamped game update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub team_a: String,
    pub team_b: String,
    pub name: String,
    pub time: i64,
    pub general_updates: Updates,
    pub team_a_updates: Updates,
    pub team_b_updates: Updates,
    pub description: String,
}

// Body field labels.
const USER: &str = "user";
const TEAM_A: &str = "team a";
const TEAM_B: &str = "team b";
const EVENT_NAME: &str = "event name";
const TIME: &str = "time";
const GENERAL_UPDATES: &str = "general game updates";
const TEAM_A_UPDATES: &str = "team a updates";
const TEAM_B_UPDATES: &str = "team b updates";
const DESCRIPTION: &str = "description";

#[derive(Clone, Copy)]
enum Section {
    Fields,
    General,
    TeamA,
    TeamB,
}

impl GameEvent {
    pub fn game_key(&self) -> GameKey {
        GameKey::new(&self.team_a, &self.team_b)
    }

    /// Render the SEND body published for this event on behalf of `user`.
    pub fn to_body(&self, user: &str) -> String {
        let mut body = String::new();
        push_field(&mut body, USER, user);
        push_field(&mut body, TEAM_A, &self.team_a);
        push_field(&mut body, TEAM_B, &self.team_b);
        push_field(&mut body, EVENT_NAME, &self.name);
        push_field(&mut body, TIME, &self.time.to_string());
        push_updates(&mut body, GENERAL_UPDATES, &self.general_updates);
        push_updates(&mut body, TEAM_A_UPDATES, &self.team_a_updates);
        push_updates(&mut body, TEAM_B_UPDATES, &self.team_b_updates);
        body.push_str(DESCRIPTION);
        body.push_str(":\n");
        body.push_str(&self.description);
        body.push('\n');
        body
    }

    /// Decode an event from a MESSAGE body in the layout [`GameEvent::to_body`]
    /// writes. The `user` line is informational; callers take the reporting
    /// user from the frame header.
    pub fn parse_body(body: &str) -> Result<GameEvent, EventParseError> {
        let mut team_a = None;
        let mut team_b = None;
        let mut name = None;
        let mut time = None;
        let mut general_updates = Updates::new();
        let mut team_a_updates = Updates::new();
        let mut team_b_updates = Updates::new();
        let mut description = None;

        let mut section = Section::Fields;
        let mut lines = body.split('\n');
        while let Some(raw) = lines.next() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with(['\t', ' ']) {
                let target = match section {
                    Section::General => Some(&mut general_updates),
                    Section::TeamA => Some(&mut team_a_updates),
                    Section::TeamB => Some(&mut team_b_updates),
                    Section::Fields => None,
                };
                if let Some(target) = target {
                    if let Some((key, value)) = split_update(line) {
                        target.insert(key.to_string(), value.to_string());
                    }
                    continue;
                }
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            section = Section::Fields;
            match key {
                USER => {}
                TEAM_A => team_a = Some(value.to_string()),
                TEAM_B => team_b = Some(value.to_string()),
                EVENT_NAME => name = Some(value.to_string()),
                TIME => time = Some(value.to_string()),
                GENERAL_UPDATES => section = Section::General,
                TEAM_A_UPDATES => section = Section::TeamA,
                TEAM_B_UPDATES => section = Section::TeamB,
                DESCRIPTION => {
                    let rest: Vec<&str> = lines.by_ref().collect();
                    let mut text = rest.join("\n");
                    if text.ends_with('\n') {
                        text.pop();
                    }
                    if !value.is_empty() {
                        text = if text.is_empty() {
                            value.to_string()
                        } else {
                            format!("{value}\n{text}")
                        };
                    }
                    description = Some(text);
                }
                _ => {}
            }
        }

        let time = time.ok_or(EventParseError::MissingField(TIME))?;
        let time = time
            .parse::<i64>()
            .map_err(|_| EventParseError::InvalidTime(time.clone()))?;

        Ok(GameEvent {
            team_a: team_a.ok_or(EventParseError::MissingField(TEAM_A))?,
            team_b: team_b.ok_or(EventParseError::MissingField(TEAM_B))?,
            name: name.ok_or(EventParseError::MissingField(EVENT_NAME))?,
            time,
            general_updates,
            team_a_updates,
            team_b_updates,
            description: description.unwrap_or_default(),
        })
    }
}

fn push_field(body: &mut String, label: &str, value: &str) {
    body.push_str(label);
    body.push_str(": ");
    body.push_str(value);
    body.push('\n');
}

/// Split an indented `\t<key>: <value>` line. Only the tab indent is removed,
/// so keys and values keep their own whitespace. Keys may contain `:` but
/// not `": "`.
fn split_update(line: &str) -> Option<(&str, &str)> {
    let line = match line.strip_prefix('\t') {
        Some(rest) => rest,
        None => line.trim_start(),
    };
    line.split_once(": ")
        .or_else(|| line.split_once(':'))
}

fn push_updates(body: &mut String, label: &str, updates: &Updates) {
    body.push_str(label);
    body.push_str(":\n");
    for (key, value) in updates {
        body.push('\t');
        body.push_str(key);
        body.push_str(": ");
        body.push_str(value);
        body.push('\n');
    }
}

/// The parsed contents of a `report` events file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsFile {
    pub team_a: String,
    pub team_b: String,
    /// Events in file order.
    pub events: Vec<GameEvent>,
}

impl EventsFile {
    pub fn game_key(&self) -> GameKey {
        GameKey::new(&self.team_a, &self.team_b)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EventsFileError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| EventsFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data).map_err(|source| EventsFileError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let raw: RawEventsFile = serde_json::from_str(data)?;
        let events = raw
            .events
            .into_iter()
            .map(|event| GameEvent {
                team_a: raw.team_a.clone(),
                team_b: raw.team_b.clone(),
                name: event.name,
                time: event.time,
                general_updates: stringify(event.general_updates),
                team_a_updates: stringify(event.team_a_updates),
                team_b_updates: stringify(event.team_b_updates),
                description: event.description,
            })
            .collect();

        Ok(Self {
            team_a: raw.team_a,
            team_b: raw.team_b,
            events,
        })
    }
}

#[derive(Deserialize)]
struct RawEventsFile {
    #[serde(rename = "team a")]
    team_a: String,
    #[serde(rename = "team b")]
    team_b: String,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "event name")]
    name: String,
    time: i64,
    #[serde(rename = "general game updates", default)]
    general_updates: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "team a updates", default)]
    team_a_updates: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "team b updates", default)]
    team_b_updates: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    description: String,
}

fn stringify(values: BTreeMap<String, serde_json::Value>) -> Updates {
    values
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}
