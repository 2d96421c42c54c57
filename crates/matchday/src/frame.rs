//! STOMP frame codec.
//!
//! A frame is a command line, zero or more `key:value` header lines, a blank
//! line, the body, and a single NUL terminator. Nothing is escaped.
//!
//! Decoding is total: malformed header lines are skipped, a missing blank
//! line yields an empty body, and only an input with no command line at all
//! fails to produce a [`Frame`].

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

/// Byte that terminates every frame on the wire.
pub const FRAME_TERMINATOR: char = '\0';

/// Header pairs in wire order. Most frames carry three or fewer.
pub type Headers = SmallVec<[(String, String); 4]>;

/// The protocol verbs this client speaks or understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Connect => "CONNECT",
            Verb::Connected => "CONNECTED",
            Verb::Subscribe => "SUBSCRIBE",
            Verb::Unsubscribe => "UNSUBSCRIBE",
            Verb::Send => "SEND",
            Verb::Message => "MESSAGE",
            Verb::Receipt => "RECEIPT",
            Verb::Error => "ERROR",
            Verb::Disconnect => "DISCONNECT",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a command line names no known verb.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verb: {0}")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONNECT" => Verb::Connect,
            "CONNECTED" => Verb::Connected,
            "SUBSCRIBE" => Verb::Subscribe,
            "UNSUBSCRIBE" => Verb::Unsubscribe,
            "SEND" => Verb::Send,
            "MESSAGE" => Verb::Message,
            "RECEIPT" => Verb::Receipt,
            "ERROR" => Verb::Error,
            "DISCONNECT" => Verb::Disconnect,
            other => return Err(UnknownVerb(other.to_string())),
        })
    }
}

/// One protocol message.
///
/// The command is kept as text so frames with verbs outside [`Verb`] can
/// still be decoded and then ignored by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: String,
    headers: Headers,
    body: String,
}

impl Frame {
    pub fn new(verb: Verb) -> Self {
        Self {
            command: verb.as_str().to_string(),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Append a header. Headers are written in the order they are added.
    pub fn header(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((key.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// The parsed verb, or `None` for commands this client does not know.
    pub fn verb(&self) -> Option<Verb> {
        self.command.parse().ok()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header value. When a key repeats, the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> &str {
        &self.body
    }

    /// Render the wire form, including the trailing NUL.
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(
            self.command.len()
                + self
                    .headers
                    .iter()
                    .map(|(k, v)| k.len() + v.len() + 2)
                    .sum::<usize>()
                + self.body.len()
                + 3,
        );
        out.push_str(&self.command);
        out.push('\n');
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(FRAME_TERMINATOR);
        out
    }

    /// Decode a raw frame.
    ///
    /// Returns `None` only when there is no command line to read. The
    /// trailing terminator is optional.
    pub fn decode(raw: &str) -> Option<Frame> {
        let raw = raw.strip_suffix(FRAME_TERMINATOR).unwrap_or(raw);
        if raw.is_empty() {
            return None;
        }

        let (command, mut rest) = split_line(raw);
        let command = command.trim_end_matches('\r');
        if command.is_empty() {
            return None;
        }

        let mut headers = Headers::new();
        let mut body = "";
        while let Some(remaining) = rest {
            let (line, next) = split_line(remaining);
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                body = next.unwrap_or("");
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.to_string(), value.to_string()));
            }
            rest = next;
        }

        Some(Frame {
            command: command.to_string(),
            headers,
            body: body.to_string(),
        })
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = self.encode();
        f.write_str(encoded.trim_end_matches(FRAME_TERMINATOR))
    }
}

/// Split off the first line. The second half is `None` when no newline exists.
fn split_line(s: &str) -> (&str, Option<&str>) {
    match s.split_once('\n') {
        Some((line, rest)) => (line, Some(rest)),
        None => (s, None),
    }
}
