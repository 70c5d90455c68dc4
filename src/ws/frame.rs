//! STOMP 1.2 text frames as sent by the browser client over the `/ws` socket.
//!
//! ```text
//! COMMAND
//! header:value
//!
//! body^@
//! ```
//!
//! Header escaping (`\c`, `\n`, `\\`) is not decoded; the client never sends
//! escaped values.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    Stomp,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
    Other(String),
}

impl Command {
    pub fn parse(s: &str) -> Self {
        match s {
            "CONNECT" => Self::Connect,
            "STOMP" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Other(other) => other,
        }
    }

    /// `CONNECT` and its STOMP 1.2 alias `STOMP` both open a session.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect | Self::Stomp)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Command::Error).with_header("message", message)
    }

    /// First value of `name` (repeated headers: the first one wins).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `RECEIPT` answering this frame's `receipt` header, if it asked for one.
    pub fn receipt(&self) -> Option<Frame> {
        self.header("receipt")
            .map(|id| Frame::new(Command::Receipt).with_header("receipt-id", id))
    }

    /// Parses the first frame of `text` only.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        Self::parse_prefix(text).map(|(frame, _)| frame)
    }

    /// Parses the first frame of `text` and hands back what follows its NUL
    /// terminator. Browsers may pack several frames into one WebSocket message.
    pub fn parse_prefix(text: &str) -> Result<(Self, &str), FrameError> {
        // leading EOLs are heart-beats
        let text = text.trim_start_matches(['\r', '\n']);
        let (text, rest) = match text.find('\0') {
            Some(end) => (&text[..end], &text[end + 1..]),
            None => (text, ""),
        };

        Ok((Self::parse_one(text)?, rest))
    }

    fn parse_one(text: &str) -> Result<Self, FrameError> {
        let mut head = Vec::new();
        let mut rest = text;
        let body = loop {
            let Some(idx) = rest.find('\n') else {
                let line = rest.trim_end_matches('\r');
                if !line.is_empty() {
                    head.push(line);
                }
                break "";
            };
            let line = rest[..idx].trim_end_matches('\r');
            rest = &rest[idx + 1..];
            if line.is_empty() {
                break rest;
            }
            head.push(line);
        };

        let mut lines = head.into_iter();
        let command = lines.next().ok_or(FrameError::Empty)?;

        let headers = lines
            .map(|line| {
                line.split_once(':')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            command: Command::parse(command),
            headers,
            body: body.to_string(),
        })
    }

    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}
