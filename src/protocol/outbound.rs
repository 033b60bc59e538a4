//! Transport boundary payload types.
//!
//! The chat transport delivers `(caller, text | attachment)` events
//! and accepts these outbound payloads; message chunking and markup
//! escaping happen on the transport's side of the boundary.

use std::path::PathBuf;

use crate::session::ChatId;

/// One inbound event from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub caller: ChatId,
    pub payload: Payload,
}

impl Inbound {
    pub fn text(caller: ChatId, text: impl Into<String>) -> Self {
        Self {
            caller,
            payload: Payload::Text(text.into()),
        }
    }

    pub fn document(caller: ChatId, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            caller,
            payload: Payload::Document {
                file_name: file_name.into(),
                data,
            },
        }
    }
}

/// Inbound payload: text, or a file attachment (implicit upload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Document { file_name: String, data: Vec<u8> },
}

/// One outbound payload for the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Photo { path: PathBuf, caption: String },
    Video { path: PathBuf, caption: String },
    Document {
        path: PathBuf,
        file_name: String,
        caption: String,
    },
}

/// Whether the process keeps running after this dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// `/stopbot`: the loop ends once the replies are delivered.
    Shutdown,
}

/// Outcome of dispatching one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub replies: Vec<Outbound>,
    pub control: Control,
}

impl DispatchResult {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            replies: vec![Outbound::Text(text.into())],
            control: Control::Continue,
        }
    }

    pub fn replies(replies: Vec<Outbound>) -> Self {
        Self {
            replies,
            control: Control::Continue,
        }
    }

    /// No reply; the presentation layer's default behavior applies.
    pub fn silent() -> Self {
        Self {
            replies: Vec::new(),
            control: Control::Continue,
        }
    }

    pub fn shutdown(text: impl Into<String>) -> Self {
        Self {
            replies: vec![Outbound::Text(text.into())],
            control: Control::Shutdown,
        }
    }

    /// First reply rendered as text, for assertions in tests.
    pub fn first_text(&self) -> Option<&str> {
        self.replies.iter().find_map(|r| match r {
            Outbound::Text(t) => Some(t.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_helpers() {
        let r = DispatchResult::reply("hi");
        assert_eq!(r.control, Control::Continue);
        assert_eq!(r.first_text(), Some("hi"));

        let s = DispatchResult::silent();
        assert!(s.replies.is_empty());

        let stop = DispatchResult::shutdown("bye");
        assert_eq!(stop.control, Control::Shutdown);
    }

    #[test]
    fn test_inbound_constructors() {
        let t = Inbound::text(ChatId(1), "hello");
        assert!(matches!(t.payload, Payload::Text(ref s) if s == "hello"));

        let d = Inbound::document(ChatId(1), "a.bin", vec![1, 2]);
        assert!(matches!(d.payload, Payload::Document { ref file_name, .. } if file_name == "a.bin"));
    }
}
