//! Engine result type.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// What a matched rule produced.
///
/// A rule that does not match yields `None` at the engine boundary instead,
/// so the caller can continue with its own default handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text for the caller to speak or display.
    Reply(String),
    /// The action already produced its side effect; suppress the default reply.
    Handled,
}

impl Outcome {
    pub fn reply(text: impl Into<String>) -> Self {
        Outcome::Reply(text.into())
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Reply(text) => Some(text),
            Outcome::Handled => None,
        }
    }
}

// Wire shape is `{"text": ...}` or `{"handled": true}`, never both.
impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Outcome::Reply(text) => map.serialize_entry("text", text)?,
            Outcome::Handled => map.serialize_entry("handled", &true)?,
        }
        map.end()
    }
}
