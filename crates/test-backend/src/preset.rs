use serde::{Deserialize, Serialize};

/// How the scripted backend answers one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// Answer with this text.
    #[serde(rename = "reply")]
    Reply(String),
    /// Fail as if the backend could not be reached.
    #[serde(rename = "unreachable")]
    Unreachable,
    /// Fail as if the backend answered garbage.
    #[serde(rename = "malformed")]
    Malformed,
    /// Never answer.
    #[serde(rename = "hang")]
    Hang,
}

impl PresetReply {
    /// Creates a `PresetReply` answering with the given text.
    #[inline]
    pub fn reply<S: Into<String>>(text: S) -> Self {
        Self::Reply(text.into())
    }
}
