use serde::{Deserialize, Serialize};
use tell_no_lie_backend::{ChatMessage, ChatRequest};

// ----------------------
// Type sent to the server
// ----------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatBody<'a> {
    pub messages: &'a [ChatMessage],
}

// ----------------------------
// Type received from the server
// ----------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatReply {
    pub msg: String,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_body(req: &ChatRequest) -> ChatBody<'_> {
    ChatBody {
        messages: &req.messages,
    }
}
