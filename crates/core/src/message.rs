//! Message records shown in the chat.

use std::fmt::{self, Display};

/// Identifier of a message, unique and increasing within one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(pub(crate) u64);

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// Who a message comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sender {
    /// Typed by the player.
    User,
    /// Spoken by the persona, scripted or from the backend.
    Assistant,
    /// An automated trial question, sent on the player's behalf.
    Probe,
}

/// Where a message is in its lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    /// The text is still being produced.
    Pending,
    /// The text is final.
    #[default]
    Settled,
    /// The reply never arrived. Holds a reason fit for display.
    Failed(String),
}

/// The trial verdict attached to the reply of a probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TrialOutcome {
    /// Not a judged reply.
    #[default]
    None,
    /// The reply was in the probe's allow-list.
    Correct,
    /// The reply was not in the probe's allow-list.
    Incorrect,
}

/// One conversational turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    pub(crate) id: MessageId,
    pub(crate) sender: Sender,
    pub(crate) text: String,
    pub(crate) status: MessageStatus,
    pub(crate) include_in_context: bool,
    pub(crate) trial_outcome: TrialOutcome,
}

impl Message {
    /// Returns the identifier.
    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the author.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }

    /// Returns the displayed text. Empty while the message is pending.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the lifecycle status.
    #[inline]
    pub fn status(&self) -> &MessageStatus {
        &self.status
    }

    /// Returns whether the message is still waiting for its text.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }

    /// Returns whether the message is sent to the backend as history.
    #[inline]
    pub fn include_in_context(&self) -> bool {
        self.include_in_context
    }

    /// Returns the trial verdict, if this is a judged reply.
    #[inline]
    pub fn trial_outcome(&self) -> TrialOutcome {
        self.trial_outcome
    }
}

/// A partial update of a [`Message`]. Fields left as `None` are untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessagePatch {
    /// New text.
    pub text: Option<String>,
    /// New status.
    pub status: Option<MessageStatus>,
    /// New context flag.
    pub include_in_context: Option<bool>,
    /// New trial verdict.
    pub trial_outcome: Option<TrialOutcome>,
}

impl MessagePatch {
    /// The patch that settles a pending reply with its final text and lets
    /// it into the history.
    #[inline]
    pub fn resolved<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            status: Some(MessageStatus::Settled),
            include_in_context: Some(true),
            trial_outcome: None,
        }
    }

    /// The patch that marks a pending reply as failed.
    #[inline]
    pub fn failed<S: Into<String>>(reason: S) -> Self {
        Self {
            status: Some(MessageStatus::Failed(reason.into())),
            ..Default::default()
        }
    }

    /// The patch that settles a scripted line without touching its text.
    #[inline]
    pub fn settled() -> Self {
        Self {
            status: Some(MessageStatus::Settled),
            ..Default::default()
        }
    }

    /// The patch that records a trial verdict.
    #[inline]
    pub fn judged(outcome: TrialOutcome) -> Self {
        Self {
            trial_outcome: Some(outcome),
            ..Default::default()
        }
    }

    pub(crate) fn apply(self, msg: &mut Message) {
        if let Some(text) = self.text {
            msg.text = text;
        }
        if let Some(status) = self.status {
            msg.status = status;
        }
        if let Some(include) = self.include_in_context {
            msg.include_in_context = include;
        }
        if let Some(outcome) = self.trial_outcome {
            msg.trial_outcome = outcome;
        }
    }
}
