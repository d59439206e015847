//! The ordered, append-only message collection.

use crate::message::{
    Message, MessageId, MessagePatch, MessageStatus, Sender, TrialOutcome,
};

/// An ordered collection of messages.
///
/// Messages are never removed. Rendering walks the store most-recent
/// first, while the backend wants history oldest first; both views are
/// available and each is the exact reverse of the other.
#[derive(Clone, Debug, Default)]
pub struct MessageStore {
    // Kept in creation order, so ids are sorted.
    messages: Vec<Message>,
    last_id: u64,
}

impl MessageStore {
    /// Appends a message and returns its fresh id.
    ///
    /// Assistant messages start pending, as they are either a reply slot or
    /// a scripted line being typed. Only user messages start in the context.
    pub fn append<S: Into<String>>(
        &mut self,
        sender: Sender,
        text: S,
    ) -> MessageId {
        let id = self.next_id();
        let status = if sender == Sender::Assistant {
            MessageStatus::Pending
        } else {
            MessageStatus::Settled
        };
        self.messages.push(Message {
            id,
            sender,
            text: text.into(),
            status,
            include_in_context: sender == Sender::User,
            trial_outcome: TrialOutcome::None,
        });
        id
    }

    /// Applies `patch` to the message with `id`, returning the updated
    /// message, or `None` if no such message exists.
    pub fn update_by_id(
        &mut self,
        id: MessageId,
        patch: MessagePatch,
    ) -> Option<&Message> {
        let idx = self.messages.binary_search_by_key(&id, |m| m.id).ok()?;
        let msg = &mut self.messages[idx];
        patch.apply(msg);
        Some(msg)
    }

    /// Returns the message with `id`.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        let idx = self.messages.binary_search_by_key(&id, |m| m.id).ok()?;
        Some(&self.messages[idx])
    }

    /// Iterates from the newest message to the oldest.
    #[inline]
    pub fn iter_recent_first(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter().rev()
    }

    /// Iterates from the oldest message to the newest.
    #[inline]
    pub fn iter_chronological(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    /// Iterates, oldest first, over the messages created before `id` that
    /// belong in the backend context.
    pub fn context_before(
        &self,
        id: MessageId,
    ) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .take_while(move |m| m.id < id)
            .filter(|m| m.include_in_context)
    }

    /// Returns the pending message, if any.
    pub fn pending(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.is_pending())
    }

    /// Returns how many characters the player has typed so far.
    pub fn characters_typed(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .map(|m| m.text.chars().count())
            .sum()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the store is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[inline]
    fn next_id(&mut self) -> MessageId {
        self.last_id += 1;
        MessageId(self.last_id)
    }
}
