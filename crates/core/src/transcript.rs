//! Transcript-related types.

use shoptalk_model::ChatMessage;

/// The ordered conversation history for one session.
///
/// The transcript is append-only apart from [`reset`](Transcript::reset)
/// and always starts with a synthetic assistant greeting. The system
/// prompt is never stored here, it is injected at request time.
#[derive(Clone, Debug)]
pub struct Transcript {
    greeting: String,
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Creates a transcript seeded with the greeting message.
    pub fn with_greeting<S: Into<String>>(greeting: S) -> Self {
        let greeting = greeting.into();
        let messages = vec![ChatMessage::Assistant(greeting.clone())];
        Self { greeting, messages }
    }

    /// Appends a message at the end.
    #[inline]
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replaces the stored sequence with exactly the greeting message.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages
            .push(ChatMessage::Assistant(self.greeting.clone()));
    }

    /// Returns the full ordered sequence.
    #[inline]
    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of stored messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether the transcript holds no messages. A freshly
    /// created or reset transcript never does.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
