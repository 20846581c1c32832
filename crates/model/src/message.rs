/// The author of a [`ChatMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The instruction message that defines the assistant's behavior.
    /// Injected at request time, never stored in a transcript.
    System,
    /// A message typed by the user.
    User,
    /// A message produced by the assistant.
    Assistant,
}

/// A complete, role-tagged message. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant reply text.
    Assistant(String),
}

impl ChatMessage {
    /// Returns the role of this message.
    #[inline]
    pub fn role(&self) -> Role {
        match self {
            ChatMessage::System(_) => Role::System,
            ChatMessage::User(_) => Role::User,
            ChatMessage::Assistant(_) => Role::Assistant,
        }
    }

    /// Returns the text content of this message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System(content)
            | ChatMessage::User(content)
            | ChatMessage::Assistant(content) => content,
        }
    }
}
