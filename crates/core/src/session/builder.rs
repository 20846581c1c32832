use std::sync::Arc;

use shoptalk_model::CompletionProvider;

use super::{EventFn, Session, SessionEvent};
use crate::completion_client::CompletionClient;
use crate::transcript::Transcript;

const DEFAULT_GREETING: &str = "Hello! How can I help you today?";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// [`Session`] builder.
pub struct SessionBuilder {
    client: Option<CompletionClient>,
    system_prompt: String,
    greeting: String,
    temperature: f32,
    max_tokens: u32,
    on_event: Option<EventFn>,
}

impl SessionBuilder {
    /// Creates a builder with the specified completion provider.
    #[inline]
    pub fn with_provider<P: CompletionProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::from_client(Some(CompletionClient::new(provider)))
    }

    /// Creates a builder for a session without a usable credential.
    ///
    /// Such a session still accepts submissions; every turn fails with a
    /// configuration-problem reply, without any network attempt.
    #[inline]
    pub fn unconfigured() -> Self {
        Self::from_client(None)
    }

    fn from_client(client: Option<CompletionClient>) -> Self {
        Self {
            client,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_owned(),
            greeting: DEFAULT_GREETING.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            on_event: None,
        }
    }

    /// Sets the system prompt injected into every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the greeting message that seeds the transcript.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Sets the sampling temperature.
    #[inline]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the generated-token limit per reply.
    #[inline]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Attaches a callback to be invoked for every session event.
    #[inline]
    pub fn on_event(
        mut self,
        on_event: impl Fn(SessionEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_event = Some(Arc::new(on_event));
        self
    }

    /// Builds the session.
    #[inline]
    pub fn build(self) -> Session {
        Session {
            client: self.client,
            transcript: Transcript::with_greeting(self.greeting),
            system_prompt: self.system_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            on_event: self.on_event,
        }
    }
}
