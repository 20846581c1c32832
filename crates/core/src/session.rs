mod builder;

use std::sync::{Arc, Mutex};

use shoptalk_model::{ChatMessage, CompletionRequest, ErrorKind};

use crate::completion_client::CompletionClient;
use crate::transcript::Transcript;
pub use builder::SessionBuilder;

/// The reply appended when no completion client is configured.
const NOT_CONFIGURED_REPLY: &str = "I'm not able to answer right now: the \
    assistant is not configured with an API credential. Please check the \
    service configuration and try again.";

type EventFn = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// An event pushed to the presentation layer while a turn progresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The reply accumulated so far, emitted once per received fragment.
    /// Display-only: nothing is stored until the turn finalizes. A
    /// typing marker, if any, is the renderer's business.
    Partial(String),
    /// The content appended to the transcript at the end of the turn,
    /// either the full reply or a synthetic error message.
    Finalized(String),
}

/// How a turn ended. Either way the session is idle again and ready for
/// the next submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The streamed reply was appended to the transcript.
    Finalized,
    /// The turn failed and a synthetic error reply was appended instead.
    Failed(ErrorKind),
}

/// A single user's isolated conversational context: the transcript plus
/// the in-flight turn state.
///
/// A session is an explicit value owned by the caller; there is no
/// process-wide state. Turns run strictly sequentially, which the
/// `&mut self` receiver of [`submit`](Session::submit) enforces at
/// compile time. Independent sessions share nothing but the provider's
/// pooled HTTP client.
pub struct Session {
    client: Option<CompletionClient>,
    transcript: Transcript,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    on_event: Option<EventFn>,
}

impl Session {
    /// Drives one request/response turn: appends the user message,
    /// streams the reply while pushing [`SessionEvent`]s, and finalizes
    /// the result into the transcript.
    ///
    /// Failures never propagate: every error becomes a synthetic
    /// assistant reply and a [`TurnOutcome::Failed`]. No retry is
    /// attempted.
    ///
    /// Callers are expected not to submit empty input; the input widget
    /// is the place to suppress it.
    pub async fn submit(&mut self, input: &str) -> TurnOutcome {
        self.transcript.append(ChatMessage::User(input.to_owned()));

        let Some(client) = self.client.clone() else {
            debug!("turn failed: no completion client configured");
            return self.fail_turn(
                ErrorKind::Configuration,
                NOT_CONFIGURED_REPLY.to_owned(),
            );
        };

        let request = self.build_request();
        // The reply accumulated from the fragments received so far.
        let partial = Arc::new(Mutex::new(String::new()));

        let on_fragment = {
            let partial = Arc::clone(&partial);
            let on_event = self.on_event.clone();
            move |fragment: String| {
                let mut partial =
                    partial.lock().expect("turn state poisoned");
                if partial.is_empty() {
                    trace!("first fragment arrived");
                }
                partial.push_str(&fragment);
                if let Some(on_event) = &on_event {
                    on_event(SessionEvent::Partial(partial.clone()));
                }
            }
        };

        match client.stream_complete(request, on_fragment).await {
            Ok(reply) => {
                self.transcript
                    .append(ChatMessage::Assistant(reply.clone()));
                self.emit(SessionEvent::Finalized(reply));
                TurnOutcome::Finalized
            }
            Err(err) => {
                let partial = partial.lock().expect("turn state poisoned");
                if !partial.is_empty() {
                    // The partial text stays visible wherever it was
                    // rendered, but the transcript records the error
                    // reply instead.
                    debug!(
                        partial_len = partial.len(),
                        "discarding partial reply after a failed stream"
                    );
                }
                drop(partial);
                let reply = match err.kind {
                    ErrorKind::Configuration => {
                        NOT_CONFIGURED_REPLY.to_owned()
                    }
                    _ => format!(
                        "Sorry, I encountered an error: {}",
                        err.message
                    ),
                };
                self.fail_turn(err.kind, reply)
            }
        }
    }

    /// Restores the transcript to the single greeting message.
    #[inline]
    pub fn reset(&mut self) {
        self.transcript.reset();
    }

    /// Returns the transcript for a full render.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn fail_turn(&mut self, kind: ErrorKind, reply: String) -> TurnOutcome {
        self.transcript.append(ChatMessage::Assistant(reply.clone()));
        self.emit(SessionEvent::Finalized(reply));
        TurnOutcome::Failed(kind)
    }

    // The request history is the system prompt prepended to the entire
    // current transcript, greeting included. The full history is resent
    // every turn; there is no sliding window or truncation.
    fn build_request(&self) -> CompletionRequest {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        messages.push(ChatMessage::System(self.system_prompt.clone()));
        messages.extend(self.transcript.all().iter().cloned());
        CompletionRequest {
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event);
        }
    }
}
