//! A completion provider for Groq's OpenAI-compatible chat API.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, header};
use shoptalk_model::{
    CompletionProvider, CompletionRequest, ErrorKind, ProviderError,
};

pub use config::{GroqConfig, GroqConfigBuilder};
use io::{ByteSource, Sse};
pub use response::GroqStream;

/// Error type for [`GroqProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Groq completion provider.
///
/// Cloning is cheap and clones share the underlying pooled HTTP client,
/// so independent sessions can issue concurrent calls safely.
#[derive(Clone, Debug)]
pub struct GroqProvider {
    client: Client,
    config: Arc<GroqConfig>,
}

impl GroqProvider {
    /// Creates a new `GroqProvider` with the given configuration.
    #[inline]
    pub fn new(config: GroqConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl CompletionProvider for GroqProvider {
    type Error = Error;
    type Stream = GroqStream;

    fn stream_complete(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        let groq_req = proto::create_request(req, &self.config);
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            // The credential check must happen before any network attempt.
            if config.api_key.is_empty() {
                return Err(Error::new(
                    "no API key is configured",
                    ErrorKind::Configuration,
                ));
            }

            debug!("sending completion request to {}", config.base_url);
            let resp = match client
                .post(format!("{}/chat/completions", config.base_url))
                .header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", config.api_key),
                )
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT, "text/event-stream")
                .json(&groq_req)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("request failed: {err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let message = proto::error_message(&body).unwrap_or_else(
                    || format!("request rejected with status {status}"),
                );
                return Err(Error::new(message, ErrorKind::Provider));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse::<Mime>().ok())
                .map(|m: Mime| {
                    m.type_() == mime::TEXT && m.subtype() == "event-stream"
                })
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Provider,
                ));
            }

            // Here we got a successful streaming response.
            let sse = Sse::new(ByteSource::from_response(resp));
            Ok(GroqStream::from_sse(sse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        let config = GroqConfigBuilder::with_api_key("").build();
        let provider = GroqProvider::new(config);
        let req = CompletionRequest {
            messages: vec![shoptalk_model::ChatMessage::User(
                "Hi".to_owned(),
            )],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let err = provider.stream_complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
