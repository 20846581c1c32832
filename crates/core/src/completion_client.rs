use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use shoptalk_model::{
    CompletionProvider, CompletionRequest, CompletionStream, ErrorKind,
    ProviderError,
};
use tracing::Instrument;

type StreamCompleteResult = Result<String, CompletionError>;
type BoxedStreamCompleteFuture =
    Pin<Box<dyn Future<Output = StreamCompleteResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(CompletionRequest, Box<dyn Fn(String) + Send + 'static>)
        -> BoxedStreamCompleteFuture + Send + Sync
>;

/// The outcome of a failed completion call: an explicit kind plus a
/// human-readable message, detached from the provider's error type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionError {
    /// What went wrong, broadly.
    pub kind: ErrorKind,
    /// A human-readable description.
    pub message: String,
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for CompletionError {}

/// A wrapper around a completion provider that drives one streamed
/// request to completion and provides a type-erased interface for the
/// other modules.
#[derive(Clone)]
pub struct CompletionClient {
    handler_fn: HandlerFn,
}

impl CompletionClient {
    /// Creates a client wrapping the given provider.
    #[inline]
    pub fn new<P: CompletionProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `CompletionClient` doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_fragment| {
            let fut = provider.stream_complete(&req);
            Box::pin(
                async move {
                    trace!("got a request: {req:?}");
                    let stream_or_err = fut.await;
                    drain_stream::<P>(stream_or_err, on_fragment).await
                }
                .instrument(trace_span!("completion req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request, invoking `on_fragment` for every received text
    /// fragment, and resolves to the full reply text once the stream
    /// completes.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The stream stops being consumed when
    /// this operation is cancelled.
    #[inline]
    pub async fn stream_complete(
        &self,
        req: CompletionRequest,
        on_fragment: impl Fn(String) + Send + 'static,
    ) -> Result<String, CompletionError> {
        (self.handler_fn)(req, Box::new(on_fragment)).await
    }
}

async fn drain_stream<P: CompletionProvider + 'static>(
    stream_or_err: Result<P::Stream, P::Error>,
    on_fragment: Box<dyn Fn(String) + Send + 'static>,
) -> StreamCompleteResult {
    let stream = match stream_or_err {
        Ok(stream) => stream,
        Err(err) => {
            error!("completion call failed: {err:?}");
            return Err(CompletionError {
                kind: err.kind(),
                message: err.to_string(),
            });
        }
    };

    let mut reply = String::new();
    trace!("start receiving fragments");

    let mut pinned_stream = pin!(stream);
    loop {
        let fragment_or_err =
            poll_fn(|cx| pinned_stream.as_mut().poll_next_fragment(cx)).await;
        let fragment = match fragment_or_err {
            Ok(fragment) => fragment,
            Err(err) => {
                error!("stream failed: {err:?}");
                return Err(CompletionError {
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        };

        let Some(fragment) = fragment else {
            break;
        };
        trace!("got a fragment: {fragment:?}");
        reply.push_str(&fragment);
        on_fragment(fragment);
    }

    trace!("finished a request");

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use shoptalk_model::ChatMessage;
    use shoptalk_test_model::{ScriptedProvider, ScriptedReply};

    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::User("Hi".to_owned())],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn test_stream_complete() {
        let provider = ScriptedProvider::default();
        for _ in 0..3 {
            provider.push_reply(ScriptedReply::with_fragments([
                "How ", "are ", "you?",
            ]));
        }
        let client = CompletionClient::new(provider);

        for _ in 0..3 {
            let fragment_count = Arc::new(AtomicUsize::new(0));
            let reply = client
                .stream_complete(request(), {
                    let fragment_count = Arc::clone(&fragment_count);
                    move |_| {
                        fragment_count.fetch_add(1, Ordering::Relaxed);
                    }
                })
                .await
                .unwrap();
            assert_eq!(reply, "How are you?");
            assert_eq!(fragment_count.load(Ordering::Relaxed), 3);
        }
    }

    #[tokio::test]
    async fn test_error_carries_kind_and_message() {
        let provider = ScriptedProvider::default();
        let client = CompletionClient::new(provider);
        let err = client
            .stream_complete(request(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Provider);
        assert!(!err.message.is_empty());
    }
}
