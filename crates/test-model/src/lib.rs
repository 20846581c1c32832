//! A local scripted completion provider for testing purpose.

mod script;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use shoptalk_model::{
    CompletionProvider, CompletionRequest, CompletionStream, ErrorKind,
    ProviderError,
};
use tokio::time::{Sleep, sleep};

pub use script::ScriptedReply;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
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

#[derive(Default)]
struct Inner {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

/// A local scripted provider.
///
/// Push the replies you expect the "model" to produce, in order. Each
/// call pops the next reply and records the request it received, so
/// tests can assert on both sides of the exchange. A call with no
/// remaining reply fails with a provider-kind error.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy
/// memory copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    inner: Arc<Inner>,
}

impl ScriptedProvider {
    /// Appends a reply to the script.
    pub fn push_reply(&self, reply: ScriptedReply) {
        self.inner
            .replies
            .lock()
            .expect("script lock poisoned")
            .push_back(reply);
    }

    /// Returns how many requests this provider has received.
    pub fn request_count(&self) -> usize {
        self.inner
            .requests
            .lock()
            .expect("request log lock poisoned")
            .len()
    }

    /// Returns a copy of every request received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.inner
            .requests
            .lock()
            .expect("request log lock poisoned")
            .clone()
    }
}

impl CompletionProvider for ScriptedProvider {
    type Error = Error;
    type Stream = ScriptedStream;

    fn stream_complete(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        self.inner
            .requests
            .lock()
            .expect("request log lock poisoned")
            .push(req.clone());
        let reply = self
            .inner
            .replies
            .lock()
            .expect("script lock poisoned")
            .pop_front();
        let result = match reply {
            Some(reply) => Ok(ScriptedStream::new(reply)),
            None => Err(Error {
                message: "no scripted reply remains",
                kind: ErrorKind::Provider,
            }),
        };
        ready(result)
    }
}

/// The fragment stream of one scripted reply.
///
/// Fragments are delivered one per poll with a short timer delay in
/// between, so consumers exercise real `Pending` states.
#[derive(Debug)]
pub struct ScriptedStream {
    fragments: VecDeque<String>,
    emitted: usize,
    failure: Option<(usize, ErrorKind)>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ScriptedStream {
    fn new(reply: ScriptedReply) -> Self {
        Self {
            fragments: reply.fragments.into(),
            emitted: 0,
            failure: reply.failure,
            sleep: None,
        }
    }
}

impl CompletionStream for ScriptedStream {
    type Error = Error;

    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some((after, kind)) = this.failure
                && this.emitted == after
            {
                return Poll::Ready(Err(Error {
                    message: "scripted stream failure",
                    kind,
                }));
            }

            let Some(fragment) = this.fragments.pop_front() else {
                return Poll::Ready(Ok(None));
            };
            this.emitted += 1;
            return Poll::Ready(Ok(Some(fragment)));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_fragment(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use shoptalk_model::ChatMessage;

    use super::*;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::User(text.to_owned())],
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    async fn collect(
        stream: ScriptedStream,
    ) -> Result<String, Error> {
        let mut stream = pin!(stream);
        let mut reply = String::new();
        loop {
            match poll_fn(|cx| stream.as_mut().poll_next_fragment(cx)).await {
                Ok(Some(fragment)) => reply.push_str(&fragment),
                Ok(None) => return Ok(reply),
                Err(err) => return Err(err),
            }
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let provider = ScriptedProvider::default();
        provider.push_reply(ScriptedReply::with_fragments([
            "Hello, ", "world!",
        ]));
        provider.push_reply(ScriptedReply::with_fragments(["Bye."]));

        let stream =
            provider.stream_complete(&request("Hi")).await.unwrap();
        assert!(format!("{stream:?}").starts_with("ScriptedStream"));
        assert_eq!(collect(stream).await.unwrap(), "Hello, world!");

        let stream =
            provider.stream_complete(&request("Bye")).await.unwrap();
        assert_eq!(collect(stream).await.unwrap(), "Bye.");

        assert_eq!(provider.request_count(), 2);
        assert_eq!(
            provider.requests()[1].messages,
            vec![ChatMessage::User("Bye".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_failure_after_some_fragments() {
        let provider = ScriptedProvider::default();
        provider.push_reply(
            ScriptedReply::with_fragments(["I was ", "about to say"])
                .failing_after(2, ErrorKind::Transport),
        );

        let stream =
            provider.stream_complete(&request("Hi")).await.unwrap();
        let err = collect(stream).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_exhausted_script_is_an_error() {
        let provider = ScriptedProvider::default();
        let err =
            provider.stream_complete(&request("Hi")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
    }
}
