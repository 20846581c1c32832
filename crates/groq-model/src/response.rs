use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use pin_project_lite::pin_project;
use shoptalk_model::{CompletionStream, ErrorKind};

use crate::Error;
use crate::io::{self, Sse};
use crate::proto::ChatCompletionChunk;

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextFragment = Result<(Option<String>, Sse), Error>;

pin_project! {
    /// The fragment stream of one Groq completion call.
    pub struct GroqStream {
        next_fragment_fut: Option<PinnedFuture<NextFragment>>,
    }
}

impl GroqStream {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        Self {
            next_fragment_fut: Some(Box::pin(next_fragment(sse))),
        }
    }
}

impl fmt::Debug for GroqStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqStream")
            .field("exhausted", &self.next_fragment_fut.is_none())
            .finish_non_exhaustive()
    }
}

impl CompletionStream for GroqStream {
    type Error = crate::Error;

    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        let this = self.project();
        let Some(next_fragment_fut) = this.next_fragment_fut else {
            // The stream has been exhausted.
            return Poll::Ready(Ok(None));
        };
        let (fragment, sse) = match ready!(next_fragment_fut.as_mut().poll(cx))
        {
            Ok((Some(fragment), sse)) => (fragment, sse),
            Ok((None, _)) => {
                *this.next_fragment_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *this.next_fragment_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        // The stream may still have more data to pull, create a new
        // future for the next fragment.
        *this.next_fragment_fut = Some(Box::pin(next_fragment(sse)));

        Poll::Ready(Ok(Some(fragment)))
    }
}

async fn next_fragment(mut sse: Sse) -> NextFragment {
    loop {
        let event = match sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => return Ok((None, sse)),
            Err(io::Error::Transport) => {
                return Err(Error::new(
                    "connection interrupted while streaming",
                    ErrorKind::Transport,
                ));
            }
            Err(io::Error::InvalidPayload) => {
                return Err(Error::new(
                    "malformed event stream payload",
                    ErrorKind::Provider,
                ));
            }
        };
        trace!("got sse event: {event}");
        if event == "[DONE]" {
            return Ok((None, sse));
        }

        let mut chunk = serde_json::from_str::<ChatCompletionChunk>(&event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Provider))?;
        let Some(choice) = chunk.choices.pop() else {
            continue;
        };

        if choice.finish_reason.is_some() {
            // The model is done generating, the rest is stream closure.
            return Ok((None, sse));
        }

        if let Some(content) = choice.delta.content
            && !content.is_empty()
        {
            return Ok((Some(content), sse));
        }

        // A role-only or empty delta, keep reading.
    }
}
