use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use shoptalk_model::{
    ChatMessage, CompletionProvider, CompletionRequest, CompletionStream,
    ErrorKind, ProviderError,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoProviderError(ErrorKind);

impl Display for EchoProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoProviderError {}

impl ProviderError for EchoProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct EchoStream {
    fragments: VecDeque<String>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoStream {
    fn new(input: &str) -> Self {
        let fragments = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self {
            fragments,
            sleep: None,
        }
    }
}

impl CompletionStream for EchoStream {
    type Error = EchoProviderError;

    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(mut fragment) = this.fragments.pop_front() {
                let need_space = !this.fragments.is_empty();
                if need_space {
                    fragment.push(' ');
                }
                return Poll::Ready(Ok(Some(fragment)));
            }

            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_fragment(cx)
    }
}

struct EchoProvider;

impl CompletionProvider for EchoProvider {
    type Error = EchoProviderError;
    type Stream = EchoStream;

    fn stream_complete(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            let Some(last) = req.messages.last() else {
                break 'blk Err(EchoProviderError(ErrorKind::Provider));
            };

            let content = match last {
                ChatMessage::User(text) => text.as_str(),
                msg => unreachable!("unexpected message: {msg:?}"),
            };

            Ok(EchoStream::new(content))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let provider = EchoProvider;
        let req = CompletionRequest {
            messages: vec![ChatMessage::User("Good morning".to_string())],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let mut stream = provider.stream_complete(&req).await.unwrap();

        let mut reply = String::new();
        loop {
            let next_fut =
                poll_fn(|cx| Pin::new(&mut stream).poll_next_fragment(cx));
            match next_fut.await {
                Ok(Some(fragment)) => reply.push_str(&fragment),
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        assert_eq!(reply, "You said Good morning");
    }

    #[tokio::test]
    async fn test_error() {
        let provider = EchoProvider;
        let req = CompletionRequest {
            messages: vec![],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let result = provider.stream_complete(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
    }
}
