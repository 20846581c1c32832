use std::pin::Pin;
use std::task::{self, Poll};

use crate::provider::ProviderError;

/// A streamed response from a completion provider.
///
/// The stream is lazy, finite and non-restartable: fragments arrive in
/// generation order, and concatenating every fragment of a successful
/// stream yields the full reply text.
pub trait CompletionStream: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Attempts to pull out the next text fragment from the stream.
    ///
    /// # Return value
    ///
    /// - `Poll::Pending` means the stream is still waiting for the next
    ///   fragment. Implementations will ensure that the current task is
    ///   notified when the next fragment may be ready.
    /// - `Poll::Ready(Ok(Some(fragment)))` delivers a fragment, and the
    ///   stream may produce further fragments on subsequent calls.
    /// - `Poll::Ready(Ok(None))` means the stream has completed.
    /// - `Poll::Ready(Err(error))` means the stream failed. Errors may
    ///   surface on any poll, including before the first fragment.
    ///
    /// Calling this method after completion should always return `None`.
    fn poll_next_fragment(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<String>, Self::Error>>;
}
