use std::error::Error;

use crate::error::ErrorKind;
use crate::request::CompletionRequest;
use crate::response::CompletionStream;

/// The error type for a completion provider.
pub trait ProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a completion provider: an entry for sending a
/// conversation to a hosted model and streaming the reply back.
///
/// Once the provider is created, it should behave like a stateless
/// object. It can still have internal state (a pooled HTTP client, for
/// example), but callers should not rely on it, and the provider must be
/// safe for concurrent independent calls.
pub trait CompletionProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// The streamed response type for this provider.
    type Stream: CompletionStream<Error = Self::Error>;

    /// Issues one completion call and resolves to its fragment stream.
    ///
    /// Providers perform exactly one outbound call per invocation and
    /// never retry internally; retry policy, if any, belongs to the
    /// caller.
    fn stream_complete(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static;
}
