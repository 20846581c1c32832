/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No usable credential is available. This is terminal for the turn
    /// and must be reported before any network attempt.
    Configuration,
    /// A network-level failure: connection, timeout, or an interrupted
    /// response body.
    Transport,
    /// The completion service received the request but rejected or
    /// errored it (for example, an unknown model id).
    Provider,
}
