use shoptalk_model::ErrorKind;

/// The scripted reply for one assistant turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptedReply {
    /// Fragments to emit, in order.
    pub fragments: Vec<String>,
    /// If set, the stream fails with the given kind after emitting that
    /// many fragments. `Some((0, _))` fails before the first fragment.
    pub failure: Option<(usize, ErrorKind)>,
}

impl ScriptedReply {
    /// Creates a reply that streams the given fragments and completes.
    #[inline]
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            failure: None,
        }
    }

    /// Makes the stream fail after emitting `emitted` fragments.
    #[inline]
    pub fn failing_after(mut self, emitted: usize, kind: ErrorKind) -> Self {
        self.failure = Some((emitted, kind));
        self
    }
}
