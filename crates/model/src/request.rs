use crate::ChatMessage;

/// A request to be sent to the completion provider.
///
/// The model id and endpoint belong to the provider's own configuration;
/// a request only carries the conversation and the sampling parameters.
/// Every request streams: providers have no non-streaming mode.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// The input messages, in conversation order. The first message is
    /// expected to be the system instructions.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on the number of generated tokens.
    pub max_tokens: u32,
}
