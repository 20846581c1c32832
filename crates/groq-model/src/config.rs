use std::fmt::Debug;

/// Builder for [`GroqConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GroqConfigBuilder {
    api_key: String,
    model: Option<String>,
    base_url: Option<String>,
}

impl GroqConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            base_url: None,
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GroqConfig {
        GroqConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| "llama3-8b-8192".to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string()),
        }
    }
}

impl Debug for GroqConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Groq provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GroqConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
}

impl Debug for GroqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
