//! AI-assisted copywriting: the completion provider seam, the Azure OpenAI
//! client behind it, and the prompt builders for each tool.

pub mod azure;
pub mod generators;
pub mod locale;
pub mod scraper;

use async_trait::async_trait;

pub use azure::AzureOpenAi;
pub use generators::Generators;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI provider is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("AI provider returned an empty completion")]
    EmptyResponse,

    #[error("Could not parse AI response: {0}")]
    InvalidResponse(String),
}

/// One chat completion call
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Attached as an image part of the user message
    pub image_url: Option<String>,
    pub max_tokens: u32,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            image_url: None,
            max_tokens,
            json_mode: false,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Text of the first choice; blank completions are `EmptyResponse`
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError>;
}
