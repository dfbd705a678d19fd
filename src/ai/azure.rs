use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{AiError, CompletionProvider, CompletionRequest};
use crate::config::AiConfig;

/// Chat-completions client for an Azure OpenAI deployment
pub struct AzureOpenAi {
    client: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    deployment: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureOpenAi {
    /// Missing endpoint or key is reported per call, so the server can start without AI
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone().filter(|s| !s.is_empty()),
            api_key: config.api_key.clone().filter(|s| !s.is_empty()),
            deployment: config.deployment.clone(),
            api_version: config.api_version.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    fn body(request: &CompletionRequest) -> Value {
        let user_content = match &request.image_url {
            Some(image_url) => json!([
                { "type": "text", "text": request.user },
                { "type": "image_url", "image_url": { "url": image_url } }
            ]),
            None => json!(request.user),
        };

        let mut body = json!({
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": user_content }
            ],
            "max_tokens": request.max_tokens,
            "temperature": 0.7
        });
        if request.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAi {
    async fn complete(&self, request: CompletionRequest) -> Result<String, AiError> {
        let endpoint = self.endpoint.as_deref().ok_or(AiError::NotConfigured("AZURE_OPENAI_ENDPOINT"))?;
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured("AZURE_OPENAI_API_KEY"))?;

        debug!(deployment = %self.deployment, max_tokens = request.max_tokens, "AI completion request");
        let response = self
            .client
            .post(self.url(endpoint))
            .header("api-key", api_key)
            .json(&Self::body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AiConfig {
        AiConfig {
            endpoint: Some("https://example.openai.azure.com/".into()),
            api_key: None,
            deployment: "gpt-4o".into(),
            api_version: "2024-02-15-preview".into(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn builds_deployment_url() {
        let client = AzureOpenAi::from_config(&config()).unwrap();
        assert_eq!(
            client.url("https://example.openai.azure.com/"),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn image_requests_use_content_parts() {
        let body = AzureOpenAi::body(&CompletionRequest::new("sys", "describe", 100).with_image("https://x/y.png").json());
        assert_eq!(body["messages"][1]["content"][1]["image_url"]["url"], "https://x/y.png");
        assert_eq!(body["response_format"]["type"], "json_object");

        let plain = AzureOpenAi::body(&CompletionRequest::new("sys", "hello", 10));
        assert_eq!(plain["messages"][1]["content"], "hello");
        assert!(plain.get("response_format").is_none());
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let client = AzureOpenAi::from_config(&config()).unwrap();
        let err = client.complete(CompletionRequest::new("s", "u", 1)).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured("AZURE_OPENAI_API_KEY")));
    }
}
