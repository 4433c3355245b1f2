//! Chat-completions client (OpenAI and Azure OpenAI)

use super::{CompletionRequest, ModelService};
use crate::config::{ApiFlavor, ModelConfig};
use crate::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// HTTP client for `/chat/completions`
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    config: ModelConfig,
    api_key: String,
}

impl ChatCompletionsClient {
    /// Create client with an explicit key
    #[must_use]
    pub fn new(config: ModelConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            api_key: api_key.into(),
        }
    }

    /// Create client reading the key from `config.api_key_env`
    ///
    /// # Errors
    /// Returns [`ModelError::MissingApiKey`] if the variable is unset or empty
    pub fn from_config(config: ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ModelError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(config, api_key))
    }

    /// Endpoint URL for the configured flavor
    #[must_use]
    pub fn endpoint(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        match self.config.flavor {
            ApiFlavor::OpenAi => format!("{base}/chat/completions"),
            ApiFlavor::Azure => format!(
                "{base}/openai/deployments/{}/chat/completions?api-version={}",
                self.config.engine, self.config.api_version
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ModelService for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        let body = json!({
            "model": self.config.model,
            "messages": request.messages,
            "max_tokens": request.params.max_tokens,
            "temperature": request.params.temperature,
            "stream": false,
        });

        let builder = self.client.post(self.endpoint()).json(&body);
        let builder = match self.config.flavor {
            ApiFlavor::OpenAi => builder.bearer_auth(&self.api_key),
            ApiFlavor::Azure => builder.header("api-key", &self.api_key),
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "chat completion request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::Malformed(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyResponse)?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelParams;
    use crate::conversation::Message;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            vec![Message::system("sys"), Message::user("write a test")],
            ModelParams {
                max_tokens: 256,
                temperature: 0.5,
            },
        )
    }

    fn config(flavor: ApiFlavor, base: &str) -> ModelConfig {
        ModelConfig {
            flavor,
            api_base: base.to_string(),
            ..ModelConfig::default()
        }
    }

    #[tokio::test]
    async fn openai_flavor_posts_bearer_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "max_tokens": 256,
                "stream": false,
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "write a test"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "```python\nx = 1\n```"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(
            config(ApiFlavor::OpenAi, &format!("{}/v1", server.uri())),
            "sk-test",
        );
        let reply = client.complete(&request()).await.unwrap();
        assert_eq!(reply, "```python\nx = 1\n```");
    }

    #[tokio::test]
    async fn azure_flavor_uses_deployment_url_and_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/GPT4/chat/completions"))
            .and(query_param("api-version", "2023-03-15-preview"))
            .and(header("api-key", "azure-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(config(ApiFlavor::Azure, &server.uri()), "azure-key");
        assert_eq!(client.complete(&request()).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(config(ApiFlavor::OpenAi, &server.uri()), "k");
        match client.complete(&request()).await {
            Err(ModelError::Api { status, body }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "slow down");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = ChatCompletionsClient::new(config(ApiFlavor::OpenAi, &server.uri()), "k");
        assert!(matches!(
            client.complete(&request()).await,
            Err(ModelError::EmptyResponse)
        ));
    }

    #[test]
    fn missing_key_variable() {
        let cfg = ModelConfig {
            api_key_env: "SCRIBE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelConfig::default()
        };
        assert!(matches!(
            ChatCompletionsClient::from_config(cfg),
            Err(ModelError::MissingApiKey(var)) if var == "SCRIBE_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = ChatCompletionsClient::new(config(ApiFlavor::OpenAi, "https://api.example.com/v1/"), "k");
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
    }
}
