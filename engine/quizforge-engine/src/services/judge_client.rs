use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::JudgeConfig;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// System instruction for the grading model. Feedback is produced in the
/// product's domain language.
const JUDGE_SYSTEM_INSTRUCTION: &str = "你是一个判分专家。请用**中文**给出反馈。\
    语义相近即正确。输出 JSON 对象，Key 为题目 ID，Value 为 {isCorrect: boolean, feedback: string}。";

/// One deferred answer submitted for external judgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeItem {
    pub id: String,
    pub question: String,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeOutcome {
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
    pub feedback: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("judge API key is not configured")]
    MissingApiKey,
    #[error("judge request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("judge returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("judge response is not a valid verdict map: {0}")]
    MalformedResponse(String),
}

/// Contract the grading engine depends on. One entry per input id;
/// any transport/auth/quota problem must surface as an error value,
/// never as silently partial data.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    async fn judge(&self, batch: &[JudgeItem])
        -> Result<HashMap<String, JudgeOutcome>, JudgeError>;
}

/// Default judge backed by an OpenAI-compatible chat completions API.
pub struct HttpJudgeClient {
    config: JudgeConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl HttpJudgeClient {
    pub fn new(config: JudgeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Convenience constructor reading the ambient configuration once at
    /// startup. Grading logic itself only ever sees the injected value.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = JudgeConfig::load().context("failed to load judge configuration")?;
        Ok(Self::new(config))
    }

    async fn call_once(&self, prompt: &str) -> Result<HashMap<String, JudgeOutcome>, JudgeError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JUDGE_SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .timeout(self.config.timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(JudgeError::Status { status, message });
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or("");

        parse_verdict_map(content)
    }
}

#[async_trait]
impl JudgeClient for HttpJudgeClient {
    async fn judge(
        &self,
        batch: &[JudgeItem],
    ) -> Result<HashMap<String, JudgeOutcome>, JudgeError> {
        if batch.is_empty() {
            return Ok(HashMap::new());
        }
        if self.config.api_key.is_empty() {
            return Err(JudgeError::MissingApiKey);
        }

        let payload =
            serde_json::to_string(batch).map_err(|e| JudgeError::MalformedResponse(e.to_string()))?;
        let prompt = format!("判分数据：{}", payload);

        tracing::debug!(
            "Calling remote judge: model={}, batch_size={}",
            self.config.model,
            batch.len()
        );

        retry_async_with_config(RetryConfig::judge(self.config.max_attempts), || async {
            self.call_once(&prompt).await
        })
        .await
    }
}

/// Chat models occasionally wrap their JSON in a markdown code fence.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn parse_verdict_map(content: &str) -> Result<HashMap<String, JudgeOutcome>, JudgeError> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| JudgeError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judge_item_uses_the_wire_field_names() {
        let item = JudgeItem {
            id: "q1".to_string(),
            question: "首都是哪里？".to_string(),
            correct_answer: "北京".to_string(),
            user_answer: "Beijing".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["correctAnswer"], "北京");
        assert_eq!(json["userAnswer"], "Beijing");
    }

    #[test]
    fn parses_a_plain_verdict_map() {
        let content = r#"{"q1": {"isCorrect": true, "feedback": "语义一致"}}"#;
        let map = parse_verdict_map(content).unwrap();
        assert!(map["q1"].is_correct);
        assert_eq!(map["q1"].feedback, "语义一致");
    }

    #[test]
    fn parses_a_fenced_verdict_map() {
        let content = "```json\n{\"q1\": {\"isCorrect\": false, \"feedback\": \"答非所问\"}}\n```";
        let map = parse_verdict_map(content).unwrap();
        assert!(!map["q1"].is_correct);
    }

    #[test]
    fn garbage_content_is_a_malformed_response() {
        assert!(matches!(
            parse_verdict_map("I think the answer is fine."),
            Err(JudgeError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_fast() {
        let client = HttpJudgeClient::new(JudgeConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
            timeout_seconds: 1,
            max_attempts: 1,
        });
        let batch = [JudgeItem {
            id: "q1".to_string(),
            question: "题干".to_string(),
            correct_answer: "答案".to_string(),
            user_answer: "回答".to_string(),
        }];
        assert!(matches!(
            client.judge(&batch).await,
            Err(JudgeError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network_entirely() {
        let client = HttpJudgeClient::new(JudgeConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: String::new(),
            model: "deepseek-chat".to_string(),
            temperature: 0.7,
            timeout_seconds: 1,
            max_attempts: 1,
        });
        let map = client.judge(&[]).await.unwrap();
        assert!(map.is_empty());
    }
}
