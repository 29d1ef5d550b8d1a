//! LLM integration for coaching chat
//!
//! This module handles communication with a local Ollama server: a cheap
//! availability probe and a single non-streaming chat completion.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::OllamaConfig;
use crate::strategy::Strategy;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const PROVIDER: &str = "ollama";
const TEMPERATURE: f64 = 0.7;

/// Error bodies are truncated to this many characters
const MAX_ERROR_DETAIL: usize = 400;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, Serialize)]
pub enum LlmError {
  #[error("Ollama connection error: {0}")]
  Connection(String),

  #[error("Ollama request timed out after {0}s")]
  Timeout(u64),

  #[error("Ollama API error: {0}")]
  Api(String),

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("Ollama returned empty output.")]
  EmptyResponse,
}

impl LlmError {
  fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
    if err.is_timeout() {
      LlmError::Timeout(timeout.as_secs())
    } else {
      LlmError::Connection(err.to_string())
    }
  }
}

/// ---------------------------------------------------------------------------
/// Ollama API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  stream: bool,
  messages: Vec<ChatMessage<'a>>,
  options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role: &'a str,
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
  temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  #[serde(default)]
  message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
  #[serde(default)]
  content: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
  #[serde(default)]
  models: Vec<InstalledModel>,
}

#[derive(Debug, Deserialize)]
struct InstalledModel {
  #[serde(default)]
  name: String,
}

/// Availability report for the coach backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachStatus {
  pub enabled: bool,
  pub provider: String,
  pub model: String,
  pub message: String,
}

/// ---------------------------------------------------------------------------
/// Prompts
/// ---------------------------------------------------------------------------

/// System prompt for a chat turn, ending with the strategy's style line
pub fn system_prompt(strategy: Strategy) -> String {
  let base = include_str!("prompts/coach_system.txt").trim();
  format!("{} Response style: {}", base, strategy.style_instruction())
}

/// User prompt wrapping the data context around the message
pub fn user_prompt(context: &str, message: &str) -> String {
  format!(
    "Current user data context:\n{}\n\nUser message:\n{}",
    context, message
  )
}

/// ---------------------------------------------------------------------------
/// Ollama Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OllamaClient {
  client: Client,
  host: String,
  model: String,
  chat_timeout: Duration,
  status_timeout: Duration,
}

impl OllamaClient {
  pub fn new(config: &OllamaConfig) -> Self {
    Self {
      client: Client::new(),
      host: config.host.trim_end_matches('/').to_string(),
      model: config.model.clone(),
      chat_timeout: config.chat_timeout,
      status_timeout: config.status_timeout,
    }
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  /// Probe the server and check the configured model is installed.
  ///
  /// Never fails: an unreachable server is reported as a disabled status.
  pub async fn status(&self) -> CoachStatus {
    let disabled = |message: String| CoachStatus {
      enabled: false,
      provider: PROVIDER.to_string(),
      model: self.model.clone(),
      message,
    };

    let tags = match self.fetch_tags().await {
      Ok(tags) => tags,
      Err(e) => {
        tracing::warn!(error = %e, host = %self.host, "ollama status probe failed");
        return disabled(format!(
          "Ollama not reachable. Start Ollama and run: ollama pull {}",
          self.model
        ));
      }
    };

    if !tags.models.iter().any(|m| m.name == self.model) {
      return disabled(format!(
        "Model '{}' not found. Run: ollama pull {}",
        self.model, self.model
      ));
    }

    CoachStatus {
      enabled: true,
      provider: PROVIDER.to_string(),
      model: self.model.clone(),
      message: "Configured".to_string(),
    }
  }

  async fn fetch_tags(&self) -> Result<TagsResponse, LlmError> {
    let response = self
      .client
      .get(format!("{}/api/tags", self.host))
      .timeout(self.status_timeout)
      .send()
      .await
      .map_err(|e| LlmError::from_reqwest(e, self.status_timeout))?;

    let status = response.status();
    if !status.is_success() {
      return Err(LlmError::Api(format!("HTTP {}", status)));
    }

    response
      .json::<TagsResponse>()
      .await
      .map_err(|e| LlmError::Parse(e.to_string()))
  }

  /// Send one system + user exchange and return the trimmed reply
  pub async fn chat(&self, system_prompt: &str, user_message: &str) -> Result<String, LlmError> {
    let request = ChatRequest {
      model: &self.model,
      stream: false,
      messages: vec![
        ChatMessage {
          role: "system",
          content: system_prompt,
        },
        ChatMessage {
          role: "user",
          content: user_message,
        },
      ],
      options: ChatOptions {
        temperature: TEMPERATURE,
      },
    };

    let response = self
      .client
      .post(format!("{}/api/chat", self.host))
      .timeout(self.chat_timeout)
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::from_reqwest(e, self.chat_timeout))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::from_reqwest(e, self.chat_timeout))?;

    if !status.is_success() {
      let detail: String = body.chars().take(MAX_ERROR_DETAIL).collect();
      return Err(LlmError::Api(format!("HTTP {}: {}", status, detail)));
    }

    let chat_response: ChatResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    let text = chat_response
      .message
      .map(|m| m.content.trim().to_string())
      .unwrap_or_default();

    if text.is_empty() {
      return Err(LlmError::EmptyResponse);
    }

    Ok(text)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
