// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Google Gemini API provider implementation

use super::{AiProvider, ProviderError, ProviderResponse, TokenUsage};
use crate::config::Config;
use crate::error::ChatError;
use crate::session::Message;
use std::time::Duration;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Google Gemini provider speaking the generateContent REST API
pub struct GeminiProvider {
	client: reqwest::Client,
	api_key: String,
	base_url: String,
}

impl GeminiProvider {
	pub fn new(api_key: String) -> Result<Self, ChatError> {
		let client = reqwest::Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| ChatError::SessionCreation(format!("failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			api_key,
			base_url: GEMINI_API_BASE.to_string(),
		})
	}

	/// Point the provider at a different API base (used by tests)
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	fn api_url(&self, model: &str) -> String {
		format!("{}/{}:generateContent", self.base_url, model)
	}
}

// Convert our session messages to the Gemini wire format
fn convert_messages(messages: &[Message]) -> Vec<serde_json::Value> {
	messages
		.iter()
		.map(|msg| {
			let role = match msg.role.as_str() {
				"assistant" => "model",
				_ => "user",
			};
			serde_json::json!({
				"role": role,
				"parts": [{ "text": msg.content }]
			})
		})
		.collect()
}

fn build_request_body(messages: &[Message], temperature: f32, max_output_tokens: u32) -> serde_json::Value {
	serde_json::json!({
		"contents": convert_messages(messages),
		"generationConfig": {
			"temperature": temperature,
			"maxOutputTokens": max_output_tokens,
			"candidateCount": 1
		}
	})
}

// Extract the reply text and token usage from a generateContent response
fn parse_response(response_json: &serde_json::Value) -> Result<ProviderResponse, ProviderError> {
	let candidates = response_json
		.get("candidates")
		.and_then(|c| c.as_array())
		.filter(|c| !c.is_empty());

	let candidates = match candidates {
		Some(c) => c,
		None => {
			// A candidate-free body usually means the prompt was blocked
			if let Some(reason) = response_json
				.pointer("/promptFeedback/blockReason")
				.and_then(|r| r.as_str())
			{
				return Err(ProviderError::Blocked(reason.to_string()));
			}
			return Err(ProviderError::Parse("no candidates in response".to_string()));
		}
	};

	let mut content = String::new();
	if let Some(parts) = candidates[0]
		.pointer("/content/parts")
		.and_then(|p| p.as_array())
	{
		for part in parts {
			if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
				content.push_str(text);
			}
		}
	}

	if content.is_empty() {
		// The model produced a candidate but no text, surface the finish reason
		let reason = candidates[0]
			.get("finishReason")
			.and_then(|r| r.as_str())
			.unwrap_or("no text in candidate");
		return Err(ProviderError::Blocked(reason.to_string()));
	}

	let usage = response_json.get("usageMetadata").map(|usage_obj| {
		let prompt_tokens = usage_obj
			.get("promptTokenCount")
			.and_then(|v| v.as_u64())
			.unwrap_or(0);
		let completion_tokens = usage_obj
			.get("candidatesTokenCount")
			.and_then(|v| v.as_u64())
			.unwrap_or(0);
		let total_tokens = usage_obj
			.get("totalTokenCount")
			.and_then(|v| v.as_u64())
			.unwrap_or(prompt_tokens + completion_tokens);

		TokenUsage {
			prompt_tokens,
			completion_tokens,
			total_tokens,
		}
	});

	Ok(ProviderResponse { content, usage })
}

#[async_trait::async_trait]
impl AiProvider for GeminiProvider {
	fn name(&self) -> &str {
		"gemini"
	}

	async fn chat_completion(
		&self,
		messages: &[Message],
		model: &str,
		temperature: f32,
		config: &Config,
	) -> Result<ProviderResponse, ProviderError> {
		let request_body = build_request_body(messages, temperature, config.max_output_tokens);

		crate::log_debug!("Gemini request: model={}, {} messages", model, messages.len());

		let response = self
			.client
			.post(self.api_url(model))
			.header("content-type", "application/json")
			.header("x-goog-api-key", &self.api_key)
			.json(&request_body)
			.send()
			.await
			.map_err(|e| ProviderError::Network(e.to_string()))?;

		let status = response.status();
		if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
			return Err(ProviderError::RateLimited);
		}

		let response_text = response
			.text()
			.await
			.map_err(|e| ProviderError::Network(e.to_string()))?;

		if !status.is_success() {
			// Surface the service's own error message when the body carries one
			let message = serde_json::from_str::<serde_json::Value>(&response_text)
				.ok()
				.and_then(|json| {
					json.pointer("/error/message")
						.and_then(|m| m.as_str())
						.map(|m| m.to_string())
				})
				.unwrap_or(response_text);
			return Err(ProviderError::Api {
				status: status.as_u16(),
				message,
			});
		}

		let response_json: serde_json::Value = serde_json::from_str(&response_text)
			.map_err(|e| ProviderError::Parse(e.to_string()))?;

		parse_response(&response_json)
	}
}
