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

// Provider abstraction layer for the remote conversational-AI service

use crate::config::Config;
use crate::session::Message;
use serde::{Deserialize, Serialize};

pub mod google;

pub use google::GeminiProvider;

/// Errors raised by a provider while completing one turn.
///
/// Transport failures and service-side failures are distinguished so
/// diagnostics name the actual problem; the loop treats all of them the
/// same way (report and continue).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
	#[error("network error: {0}")]
	Network(String),

	#[error("rate limited by the API")]
	RateLimited,

	#[error("API error (HTTP {status}): {message}")]
	Api { status: u16, message: String },

	#[error("failed to parse API response: {0}")]
	Parse(String),

	#[error("response blocked by the service: {0}")]
	Blocked(String),
}

/// Common token usage structure
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenUsage {
	pub prompt_tokens: u64,
	pub completion_tokens: u64,
	pub total_tokens: u64,
}

/// Provider response containing the AI completion
#[derive(Debug, Clone)]
pub struct ProviderResponse {
	pub content: String,
	pub usage: Option<TokenUsage>,
}

/// Trait that all AI providers must implement
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
	/// Get the provider name (e.g., "gemini")
	fn name(&self) -> &str;

	/// Send a chat completion request over the whole transcript
	async fn chat_completion(
		&self,
		messages: &[Message],
		model: &str,
		temperature: f32,
		config: &Config,
	) -> Result<ProviderResponse, ProviderError>;
}
