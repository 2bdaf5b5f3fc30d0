// Session module for handling interactive chat sessions

pub mod chat; // Conversation loop logic
pub mod providers; // Provider abstraction layer

pub use providers::{AiProvider, ProviderError, ProviderResponse, TokenUsage};

use crate::config::Config;
use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
	pub role: String,
	pub content: String,
	pub timestamp: u64,
}

fn current_timestamp() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

impl Message {
	pub fn user(content: &str) -> Self {
		Self {
			role: "user".to_string(),
			content: content.to_string(),
			timestamp: current_timestamp(),
		}
	}

	pub fn assistant(content: &str) -> Self {
		Self {
			role: "assistant".to_string(),
			content: content.to_string(),
			timestamp: current_timestamp(),
		}
	}
}

/// One conversation with the remote model.
///
/// The transcript lives inside the handle: the Gemini generateContent
/// endpoint is stateless, so every send replays the accumulated messages.
/// Callers only ever see `send(text) -> reply`.
pub struct ChatSession {
	provider: Box<dyn AiProvider>,
	config: Config,
	messages: Vec<Message>,
}

impl std::fmt::Debug for ChatSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChatSession")
			.field("provider", &self.provider.name())
			.field("config", &self.config)
			.field("messages", &self.messages)
			.finish()
	}
}

impl ChatSession {
	/// Open a session bound to the model named in the config
	pub fn open(provider: Box<dyn AiProvider>, config: &Config) -> Result<Self, ChatError> {
		if config.model.trim().is_empty() {
			return Err(ChatError::SessionCreation(
				"model identifier is empty".to_string(),
			));
		}

		Ok(Self {
			provider,
			config: config.clone(),
			messages: Vec::new(),
		})
	}

	pub fn model(&self) -> &str {
		&self.config.model
	}

	/// Number of messages accumulated so far (user and assistant)
	pub fn transcript_len(&self) -> usize {
		self.messages.len()
	}

	/// Send one user message and return the assistant reply.
	///
	/// On success the turn is appended to the transcript. On failure the
	/// pending user message is rolled back so a failed turn leaves no
	/// half-recorded exchange.
	pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
		self.messages.push(Message::user(text));

		let result = self
			.provider
			.chat_completion(&self.messages, &self.config.model, self.config.temperature, &self.config)
			.await;

		match result {
			Ok(response) => {
				if let Some(usage) = &response.usage {
					crate::log_debug!(
						"{} tokens in, {} tokens out",
						usage.prompt_tokens,
						usage.completion_tokens
					);
				}
				self.messages.push(Message::assistant(&response.content));
				Ok(response.content)
			}
			Err(e) => {
				self.messages.pop();
				Err(ChatError::Turn(e))
			}
		}
	}
}
