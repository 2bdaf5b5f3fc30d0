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

// Configuration loading and leveled logging macros

use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::Path;

// Environment variables checked for the API credential, in order
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
	#[serde(rename = "none")]
	None,
	#[serde(rename = "info")]
	Info,
	#[serde(rename = "debug")]
	Debug,
}

impl Default for LogLevel {
	fn default() -> Self {
		Self::None
	}
}

impl LogLevel {
	/// Check if info logging is enabled
	pub fn is_info_enabled(&self) -> bool {
		matches!(self, LogLevel::Info | LogLevel::Debug)
	}

	/// Check if debug logging is enabled
	pub fn is_debug_enabled(&self) -> bool {
		matches!(self, LogLevel::Debug)
	}
}

// Default functions
fn default_model() -> String {
	"gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
	0.7
}

fn default_max_output_tokens() -> u32 {
	8192
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
	#[serde(default)]
	pub log_level: LogLevel,

	// Model identifier the chat session is bound to
	#[serde(default = "default_model")]
	pub model: String,

	#[serde(default = "default_temperature")]
	pub temperature: f32,

	#[serde(default = "default_max_output_tokens")]
	pub max_output_tokens: u32,

	// API key from the config file. Environment variables take precedence.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_key: Option<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_level: LogLevel::default(),
			model: default_model(),
			temperature: default_temperature(),
			max_output_tokens: default_max_output_tokens(),
			api_key: None,
		}
	}
}

impl Config {
	/// Load configuration from the system-wide config file, then apply
	/// environment variables on top
	pub fn load() -> Result<Self, ChatError> {
		let config_path = crate::directories::get_config_file_path()
			.map_err(|e| ChatError::Config(e.to_string()))?;

		let mut config = if config_path.exists() {
			Self::read_config_file(&config_path)?
		} else {
			Config::default()
		};

		config.apply_env();
		Ok(config)
	}

	/// Load configuration from a specific file path (environment still wins)
	pub fn load_from_path(path: &Path) -> Result<Self, ChatError> {
		let mut config = Self::read_config_file(path)?;
		config.apply_env();
		Ok(config)
	}

	fn read_config_file(path: &Path) -> Result<Self, ChatError> {
		let config_str = fs::read_to_string(path).map_err(|e| {
			ChatError::Config(format!("failed to read config from {}: {}", path.display(), e))
		})?;
		toml::from_str(&config_str).map_err(|e| {
			ChatError::Config(format!("failed to parse {}: {}", path.display(), e))
		})
	}

	// Environment variables take precedence over config file values
	fn apply_env(&mut self) {
		if let Ok(key) = std::env::var(GEMINI_API_KEY_ENV) {
			self.api_key = Some(key);
		} else if let Ok(key) = std::env::var(GOOGLE_API_KEY_ENV) {
			self.api_key = Some(key);
		}
	}

	/// The resolved API credential. A missing or blank key is a fatal
	/// configuration error and the caller never reaches the input loop.
	pub fn api_key(&self) -> Result<String, ChatError> {
		match &self.api_key {
			Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
			_ => Err(ChatError::Config(format!(
				"no API key configured. Set {} (or {}) in the environment, a local .env file, or api_key in the config file",
				GEMINI_API_KEY_ENV, GOOGLE_API_KEY_ENV
			))),
		}
	}

	/// Get the global log level
	pub fn get_log_level(&self) -> LogLevel {
		self.log_level.clone()
	}
}

// Logging macros for different log levels
// These macros automatically check the current log level and only print if appropriate

thread_local! {
	static CURRENT_CONFIG: RefCell<Option<Config>> = const { RefCell::new(None) };
}

/// Set the current config for the thread (to be used by logging macros)
pub fn set_thread_config(config: &Config) {
	CURRENT_CONFIG.with(|c| {
		*c.borrow_mut() = Some(config.clone());
	});
}

/// Get the current config for the thread
pub fn with_thread_config<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Config) -> R,
{
	CURRENT_CONFIG.with(|c| (*c.borrow()).as_ref().map(f))
}

/// Info logging macro with automatic cyan coloring
/// Shows info messages when log level is Info OR Debug
#[macro_export]
macro_rules! log_info {
	($fmt:expr) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_info_enabled()) {
		if should_log {
		use colored::Colorize;
		println!("{}", $fmt.cyan());
		}
		}
	};
	($fmt:expr, $($arg:expr),*) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_info_enabled()) {
		if should_log {
		use colored::Colorize;
	println!("{}", format!($fmt, $($arg),*).cyan());
	}
	}
	};
}

/// Debug logging macro with automatic bright blue coloring
#[macro_export]
macro_rules! log_debug {
	($fmt:expr) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_debug_enabled()) {
		if should_log {
		use colored::Colorize;
		println!("{}", $fmt.bright_blue());
		}
		}
	};
	($fmt:expr, $($arg:expr),*) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_debug_enabled()) {
		if should_log {
		use colored::Colorize;
	println!("{}", format!($fmt, $($arg),*).bright_blue());
	}
	}
	};
}

/// Error logging macro with automatic bright red coloring
/// Always visible regardless of log level (errors should always be shown)
#[macro_export]
macro_rules! log_error {
	($fmt:expr) => {{
		use colored::Colorize;
		eprintln!("{}", $fmt.bright_red());
		}};
	($fmt:expr, $($arg:expr),*) => {{
		use colored::Colorize;
		eprintln!("{}", format!($fmt, $($arg),*).bright_red());
		}};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = Config::default();
		assert_eq!(config.model, "gemini-2.5-flash");
		assert_eq!(config.temperature, 0.7);
		assert_eq!(config.max_output_tokens, 8192);
		assert_eq!(config.log_level, LogLevel::None);
		assert!(config.api_key.is_none());
	}

	#[test]
	fn test_parse_toml_with_partial_fields() {
		let config: Config = toml::from_str("model = \"gemini-2.5-pro\"\nlog_level = \"debug\"").unwrap();
		assert_eq!(config.model, "gemini-2.5-pro");
		assert!(config.log_level.is_debug_enabled());
		// Unspecified fields fall back to defaults
		assert_eq!(config.max_output_tokens, 8192);
	}

	#[test]
	fn test_api_key_missing_is_configuration_error() {
		let config = Config::default();
		let err = config.api_key().unwrap_err();
		assert!(matches!(err, ChatError::Config(_)));
	}

	#[test]
	fn test_api_key_blank_is_configuration_error() {
		let config = Config {
			api_key: Some("   ".to_string()),
			..Default::default()
		};
		assert!(matches!(config.api_key(), Err(ChatError::Config(_))));
	}

	#[test]
	fn test_api_key_trimmed() {
		let config = Config {
			api_key: Some(" secret-key \n".to_string()),
			..Default::default()
		};
		assert_eq!(config.api_key().unwrap(), "secret-key");
	}

	#[test]
	fn test_load_from_path_env_takes_precedence() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, "api_key = \"file-key\"\nmodel = \"gemini-2.5-pro\"").unwrap();

		std::env::set_var(GEMINI_API_KEY_ENV, "env-key");
		let config = Config::load_from_path(&path).unwrap();
		std::env::remove_var(GEMINI_API_KEY_ENV);

		// Environment wins over the file for the credential
		assert_eq!(config.api_key().unwrap(), "env-key");
		// Non-credential fields come from the file
		assert_eq!(config.model, "gemini-2.5-pro");
	}

	#[test]
	fn test_load_from_path_invalid_toml_is_configuration_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		fs::write(&path, "model = [broken").unwrap();

		assert!(matches!(Config::load_from_path(&path), Err(ChatError::Config(_))));
	}

	#[test]
	fn test_log_level_gating() {
		assert!(!LogLevel::None.is_info_enabled());
		assert!(LogLevel::Info.is_info_enabled());
		assert!(!LogLevel::Info.is_debug_enabled());
		assert!(LogLevel::Debug.is_info_enabled());
		assert!(LogLevel::Debug.is_debug_enabled());
	}
}
