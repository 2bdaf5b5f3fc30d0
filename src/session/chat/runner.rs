// Interactive session runner

use super::animation::show_loading_animation;
use super::input::{InputSource, ReaderInput, TerminalInput};
use super::is_exit_command;
use crate::config::Config;
use crate::log_info;
use crate::session::providers::GeminiProvider;
use crate::session::ChatSession;
use anyhow::Result;
use colored::*;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const BANNER: &str = "--- Chat Started (Type 'quit' to stop) ---";
const FAREWELL: &str = "Gemini: Goodbye!";

/// Open a session against the real API and run the loop on stdin/stdout
pub async fn run_interactive_session(config: &Config) -> Result<()> {
	// Resolve the credential first: a missing key never reaches the input loop
	let api_key = config.api_key()?;
	let provider = GeminiProvider::new(api_key)?;
	let mut session = ChatSession::open(Box::new(provider), config)?;

	log_info!("Session bound to model {}", session.model());

	let mut input: Box<dyn InputSource> = if atty::is(atty::Stream::Stdin) {
		Box::new(TerminalInput::new()?)
	} else {
		// Piped input: plain line reads, no line editor
		Box::new(ReaderInput::new(std::io::BufReader::new(std::io::stdin())))
	};

	let mut out = std::io::stdout();
	run_session_loop(&mut session, input.as_mut(), &mut out).await
}

/// The conversation loop.
///
/// Reads one line at a time, ends on an exit word or end of input, forwards
/// everything else through the session and reports the reply. A failed send
/// is printed and the loop continues with the next line.
pub async fn run_session_loop<W: Write>(
	session: &mut ChatSession,
	input: &mut dyn InputSource,
	out: &mut W,
) -> Result<()> {
	writeln!(out, "{}", BANNER.bright_green())?;

	loop {
		if !input.is_interactive() {
			// The prompt rustyline draws itself on the interactive path
			write!(out, "{}", "You: ".bright_blue())?;
			out.flush()?;
		}

		let line = match input.read_line()? {
			Some(line) => line,
			None => {
				// End of input behaves exactly like an exit word
				writeln!(out, "{}", FAREWELL.bright_green())?;
				break;
			}
		};

		if line.trim().is_empty() {
			continue;
		}

		if is_exit_command(&line) {
			writeln!(out, "{}", FAREWELL.bright_green())?;
			break;
		}

		// Spinner only when a human is waiting on a terminal
		let spinner = if input.is_interactive() {
			let cancel = Arc::new(AtomicBool::new(false));
			let handle = tokio::spawn(show_loading_animation(cancel.clone()));
			Some((cancel, handle))
		} else {
			None
		};

		let result = session.send(&line).await;

		if let Some((cancel, handle)) = spinner {
			cancel.store(true, Ordering::SeqCst);
			let _ = handle.await;
		}

		match result {
			Ok(reply) => {
				// Blank line after the reply for readability between turns
				writeln!(out, "{}\n", format!("Gemini: {}", reply).bright_green())?;
			}
			Err(e) => {
				// A single bad turn never terminates the session
				writeln!(out, "{}", format!("Error: {}", e).bright_red())?;
			}
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::providers::{AiProvider, ProviderError, ProviderResponse};
	use crate::session::Message;
	use async_trait::async_trait;
	use std::collections::VecDeque;
	use std::io::Cursor;
	use std::sync::Mutex;

	struct ScriptedProvider {
		replies: Mutex<VecDeque<Result<String, ProviderError>>>,
		sent: Arc<Mutex<Vec<String>>>,
	}

	#[async_trait]
	impl AiProvider for ScriptedProvider {
		fn name(&self) -> &str {
			"scripted"
		}

		async fn chat_completion(
			&self,
			messages: &[Message],
			_model: &str,
			_temperature: f32,
			_config: &Config,
		) -> Result<ProviderResponse, ProviderError> {
			self.sent
				.lock()
				.unwrap()
				.push(messages.last().unwrap().content.clone());
			match self.replies.lock().unwrap().pop_front() {
				Some(Ok(content)) => Ok(ProviderResponse { content, usage: None }),
				Some(Err(e)) => Err(e),
				None => Ok(ProviderResponse {
					content: "ok".to_string(),
					usage: None,
				}),
			}
		}
	}

	// Run the loop over scripted stdin lines, returning (sent messages, output)
	async fn run_scripted(
		stdin: &str,
		replies: Vec<Result<String, ProviderError>>,
	) -> (Vec<String>, String) {
		colored::control::set_override(false);

		let sent = Arc::new(Mutex::new(Vec::new()));
		let provider = ScriptedProvider {
			replies: Mutex::new(replies.into_iter().collect()),
			sent: sent.clone(),
		};
		let mut session = ChatSession::open(Box::new(provider), &Config::default()).unwrap();

		let mut input = ReaderInput::new(Cursor::new(stdin.to_string()));
		let mut out = Vec::new();
		run_session_loop(&mut session, &mut input, &mut out)
			.await
			.unwrap();

		let sent = sent.lock().unwrap().clone();
		(sent, String::from_utf8(out).unwrap())
	}

	#[tokio::test]
	async fn test_exit_words_terminate_without_a_send() {
		for word in ["quit", "QUIT", "Exit", "bye", "BYE"] {
			let (sent, output) = run_scripted(&format!("{}\n", word), vec![]).await;
			assert!(sent.is_empty(), "{} must not trigger a send", word);
			assert!(output.contains("Gemini: Goodbye!"));
		}
	}

	#[tokio::test]
	async fn test_hello_then_quit_end_to_end() {
		let (sent, output) =
			run_scripted("hello\nquit\n", vec![Ok("Hi there!".to_string())]).await;

		assert_eq!(sent, vec!["hello".to_string()]);
		// Exactly one reply line, then a blank line, then the farewell
		assert!(output.contains("Gemini: Hi there!\n\n"));
		assert!(output.ends_with("Gemini: Goodbye!\n"));
		assert_eq!(output.matches("Gemini: Hi there!").count(), 1);
	}

	#[tokio::test]
	async fn test_failed_turn_reports_and_continues() {
		let (sent, output) = run_scripted(
			"boom\nhello\nquit\n",
			vec![
				Err(ProviderError::Network("connection reset".to_string())),
				Ok("recovered".to_string()),
			],
		)
		.await;

		assert_eq!(sent.len(), 2);
		assert!(output.contains("Error: network error: connection reset"));
		// The next prompt is still offered after the error
		let error_pos = output.find("Error:").unwrap();
		assert!(output[error_pos..].contains("You: "));
		assert!(output.contains("Gemini: recovered"));
		assert!(output.ends_with("Gemini: Goodbye!\n"));
	}

	#[tokio::test]
	async fn test_end_of_input_terminates_like_an_exit_word() {
		let (sent, output) = run_scripted("", vec![]).await;
		assert!(sent.is_empty());
		assert!(output.contains("Gemini: Goodbye!"));
	}

	#[tokio::test]
	async fn test_end_of_input_after_a_turn() {
		let (sent, output) = run_scripted("hello\n", vec![Ok("Hi".to_string())]).await;
		assert_eq!(sent.len(), 1);
		assert!(output.contains("Gemini: Hi"));
		assert!(output.ends_with("Gemini: Goodbye!\n"));
	}

	#[tokio::test]
	async fn test_empty_lines_are_skipped() {
		let (sent, output) = run_scripted("\n   \nquit\n", vec![]).await;
		assert!(sent.is_empty());
		assert!(output.contains("Gemini: Goodbye!"));
	}

	#[tokio::test]
	async fn test_banner_printed_before_first_prompt() {
		let (_, output) = run_scripted("quit\n", vec![]).await;
		let banner_pos = output.find(BANNER).unwrap();
		let prompt_pos = output.find("You: ").unwrap();
		assert!(banner_pos < prompt_pos);
	}

	#[tokio::test]
	async fn test_rate_limit_is_reported_inline() {
		let (_, output) = run_scripted(
			"hello\nquit\n",
			vec![Err(ProviderError::RateLimited)],
		)
		.await;
		assert!(output.contains("Error: rate limited by the API"));
		assert!(output.ends_with("Gemini: Goodbye!\n"));
	}
}
