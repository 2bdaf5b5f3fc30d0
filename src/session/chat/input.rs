// User input handling module

use anyhow::Result;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::{CompletionType, Config as RustylineConfig, EditMode, Editor};
use std::io::BufRead;

/// One line of user input at a time.
///
/// `Ok(Some(line))` is a line to process (possibly empty, the loop skips
/// those), `Ok(None)` is end of input and ends the session like an exit word.
pub trait InputSource {
	fn read_line(&mut self) -> Result<Option<String>>;

	/// Whether a human is typing on the other end (enables the spinner
	/// and lets rustyline own the prompt)
	fn is_interactive(&self) -> bool {
		false
	}
}

/// Interactive terminal input backed by rustyline
pub struct TerminalInput {
	editor: Editor<(), rustyline::history::FileHistory>,
}

impl TerminalInput {
	pub fn new() -> Result<Self> {
		// Configure rustyline
		let config = RustylineConfig::builder()
			.completion_type(CompletionType::List)
			.edit_mode(EditMode::Emacs)
			.auto_add_history(true) // Automatically add lines to history
			.bell_style(rustyline::config::BellStyle::None) // No bell
			.build();

		Ok(Self {
			editor: Editor::with_config(config)?,
		})
	}
}

impl InputSource for TerminalInput {
	fn read_line(&mut self) -> Result<Option<String>> {
		let prompt = "You: ".bright_blue().to_string();

		match self.editor.readline(&prompt) {
			Ok(line) => Ok(Some(line)),
			Err(ReadlineError::Interrupted) => {
				// Ctrl+C cancels the current line, not the session
				println!("\nCancelled");
				Ok(Some(String::new()))
			}
			Err(ReadlineError::Eof) => Ok(None),
			Err(err) => Err(anyhow::anyhow!("error reading input: {}", err)),
		}
	}

	fn is_interactive(&self) -> bool {
		true
	}
}

/// Line input from any reader: piped stdin, or a scripted conversation in tests
pub struct ReaderInput<R: BufRead> {
	reader: R,
}

impl<R: BufRead> ReaderInput<R> {
	pub fn new(reader: R) -> Self {
		Self { reader }
	}
}

impl<R: BufRead> InputSource for ReaderInput<R> {
	fn read_line(&mut self) -> Result<Option<String>> {
		let mut line = String::new();
		let bytes = self.reader.read_line(&mut line)?;
		if bytes == 0 {
			return Ok(None);
		}
		// Strip the line terminator
		while line.ends_with('\n') || line.ends_with('\r') {
			line.pop();
		}
		Ok(Some(line))
	}
}
