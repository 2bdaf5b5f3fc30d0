use anyhow::Result;
use clap::Parser;
use gemchat::config::{self, Config, LogLevel};
use gemchat::log_error;
use gemchat::session::chat::run_interactive_session;

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(version = "0.1.0")]
#[command(about = "Interactive terminal chat with Google Gemini")]
struct GemchatArgs {
	/// Model to use instead of the one configured in config (runtime only, not saved)
	#[arg(long)]
	model: Option<String>,

	/// Temperature for the AI response (0.0 to 2.0, runtime only, not saved)
	#[arg(long)]
	temperature: Option<f32>,

	/// Log level: none, info or debug (runtime only, not saved)
	#[arg(long)]
	log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
	// Pull a local .env into the process environment before touching config.
	// A missing file is fine.
	let _ = dotenv::dotenv();

	let args = GemchatArgs::parse();

	// Load configuration (file + environment)
	let mut config = Config::load()?;

	// Apply runtime-only overrides from the command line
	if let Some(model) = args.model {
		config.model = model;
	}
	if let Some(temperature) = args.temperature {
		config.temperature = temperature;
	}
	if let Some(level) = args.log_level {
		match level.to_lowercase().as_str() {
			"none" => config.log_level = LogLevel::None,
			"info" => config.log_level = LogLevel::Info,
			"debug" => config.log_level = LogLevel::Debug,
			other => {
				log_error!("Unknown log level: {}. Valid levels are 'none', 'info' or 'debug'.", other);
			}
		}
	}

	// Set the thread-local config for logging macros
	config::set_thread_config(&config);

	run_interactive_session(&config).await
}
