// Error types for the chat client

use crate::session::providers::ProviderError;

/// Top-level error taxonomy.
///
/// `Config` and `SessionCreation` are fatal: they abort startup before the
/// input loop runs. `Turn` covers everything that can go wrong while sending
/// one message; the loop reports it and keeps going.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
	#[error("configuration error: {0}")]
	Config(String),

	#[error("failed to create chat session: {0}")]
	SessionCreation(String),

	#[error(transparent)]
	Turn(#[from] ProviderError),
}
