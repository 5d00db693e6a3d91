//! Error types for the session runtime.
//!
//! Failures fall into a fixed taxonomy that callers branch on: the two
//! recoverable kinds ([`Error::AuthenticationRejected`],
//! [`Error::InvalidSceneName`]) get their own variants and predicates, the
//! rest is reported verbatim as remote or transport failure. Nothing is ever
//! swallowed into a catch-all message.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in a session.
#[derive(Debug, Error)]
pub enum Error {
	/// An operation was attempted without a live, identified session.
	#[error("not connected")]
	Disconnected,

	/// The server rejected the credential during the handshake.
	#[error("authentication rejected: {reason}")]
	AuthenticationRejected {
		/// Close reason reported by the server, if any.
		reason: String,
	},

	/// The configured scene (or a source within it) does not exist on the
	/// server.
	#[error("no scene or source named '{name}': {comment}")]
	InvalidSceneName {
		name: String,
		/// The server's verbatim diagnostic.
		comment: String,
	},

	/// Any other failure the server reported for a request.
	#[error("remote error {code}: {message}")]
	Remote {
		/// Request-status code from the response frame.
		code: u16,
		/// The server's verbatim comment.
		message: String,
	},

	/// Dial, send, receive, or parse failure below the protocol layer.
	#[error("transport error: {0}")]
	Transport(String),
}

impl Error {
	/// Returns true if this is the no-live-session error.
	pub fn is_disconnected(&self) -> bool {
		matches!(self, Error::Disconnected)
	}

	/// Returns true if the handshake credential was rejected. Callers use
	/// this to offer a re-enter-password path instead of a generic retry.
	pub fn is_authentication_rejected(&self) -> bool {
		matches!(self, Error::AuthenticationRejected { .. })
	}

	/// Returns true if the configured scene name did not resolve.
	pub fn is_invalid_scene_name(&self) -> bool {
		matches!(self, Error::InvalidSceneName { .. })
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::Transport(format!("malformed payload: {e}"))
	}
}
