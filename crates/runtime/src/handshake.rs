//! The identify handshake.
//!
//! A fresh transport delivers `Hello` first; the client answers with
//! `Identify` (solving the authentication challenge when one is present) and
//! waits for `Identified`. Only then may requests flow. The server signals a
//! bad credential by closing the socket with
//! [`close_code::AUTHENTICATION_FAILED`], which must surface distinguishably
//! from every other connect failure.

use obsw_protocol::{
	ClientMessage, Hello, Identified, Identify, RPC_VERSION, ServerMessage, authentication_string,
	close_code,
};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::transport::{TransportEvent, TransportSender};

/// Drives Hello -> Identify -> Identified on a fresh transport.
pub(crate) async fn perform(
	sender: &mut dyn TransportSender,
	events: &mut mpsc::UnboundedReceiver<TransportEvent>,
	password: Option<&str>,
) -> Result<Identified> {
	let hello = wait_for_hello(events).await?;
	tracing::debug!(
		server = ?hello.obs_web_socket_version,
		rpc = hello.rpc_version,
		auth = hello.authentication.is_some(),
		"received Hello"
	);

	// A challenge with no configured password still gets an answer (for the
	// empty password); the server's 4009 close keeps rejection on the one
	// classification path.
	let authentication = hello
		.authentication
		.as_ref()
		.map(|c| authentication_string(password.unwrap_or(""), &c.salt, &c.challenge));

	sender
		.send(ClientMessage::Identify(Identify {
			rpc_version: RPC_VERSION,
			authentication,
			event_subscriptions: None,
		}))
		.await?;

	loop {
		match events.recv().await {
			Some(TransportEvent::Message(ServerMessage::Identified(identified))) => {
				tracing::debug!(rpc = identified.negotiated_rpc_version, "identified");
				return Ok(identified);
			}
			Some(TransportEvent::Message(message)) => {
				tracing::debug!(?message, "ignoring frame while waiting for Identified");
			}
			Some(TransportEvent::Closed { code, reason }) => {
				return Err(close_during_handshake(code, reason));
			}
			None => return Err(Error::Transport("connection ended before Identified".to_owned())),
		}
	}
}

async fn wait_for_hello(
	events: &mut mpsc::UnboundedReceiver<TransportEvent>,
) -> Result<Hello> {
	loop {
		match events.recv().await {
			Some(TransportEvent::Message(ServerMessage::Hello(hello))) => return Ok(hello),
			Some(TransportEvent::Message(message)) => {
				tracing::debug!(?message, "ignoring frame while waiting for Hello");
			}
			Some(TransportEvent::Closed { code, reason }) => {
				return Err(close_during_handshake(code, reason));
			}
			None => return Err(Error::Transport("connection ended before Hello".to_owned())),
		}
	}
}

fn close_during_handshake(code: Option<u16>, reason: Option<String>) -> Error {
	if code == Some(close_code::AUTHENTICATION_FAILED) {
		return Error::AuthenticationRejected {
			reason: reason.unwrap_or_else(|| "Authentication failed.".to_owned()),
		};
	}
	let detail = match (code, reason) {
		(Some(code), Some(reason)) => {
			format!("connection closed during handshake: {reason} (code {code})")
		}
		(Some(code), None) => format!("connection closed during handshake (code {code})"),
		(None, Some(reason)) => format!("connection closed during handshake: {reason}"),
		(None, None) => "connection closed during handshake".to_owned(),
	};
	Error::Transport(detail)
}
