//! The session state machine.
//!
//! A [`Session`] owns everything with a lifetime tied to one connection: the
//! authoritative status feed, the `Option<ActiveSession>` slot (at most one
//! live transport, ever), the ready-callback slot, and the service tasks. All
//! status transitions happen here; other components report inward through
//! [`TransportEvent`]s and the dispatcher.
//!
//! Lifecycle: `Closed -> Connecting -> Open -> Closing -> Closed`, with
//! `Connecting -> AuthenticationError` when the server rejects the credential
//! and `Open -> Closed` when the remote hangs up. Every path out of `Open`
//! rejects all in-flight calls with `Disconnected` before it settles.

use std::sync::Arc;

use obsw_protocol::ServerMessage;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::connection::{Connection, spawn_writer};
use crate::error::{Error, Result};
use crate::handshake;
use crate::status::{ConnectionStatus, StatusFeed, StatusSnapshot};
use crate::transport::{Connector, TransportEvent};

#[cfg(test)]
mod tests;

type ReadyCallback = Box<dyn FnOnce() + Send>;

/// One live connection: the dispatcher plus the handle of its dispatch task.
struct ActiveSession {
	connection: Arc<Connection>,
	dispatch: Option<JoinHandle<()>>,
}

/// State shared with the service tasks.
struct Shared {
	status: StatusFeed,
	active: Mutex<Option<ActiveSession>>,
	ready: Mutex<Option<ReadyCallback>>,
}

/// Client-side session manager for one server.
pub struct Session {
	connector: Arc<dyn Connector>,
	shared: Arc<Shared>,
}

impl Session {
	pub fn new(connector: Arc<dyn Connector>) -> Self {
		Self {
			connector,
			shared: Arc::new(Shared {
				status: StatusFeed::new(),
				active: Mutex::new(None),
				ready: Mutex::new(None),
			}),
		}
	}

	/// Registers a callback fired once when the next successful handshake
	/// completes. The slot is consumed by the next `connect()` either way.
	pub fn on_ready(&self, callback: impl FnOnce() + Send + 'static) {
		*self.shared.ready.lock() = Some(Box::new(callback));
	}

	/// Current status snapshot.
	pub fn status(&self) -> StatusSnapshot {
		self.shared.status.snapshot()
	}

	/// Change-notification feed for the status.
	pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
		self.shared.status.subscribe()
	}

	/// Records that the configured scene name did not resolve on the server.
	pub fn flag_invalid_scene(&self) {
		self.shared.status.flag_invalid_scene();
	}

	/// Dials `address`, runs the handshake, and opens the session. Any prior
	/// session is fully torn down first: two live transports must never
	/// coexist.
	pub async fn connect(&self, address: &str, password: Option<&str>) -> Result<()> {
		self.close();
		let ready = self.shared.ready.lock().take();
		self.shared.status.begin_connect();
		tracing::debug!(%address, "connecting");

		let mut parts = match self.connector.connect(address).await {
			Ok(parts) => parts,
			Err(e) => return Err(self.fail_connect(e)),
		};

		if let Err(e) =
			handshake::perform(parts.sender.as_mut(), &mut parts.events, password).await
		{
			return Err(self.fail_connect(e));
		}

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let connection = Arc::new(Connection::new(outbound_tx));
		spawn_writer(parts.sender, outbound_rx);

		*self.shared.active.lock() = Some(ActiveSession {
			connection: connection.clone(),
			dispatch: None,
		});
		let dispatch = spawn_dispatch(self.shared.clone(), connection, parts.events);
		{
			let mut guard = self.shared.active.lock();
			match guard.as_mut() {
				Some(active) => {
					active.dispatch = Some(dispatch);
					// Transition under the lock: a concurrent remote close
					// serializes either before (we fail below) or after
					// (a normal Open -> Closed).
					self.shared.status.set_connection(ConnectionStatus::Open);
				}
				None => {
					// The remote closed in the window after the session was
					// stored; the dispatch task already tore it down.
					return Err(self.fail_connect(Error::Transport(
						"connection closed immediately after identification".to_owned(),
					)));
				}
			}
		}
		tracing::debug!("session open");

		if let Some(ready) = ready {
			ready();
		}
		Ok(())
	}

	/// Tears down the current session: `-> Closing`, close the socket,
	/// reject every in-flight call, `-> Closed`. No-op when there is none.
	pub fn close(&self) {
		let Some(active) = self.shared.active.lock().take() else {
			return;
		};
		tracing::debug!("closing session");
		self.shared.status.set_connection(ConnectionStatus::Closing);
		active.connection.shutdown();
		if let Some(dispatch) = active.dispatch {
			// Stop the dispatch task before draining, so nothing can
			// resolve once rejection has begun.
			dispatch.abort();
		}
		active.connection.fail_all_pending();
		self.shared.status.set_connection(ConnectionStatus::Closed);
	}

	/// Issues one request over the current session. Rejects immediately,
	/// without touching the transport, unless the status is `Open`.
	pub async fn call(&self, request_type: &str, request_data: Option<Value>) -> Result<Value> {
		let connection = {
			let active = self.shared.active.lock();
			match active.as_ref() {
				Some(active)
					if self.shared.status.connection() == ConnectionStatus::Open =>
				{
					active.connection.clone()
				}
				_ => return Err(Error::Disconnected),
			}
		};
		connection.call(request_type, request_data).await
	}

	/// Records a connect failure and settles the status: credential
	/// rejection gets its own resting state, everything else returns to
	/// `Closed`.
	fn fail_connect(&self, error: Error) -> Error {
		self.shared.status.record_error(error.to_string());
		let status = if error.is_authentication_rejected() {
			ConnectionStatus::AuthenticationError
		} else {
			ConnectionStatus::Closed
		};
		self.shared.status.set_connection(status);
		error
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.close();
	}
}

/// Routes transport events for one live session: responses into the pending
/// map, a close into teardown.
fn spawn_dispatch(
	shared: Arc<Shared>,
	connection: Arc<Connection>,
	mut events: mpsc::UnboundedReceiver<TransportEvent>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			match events.recv().await {
				Some(TransportEvent::Message(ServerMessage::RequestResponse(response))) => {
					connection.resolve(response);
				}
				Some(TransportEvent::Message(ServerMessage::Event(event))) => {
					tracing::debug!(event_type = %event.event_type, "ignoring event");
				}
				Some(TransportEvent::Message(message)) => {
					tracing::debug!(?message, "unexpected frame after identification");
				}
				Some(TransportEvent::Closed { code, reason }) => {
					handle_remote_close(&shared, &connection, code, reason);
					return;
				}
				None => {
					handle_remote_close(&shared, &connection, None, None);
					return;
				}
			}
		}
	})
}

/// Teardown for a close the session did not initiate. Guarded by handle
/// identity: a dispatch task outliving its session (superseded by a newer
/// connect) must not touch the successor.
fn handle_remote_close(
	shared: &Shared,
	connection: &Arc<Connection>,
	code: Option<u16>,
	reason: Option<String>,
) {
	let mut guard = shared.active.lock();
	let taken = match guard.as_ref() {
		Some(active) if Arc::ptr_eq(&active.connection, connection) => guard.take(),
		_ => return,
	};
	tracing::debug!(?code, ?reason, "connection closed by remote");
	if let Some(active) = taken {
		active.connection.shutdown();
		active.connection.fail_all_pending();
	}
	if let Some(reason) = reason {
		shared.status.record_error(format!("connection closed: {reason}"));
	}
	shared.status.set_connection(ConnectionStatus::Closed);
}
