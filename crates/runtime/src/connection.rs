//! Request/response correlation over one transport.
//!
//! A [`Connection`] multiplexes any number of concurrent command calls over
//! the single socket. Each call gets a correlation id from an atomic counter,
//! parks a oneshot sender in the pending map, and enqueues its frame for the
//! writer task. The session's dispatch loop feeds matching responses back via
//! [`Connection::resolve`]; teardown drains the whole map via
//! [`Connection::fail_all_pending`] so no call is ever left permanently
//! pending. Responses may arrive in any order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use obsw_protocol::{ClientMessage, Request, RequestResponse};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::transport::TransportSender;

/// Items on the outbound queue consumed by the writer task.
pub(crate) enum Outbound {
	Frame(ClientMessage),
	/// Close the socket gracefully and stop the writer.
	Shutdown,
}

type PendingMap = Mutex<HashMap<String, oneshot::Sender<Result<Value>>>>;

/// The dispatcher for one live session.
pub(crate) struct Connection {
	next_id: AtomicU64,
	pending: PendingMap,
	outbound: mpsc::UnboundedSender<Outbound>,
}

/// Removes a call's pending entry if its future is dropped before the
/// response arrives; harmless after normal resolution.
struct PendingGuard<'a> {
	pending: &'a PendingMap,
	request_id: &'a str,
}

impl Drop for PendingGuard<'_> {
	fn drop(&mut self) {
		self.pending.lock().remove(self.request_id);
	}
}

impl Connection {
	pub(crate) fn new(outbound: mpsc::UnboundedSender<Outbound>) -> Self {
		Self {
			next_id: AtomicU64::new(0),
			pending: Mutex::new(HashMap::new()),
			outbound,
		}
	}

	/// Sends one request and suspends until its correlated response arrives
	/// or the session tears down. No timeout: the server is assumed
	/// co-located and responsive.
	pub(crate) async fn call(
		&self,
		request_type: &str,
		request_data: Option<Value>,
	) -> Result<Value> {
		let request_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
		tracing::debug!(%request_id, request_type, "sending request");

		let (tx, rx) = oneshot::channel();
		self.pending.lock().insert(request_id.clone(), tx);
		let _guard = PendingGuard {
			pending: &self.pending,
			request_id: &request_id,
		};

		let frame = ClientMessage::Request(Request {
			request_type: request_type.to_owned(),
			request_id: request_id.clone(),
			request_data,
		});
		if self.outbound.send(Outbound::Frame(frame)).is_err() {
			return Err(Error::Disconnected);
		}

		match rx.await {
			Ok(result) => result,
			// Sender dropped without a verdict: the session was torn down.
			Err(_) => Err(Error::Disconnected),
		}
	}

	/// Settles the pending call matching this response, if one exists.
	pub(crate) fn resolve(&self, response: RequestResponse) {
		let Some(tx) = self.pending.lock().remove(&response.request_id) else {
			tracing::debug!(
				request_id = %response.request_id,
				"response for unknown request"
			);
			return;
		};
		let status = response.request_status;
		let result = if status.result {
			Ok(response.response_data.unwrap_or(Value::Null))
		} else {
			Err(Error::Remote {
				code: status.code,
				message: status
					.comment
					.unwrap_or_else(|| "request failed".to_owned()),
			})
		};
		let _ = tx.send(result);
	}

	/// Rejects every in-flight call with `Disconnected`. Part of every
	/// teardown path; nothing may stay pending once the session leaves
	/// `Open`.
	pub(crate) fn fail_all_pending(&self) {
		let drained: Vec<_> = {
			let mut pending = self.pending.lock();
			pending.drain().collect()
		};
		if !drained.is_empty() {
			tracing::debug!(count = drained.len(), "rejecting in-flight requests");
		}
		for (_, tx) in drained {
			let _ = tx.send(Err(Error::Disconnected));
		}
	}

	/// Tells the writer task to close the socket and exit.
	pub(crate) fn shutdown(&self) {
		let _ = self.outbound.send(Outbound::Shutdown);
	}
}

/// Forwards queued frames to the transport until shutdown or write failure.
pub(crate) fn spawn_writer(
	mut sender: Box<dyn TransportSender>,
	mut queue: mpsc::UnboundedReceiver<Outbound>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		while let Some(item) = queue.recv().await {
			match item {
				Outbound::Frame(frame) => {
					if let Err(e) = sender.send(frame).await {
						tracing::warn!(error = %e, "transport write failed");
						return;
					}
				}
				Outbound::Shutdown => {
					if let Err(e) = sender.close().await {
						tracing::debug!(error = %e, "transport close reported an error");
					}
					return;
				}
			}
		}
	})
}
