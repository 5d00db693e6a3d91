//! Session status as observers see it.
//!
//! The session owns a single authoritative [`StatusSnapshot`] behind a watch
//! channel. Outside this crate the feed is read-only: a snapshot accessor for
//! polling and a [`watch::Receiver`] for change notification. Transitions
//! happen in exactly one place, the session state machine.

use tokio::sync::watch;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
	#[default]
	Closed,
	Connecting,
	Open,
	Closing,
	/// The server rejected the credential during the handshake. A distinct
	/// resting state so observers can prompt for a new password instead of
	/// offering a plain retry.
	AuthenticationError,
}

/// The published status value: connection state plus the most recent
/// diagnostics this core recorded.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
	pub connection: ConnectionStatus,
	/// Human-readable description of the last failure, if any.
	pub last_error: Option<String>,
	/// Set when the configured scene name did not resolve on the server.
	pub invalid_scene_name: bool,
}

/// Single-writer feed of snapshots.
pub(crate) struct StatusFeed {
	tx: watch::Sender<StatusSnapshot>,
}

impl StatusFeed {
	pub(crate) fn new() -> Self {
		let (tx, _rx) = watch::channel(StatusSnapshot::default());
		Self { tx }
	}

	pub(crate) fn snapshot(&self) -> StatusSnapshot {
		self.tx.borrow().clone()
	}

	pub(crate) fn connection(&self) -> ConnectionStatus {
		self.tx.borrow().connection
	}

	pub(crate) fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
		self.tx.subscribe()
	}

	pub(crate) fn set_connection(&self, connection: ConnectionStatus) {
		self.tx.send_modify(|snapshot| snapshot.connection = connection);
	}

	pub(crate) fn record_error(&self, message: impl Into<String>) {
		self.tx
			.send_modify(|snapshot| snapshot.last_error = Some(message.into()));
	}

	pub(crate) fn flag_invalid_scene(&self) {
		self.tx
			.send_modify(|snapshot| snapshot.invalid_scene_name = true);
	}

	/// Enters `Connecting` and drops the previous session's diagnostics; a
	/// new session must not inherit them.
	pub(crate) fn begin_connect(&self) {
		self.tx.send_modify(|snapshot| {
			snapshot.connection = ConnectionStatus::Connecting;
			snapshot.last_error = None;
			snapshot.invalid_scene_name = false;
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn begin_connect_clears_diagnostics() {
		let feed = StatusFeed::new();
		feed.record_error("previous failure");
		feed.flag_invalid_scene();
		feed.set_connection(ConnectionStatus::Closed);

		feed.begin_connect();

		let snapshot = feed.snapshot();
		assert_eq!(snapshot.connection, ConnectionStatus::Connecting);
		assert!(snapshot.last_error.is_none());
		assert!(!snapshot.invalid_scene_name);
	}

	#[tokio::test]
	async fn subscribers_observe_transitions() {
		let feed = StatusFeed::new();
		let mut rx = feed.subscribe();
		assert_eq!(rx.borrow_and_update().connection, ConnectionStatus::Closed);

		feed.set_connection(ConnectionStatus::Connecting);
		rx.changed().await.unwrap();
		assert_eq!(rx.borrow_and_update().connection, ConnectionStatus::Connecting);
	}
}
