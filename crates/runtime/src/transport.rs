//! Transport seam between the session and the socket.
//!
//! The session never touches a socket type directly: a [`Connector`] turns an
//! address into [`TransportParts`] - a boxed frame sink plus a channel of
//! [`TransportEvent`]s. The production connector speaks WebSocket via
//! tokio-tungstenite and spawns a pump task that parses inbound text frames;
//! tests substitute scripted connectors.
//!
//! The pump emits [`TransportEvent::Closed`] exactly once, for every way a
//! socket can end: a close frame (carrying the server's close code, which the
//! handshake needs to tell credential rejection apart from everything else),
//! a read error, or plain EOF.

use futures_util::future::BoxFuture;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use obsw_protocol::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{Error, Result};

/// What the transport delivers to the session.
#[derive(Debug)]
pub enum TransportEvent {
	/// A parsed protocol frame.
	Message(ServerMessage),
	/// The socket ended. Sent exactly once, last.
	Closed {
		/// WebSocket close code, when the peer sent a close frame.
		code: Option<u16>,
		/// Close reason or error text, when there was one.
		reason: Option<String>,
	},
}

/// Outbound half of an established transport.
pub trait TransportSender: Send + 'static {
	/// Serializes and sends one frame.
	fn send(&mut self, message: ClientMessage) -> BoxFuture<'_, Result<()>>;

	/// Closes the connection gracefully.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// An established transport, ready for the handshake.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Establishes transports. One implementation per wire; the session holds it
/// behind `Arc<dyn Connector>` so tests can script the remote end.
pub trait Connector: Send + Sync + 'static {
	/// Dials `address` and returns the connected transport. Failures here are
	/// the one-shot connect-failure signal; after success all failures arrive
	/// as [`TransportEvent::Closed`].
	fn connect(&self, address: &str) -> BoxFuture<'_, Result<TransportParts>>;
}

/// The production transport: a WebSocket client connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

struct WebSocketSender {
	sink: WsSink,
}

impl TransportSender for WebSocketSender {
	fn send(&mut self, message: ClientMessage) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			self.sink
				.send(Message::Text(text))
				.await
				.map_err(|e| Error::Transport(format!("send failed: {e}")))
		})
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.sink
				.close()
				.await
				.map_err(|e| Error::Transport(format!("close failed: {e}")))
		})
	}
}

impl Connector for WebSocketConnector {
	fn connect(&self, address: &str) -> BoxFuture<'_, Result<TransportParts>> {
		let address = address.to_owned();
		Box::pin(async move {
			let (socket, _response) = connect_async(address.as_str())
				.await
				.map_err(|e| Error::Transport(format!("connect to {address} failed: {e}")))?;
			tracing::debug!(%address, "websocket connected");

			let (sink, mut stream) = socket.split();
			let (events_tx, events_rx) = mpsc::unbounded_channel();

			tokio::spawn(async move {
				while let Some(frame) = stream.next().await {
					match frame {
						Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
							Ok(message) => {
								if events_tx.send(TransportEvent::Message(message)).is_err() {
									// Session is gone; stop pumping.
									return;
								}
							}
							Err(e) => {
								tracing::warn!(error = %e, "discarding unparseable frame");
							}
						},
						Ok(Message::Close(frame)) => {
							let (code, reason) = close_details(frame);
							tracing::debug!(?code, ?reason, "websocket closed by peer");
							let _ = events_tx.send(TransportEvent::Closed { code, reason });
							return;
						}
						Ok(_) => {
							// Ping/pong are handled by tungstenite; binary
							// frames are not part of this protocol.
						}
						Err(e) => {
							let _ = events_tx.send(TransportEvent::Closed {
								code: None,
								reason: Some(e.to_string()),
							});
							return;
						}
					}
				}
				let _ = events_tx.send(TransportEvent::Closed {
					code: None,
					reason: None,
				});
			});

			Ok(TransportParts {
				sender: Box::new(WebSocketSender { sink }),
				events: events_rx,
			})
		})
	}
}

fn close_details(frame: Option<CloseFrame<'_>>) -> (Option<u16>, Option<String>) {
	match frame {
		Some(frame) => {
			let reason = (!frame.reason.is_empty()).then(|| frame.reason.into_owned());
			(Some(frame.code.into()), reason)
		}
		None => (None, None),
	}
}
