//! Session runtime for obsw - lifecycle, transport, and request correlation.
//!
//! This crate provides the machinery between the caller-facing client and the
//! socket:
//!
//! - **Transport**: the [`Connector`]/[`TransportSender`] seam and the
//!   production WebSocket implementation
//! - **Session**: the connection lifecycle state machine, the single owner of
//!   [`ConnectionStatus`]
//! - **Dispatcher**: request/response correlation for any number of
//!   concurrent in-flight calls over the one socket
//! - **Errors**: the fixed taxonomy callers branch on
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │     obsw     │  Typed commands (video settings, scene items, ...)
//! └──────┬───────┘
//! ┌──────▼───────┐
//! │ obsw-runtime │  This crate
//! │  ┌─────────┐ │
//! │  │ Session │ │  Status + lifecycle state machine
//! │  └─────────┘ │
//! │  ┌─────────┐ │
//! │  │ Dispatch│ │  Correlation by request id
//! │  └─────────┘ │
//! │  ┌─────────┐ │
//! │  │ Transport│ │  WebSocket (or a scripted test double)
//! │  └─────────┘ │
//! └──────────────┘
//! ```
//!
//! The session never sees a socket type: it drives a [`Connector`], which is
//! how the test suite swaps the remote end for a script.

pub mod error;
pub mod session;
pub mod status;
pub mod transport;

mod connection;
mod handshake;

pub use error::{Error, Result};
pub use session::Session;
pub use status::{ConnectionStatus, StatusSnapshot};
pub use transport::{
	Connector, TransportEvent, TransportParts, TransportSender, WebSocketConnector,
};
