//! Wire types for the OBS WebSocket v5 protocol.
//!
//! This crate contains the serde-serializable types used for communication
//! with an obs-websocket server. These types represent the "protocol layer" -
//! the shapes of data as they appear on the wire: the `{op, d}` envelope, the
//! handshake payloads, request/response frames, and the typed payloads of the
//! requests the client issues.
//!
//! Types here are pure data with no behavior beyond serialization, plus the
//! one pure function the handshake needs: [`authentication_string`].
//!
//! Session management and transport live in `obsw-runtime`; the caller-facing
//! client lives in `obsw`.

pub mod auth;
pub mod envelope;
pub mod requests;

pub use auth::*;
pub use envelope::*;
pub use requests::*;
