//! The OBS WebSocket v5 message envelope.
//!
//! Every frame on the wire is a JSON object `{"op": <int>, "d": {...}}` where
//! `op` selects the payload shape. The protocol is client/server asymmetric:
//!
//! 1. Server sends [`Hello`] (op 0) as soon as the socket opens, carrying an
//!    authentication challenge when a password is configured
//! 2. Client answers with [`Identify`] (op 1)
//! 3. Server confirms with [`Identified`] (op 2) - or closes the socket with
//!    a code from [`close_code`]
//! 4. From then on the client sends [`Request`] frames (op 6) and the server
//!    delivers [`RequestResponse`] frames (op 7) correlated by `request_id`,
//!    interleaved with unsolicited [`Event`] frames (op 5)
//!
//! Integer tags are not expressible with serde's derive attributes, so
//! [`ClientMessage`] and [`ServerMessage`] carry manual impls that wrap and
//! unwrap the envelope.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The RPC version this client speaks, sent in [`Identify`].
pub const RPC_VERSION: u32 = 1;

/// WebSocket close codes the server uses to end a session.
///
/// Only codes the session logic branches on (or reports verbatim) are named;
/// anything else is surfaced as an unclassified transport failure.
pub mod close_code {
	/// A request was issued before identification completed.
	pub const NOT_IDENTIFIED: u16 = 4007;
	/// The authentication string in `Identify` was missing or wrong.
	pub const AUTHENTICATION_FAILED: u16 = 4009;
	/// The server cannot speak the RPC version the client asked for.
	pub const UNSUPPORTED_RPC_VERSION: u16 = 4010;
	/// The server invalidated the session (e.g. its settings changed).
	pub const SESSION_INVALIDATED: u16 = 4011;
}

mod op {
	pub const HELLO: u8 = 0;
	pub const IDENTIFY: u8 = 1;
	pub const IDENTIFIED: u8 = 2;
	pub const EVENT: u8 = 5;
	pub const REQUEST: u8 = 6;
	pub const REQUEST_RESPONSE: u8 = 7;
}

/// Frames this client sends.
#[derive(Debug, Clone)]
pub enum ClientMessage {
	/// Handshake answer (op 1).
	Identify(Identify),
	/// Command call (op 6).
	Request(Request),
}

impl Serialize for ClientMessage {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		#[derive(Serialize)]
		struct Envelope<'a, T> {
			op: u8,
			d: &'a T,
		}
		match self {
			ClientMessage::Identify(d) => Envelope { op: op::IDENTIFY, d }.serialize(serializer),
			ClientMessage::Request(d) => Envelope { op: op::REQUEST, d }.serialize(serializer),
		}
	}
}

/// Frames this client receives.
#[derive(Debug, Clone)]
pub enum ServerMessage {
	/// Handshake opener (op 0).
	Hello(Hello),
	/// Handshake confirmation (op 2).
	Identified(Identified),
	/// Unsolicited event (op 5).
	Event(Event),
	/// Answer to a [`Request`], correlated by `request_id` (op 7).
	RequestResponse(RequestResponse),
	/// An opcode this client does not know. Kept rather than rejected so a
	/// newer server does not break the session.
	Unknown {
		op: u8,
		d: Value,
	},
}

impl<'de> Deserialize<'de> for ServerMessage {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		struct Envelope {
			op: u8,
			#[serde(default)]
			d: Value,
		}

		let Envelope { op, d } = Envelope::deserialize(deserializer)?;
		let bad_payload =
			|what: &str, e: serde_json::Error| D::Error::custom(format!("bad {what} payload: {e}"));
		Ok(match op {
			op::HELLO => {
				ServerMessage::Hello(serde_json::from_value(d).map_err(|e| bad_payload("Hello", e))?)
			}
			op::IDENTIFIED => ServerMessage::Identified(
				serde_json::from_value(d).map_err(|e| bad_payload("Identified", e))?,
			),
			op::EVENT => {
				ServerMessage::Event(serde_json::from_value(d).map_err(|e| bad_payload("Event", e))?)
			}
			op::REQUEST_RESPONSE => ServerMessage::RequestResponse(
				serde_json::from_value(d).map_err(|e| bad_payload("RequestResponse", e))?,
			),
			op => ServerMessage::Unknown { op, d },
		})
	}
}

/// First frame after the socket opens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub obs_web_socket_version: Option<String>,
	pub rpc_version: u32,
	/// Present when the server requires authentication.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication: Option<AuthChallenge>,
}

/// Challenge material from [`Hello`], consumed by
/// [`authentication_string`](crate::authentication_string).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthChallenge {
	pub challenge: String,
	pub salt: String,
}

/// The client's half of the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
	pub rpc_version: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub authentication: Option<String>,
	/// Bitmask of event categories to receive. `None` keeps the server
	/// default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_subscriptions: Option<u32>,
}

/// Handshake complete; requests are accepted from here on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
	pub negotiated_rpc_version: u32,
}

/// A command call. `request_id` is an opaque correlation token echoed back in
/// the matching [`RequestResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
	pub request_type: String,
	pub request_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request_data: Option<Value>,
}

/// Answer to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
	pub request_type: String,
	pub request_id: String,
	pub request_status: RequestStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_data: Option<Value>,
}

/// Outcome carried by every [`RequestResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatus {
	pub result: bool,
	pub code: u16,
	/// Human-readable detail, present on most failures.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub comment: Option<String>,
}

/// An unsolicited event frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
	pub event_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_intent: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_data: Option<Value>,
}
