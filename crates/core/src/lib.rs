//! A typed client for driving OBS Studio over the obs-websocket v5 protocol.
//!
//! The client manages the full connection lifecycle - dial, the
//! Hello/Identify/Identified handshake (with authentication when the server
//! demands it), request/response correlation over the single socket, and
//! clean teardown - and exposes a small typed command surface on top:
//!
//! ```no_run
//! use obsw::{Client, Config};
//!
//! # async fn run() -> obsw::Result<()> {
//! let client = Client::new(Config {
//!     host: "127.0.0.1".into(),
//!     port: 4455,
//!     password: Some("hunter2".into()),
//!     scene_name: "Main".into(),
//! });
//! client.connect().await?;
//!
//! let settings = client.video_settings().await?;
//! let items = client.scene_items().await?;
//! client.set_scene_item_transform(items[0].scene_item_id, 100.0, 200.0).await?;
//! client.close();
//! # Ok(())
//! # }
//! ```
//!
//! Connection state is observable through [`Client::status`] and
//! [`Client::subscribe`]; failures carry a fixed taxonomy ([`Error`]) so
//! callers can branch on the recoverable cases (rejected credential,
//! misconfigured scene name) without string matching.

pub mod client;
pub mod config;

pub use client::Client;
pub use config::Config;

pub use obsw_protocol::{SceneItem, Screenshot, VideoSettings};
pub use obsw_runtime::{
	ConnectionStatus, Connector, Error, Result, StatusSnapshot, WebSocketConnector,
};
