//! The typed client.
//!
//! [`Client`] pairs a [`Session`] with a [`Config`] and exposes the command
//! surface as thin typed wrappers over the generic call mechanism: serialize
//! the parameters, issue the request, deserialize the response. The one piece
//! of per-command logic lives in [`Client::scene_items`], which reclassifies
//! the server's missing-source failure so callers can treat a misconfigured
//! scene name as its own recoverable condition.

use std::sync::Arc;

use obsw_protocol::{
	GetSceneItemListParams, GetSourceScreenshotParams, SceneItem, SceneItemList, Screenshot,
	SetSceneItemTransformParams, TransformUpdate, VideoSettings,
};
use obsw_runtime::{
	Connector, Error, Result, Session, StatusSnapshot, WebSocketConnector,
};
use tokio::sync::watch;

use crate::config::Config;

/// A client for one obs-websocket server.
pub struct Client {
	session: Session,
	config: Config,
}

impl Client {
	/// Client over the production WebSocket transport.
	pub fn new(config: Config) -> Self {
		Self::with_connector(config, Arc::new(WebSocketConnector))
	}

	/// Client over a caller-supplied transport.
	pub fn with_connector(config: Config, connector: Arc<dyn Connector>) -> Self {
		Self {
			session: Session::new(connector),
			config,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Registers a callback fired once when the next successful `connect()`
	/// finishes its handshake.
	pub fn on_ready(&self, callback: impl FnOnce() + Send + 'static) {
		self.session.on_ready(callback);
	}

	/// Current status snapshot.
	pub fn status(&self) -> StatusSnapshot {
		self.session.status()
	}

	/// Change-notification feed for the status.
	pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
		self.session.subscribe()
	}

	/// Connects to the configured server, tearing down any prior session
	/// first. Commands are accepted once this returns.
	pub async fn connect(&self) -> Result<()> {
		self.session
			.connect(&self.config.address(), self.config.password.as_deref())
			.await
	}

	/// Closes the session. Safe to call at any time.
	pub fn close(&self) {
		self.session.close();
	}

	/// The server's reported video geometry, verbatim.
	pub async fn video_settings(&self) -> Result<VideoSettings> {
		let value = self.session.call("GetVideoSettings", None).await?;
		let settings: VideoSettings = serde_json::from_value(value)?;
		tracing::debug!(?settings, "video settings");
		Ok(settings)
	}

	/// The item list of the configured scene.
	///
	/// A server failure naming a missing source marks the status feed and
	/// surfaces as [`Error::InvalidSceneName`]; every other failure
	/// propagates unmodified.
	pub async fn scene_items(&self) -> Result<Vec<SceneItem>> {
		let scene_name = self.config.scene_name.clone();
		let params = serde_json::to_value(GetSceneItemListParams {
			scene_name: scene_name.clone(),
		})?;

		match self.session.call("GetSceneItemList", Some(params)).await {
			Ok(value) => {
				let list: SceneItemList = serde_json::from_value(value)?;
				tracing::debug!(count = list.scene_items.len(), "scene items");
				Ok(list.scene_items)
			}
			Err(Error::Remote { message, .. }) if message.contains("No source") => {
				self.session.flag_invalid_scene();
				Err(Error::InvalidSceneName {
					name: scene_name,
					comment: message,
				})
			}
			Err(e) => Err(e),
		}
	}

	/// A PNG screenshot of the named source. The payload is the server's
	/// encoded data URI, passed through uninterpreted.
	pub async fn source_screenshot(&self, source_name: &str) -> Result<Screenshot> {
		let params = serde_json::to_value(GetSourceScreenshotParams {
			source_name: source_name.to_owned(),
			image_format: "png".into(),
			image_width: None,
			image_height: None,
			image_compression_quality: None,
		})?;
		let value = self.session.call("GetSourceScreenshot", Some(params)).await?;
		Ok(serde_json::from_value(value)?)
	}

	/// Moves one item of the configured scene. Coordinates are passed
	/// through unvalidated; the server clamps or rejects as it sees fit.
	pub async fn set_scene_item_transform(
		&self,
		scene_item_id: i64,
		position_x: f64,
		position_y: f64,
	) -> Result<()> {
		let params = serde_json::to_value(SetSceneItemTransformParams {
			scene_name: self.config.scene_name.clone(),
			scene_item_id,
			scene_item_transform: TransformUpdate {
				position_x: Some(position_x),
				position_y: Some(position_y),
			},
		})?;
		self.session
			.call("SetSceneItemTransform", Some(params))
			.await?;
		Ok(())
	}
}
