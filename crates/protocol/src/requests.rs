//! Typed payloads for the requests this client issues.
//!
//! Response types declare only the fields the client reads; obs-websocket
//! sends more and serde drops the rest, which keeps these structs stable
//! across server releases.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request-status codes worth naming. The full table lives in the
/// obs-websocket protocol document; anything unnamed is reported verbatim.
pub mod status_code {
	/// The named resource (scene, source, input, ...) does not exist.
	pub const RESOURCE_NOT_FOUND: u16 = 600;
}

/// Response to `GetVideoSettings`: canvas and output geometry plus framerate,
/// reported verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSettings {
	pub base_width: u32,
	pub base_height: u32,
	pub output_width: u32,
	pub output_height: u32,
	pub fps_numerator: u32,
	pub fps_denominator: u32,
}

/// Parameters for `GetSceneItemList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSceneItemListParams {
	pub scene_name: String,
}

/// Response to `GetSceneItemList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItemList {
	pub scene_items: Vec<SceneItem>,
}

/// One item of a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
	pub scene_item_id: i64,
	pub source_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scene_item_index: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scene_item_enabled: Option<bool>,
	/// Raw transform object; consumers that need it pick fields themselves.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scene_item_transform: Option<Value>,
}

/// Parameters for `GetSourceScreenshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSourceScreenshotParams {
	pub source_name: String,
	/// Encoder name, e.g. `"png"`. Must be one the server advertises.
	pub image_format: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_width: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_height: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image_compression_quality: Option<i32>,
}

/// Response to `GetSourceScreenshot`: the encoded image as a base64 data URI.
/// Opaque to this client; decoding is the caller's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
	pub image_data: String,
}

/// Parameters for `SetSceneItemTransform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSceneItemTransformParams {
	pub scene_name: String,
	pub scene_item_id: i64,
	pub scene_item_transform: TransformUpdate,
}

/// Partial transform update; the server only touches the fields present.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformUpdate {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position_x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub position_y: Option<f64>,
}
