//! Client configuration.

use serde::{Deserialize, Serialize};

/// Connection settings, supplied by the embedding application and treated as
/// opaque: no validation happens here. A wrong host fails at dial time, a
/// wrong password at the handshake, a wrong scene name at the first
/// scene-item request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub host: String,
	pub port: u16,
	/// Password for servers with authentication enabled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
	/// The scene that scene-item operations target.
	pub scene_name: String,
}

impl Config {
	/// The WebSocket URL this configuration dials.
	pub fn address(&self) -> String {
		format!("ws://{}:{}", self.host, self.port)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn address_renders_host_and_port() {
		let config = Config {
			host: "127.0.0.1".into(),
			port: 4455,
			password: None,
			scene_name: "Main".into(),
		};
		assert_eq!(config.address(), "ws://127.0.0.1:4455");
	}

	#[test]
	fn password_is_omitted_from_serialized_form_when_unset() {
		let config = Config {
			host: "obs.local".into(),
			port: 4455,
			password: None,
			scene_name: "Main".into(),
		};
		let json = serde_json::to_string(&config).unwrap();
		assert!(!json.contains("password"));
	}
}
