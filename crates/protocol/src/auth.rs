//! Handshake authentication.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// Computes the `authentication` field of an `Identify` frame.
///
/// The server's `Hello` supplies `salt` and `challenge`; the answer is
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`. The salted
/// inner hash is what the server stores, the challenge round keeps it off the
/// wire.
pub fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
	let secret = STANDARD.encode(Sha256::digest(format!("{password}{salt}")));
	STANDARD.encode(Sha256::digest(format!("{secret}{challenge}")))
}
