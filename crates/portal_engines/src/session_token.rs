#![forbid(unsafe_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use portal_contracts::admin::SessionToken;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SESSION_TOKEN_BYTES: usize = 32;

pub fn sha256_hex(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// 256 bits from the OS RNG, URL-safe base64 without padding (cookie-safe).
pub fn mint_session_token() -> SessionToken {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    SessionToken::new(URL_SAFE_NO_PAD.encode(bytes))
}

/// Key under which a session is stored; the raw token never leaves the client cookie.
pub fn session_token_digest(token: &SessionToken) -> String {
    sha256_hex(token.as_str().as_bytes())
}
