//! Lenient decoding of externally supplied key material.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use zeroize::Zeroizing;

use trustcore_core::error::AppError;
use trustcore_core::result::AppResult;

/// Length in bytes of the symmetric encryption key.
pub const KEY_LENGTH: usize = 32;

/// Decodes a 32-byte key from text.
///
/// Surrounding whitespace is ignored. Standard base64, URL-safe base64 and
/// hex are tried in that order; the first decoding that yields exactly
/// [`KEY_LENGTH`] bytes wins.
pub fn decode_key_material(raw: &str) -> AppResult<Zeroizing<[u8; KEY_LENGTH]>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_key("Key material is empty"));
    }

    let candidates = [
        STANDARD.decode(trimmed).ok(),
        URL_SAFE.decode(trimmed).ok(),
        hex::decode(trimmed).ok(),
    ];

    for decoded in candidates.into_iter().flatten() {
        let decoded = Zeroizing::new(decoded);
        if decoded.len() == KEY_LENGTH {
            let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
            key.copy_from_slice(&decoded);
            return Ok(key);
        }
    }

    Err(AppError::invalid_key(format!(
        "Key material must decode to exactly {KEY_LENGTH} bytes"
    )))
}
