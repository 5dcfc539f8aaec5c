// src/utils/token.rs

//! Opaque session tokens: hex of OS-random bytes.

use rand::RngCore;
use rand::rngs::OsRng;

const LOGIN_TOKEN_BYTES: usize = 32;
const EXAM_TOKEN_BYTES: usize = 16;
pub const EXAM_TOKEN_PREFIX: &str = "exam_";

fn random_hex<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 64 hex characters.
pub fn login_token() -> String {
    random_hex::<LOGIN_TOKEN_BYTES>()
}

/// `exam_` followed by 32 hex characters.
pub fn exam_token() -> String {
    format!("{}{}", EXAM_TOKEN_PREFIX, random_hex::<EXAM_TOKEN_BYTES>())
}
