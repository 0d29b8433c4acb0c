// src/auth/token.rs
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

pub const TOKEN_BYTES: usize = 32;

/// A bearer token as handed to the client plus the hash that gets stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub hash: [u8; 32],
}

pub fn issue_token() -> IssuedToken {
    issue_token_with(&mut OsRng)
}

/// 32 random bytes, URL-safe base64 without padding (43 chars).
pub fn issue_token_with<R: RngCore + CryptoRng>(rng: &mut R) -> IssuedToken {
    let mut buf = [0u8; TOKEN_BYTES];
    rng.fill_bytes(&mut buf);
    let raw = URL_SAFE_NO_PAD.encode(buf);
    let hash = hash_token(&raw);
    IssuedToken { raw, hash }
}

pub fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
