//! Cryptographic primitives for file encryption.
//!
//! Provides key derivation, authenticated encryption and the random
//! source used for salts and nonces.

pub mod aead;
pub mod entropy;
pub mod kdf;

pub use aead::{open, seal};
pub use entropy::{Entropy, OsEntropy};
pub use kdf::{DerivedKey, derive_key};

/// Length of the salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (12 bytes for AES-256-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the derived key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;
/// PBKDF2-HMAC-SHA256 round count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
