use thiserror::Error;

use crate::container::HEADER_LEN;

/// Failures of the encryption core.
///
/// Wrong passwords and damaged ciphertexts are both reported as
/// [`Error::DecryptionFailed`]: AES-GCM cannot tell them apart.
#[derive(Debug, Error)]
pub enum Error {
    /// Input is too short to hold a salt and a nonce.
    #[error("malformed container: {len} bytes, need at least {}", HEADER_LEN)]
    MalformedContainer { len: usize },

    /// Authentication or decryption failed.
    #[error("decryption failed: wrong password or corrupted file")]
    DecryptionFailed,

    /// The cipher refused to seal the plaintext.
    #[error("encryption failed")]
    EncryptionFailed,

    /// The OS random generator is unavailable.
    #[error("OS random generator unavailable: {0}")]
    Entropy(getrandom::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
