//! Password-based file encryption.
//!
//! A file is encrypted with AES-256-GCM under a key derived from the
//! password with PBKDF2-HMAC-SHA256 (100,000 rounds) and a random salt.
//! The output is `salt (16) | nonce (12) | ciphertext + tag`.
//!
//! ```no_run
//! let container = sealfile::encrypt(b"hello world", "correct horse")?;
//! let plaintext = sealfile::decrypt(&container, "correct horse")?;
//! assert_eq!(plaintext.as_slice(), b"hello world");
//! # Ok::<(), sealfile::Error>(())
//! ```

pub mod batch;
pub mod caesar;
mod cipher;
pub mod container;
pub mod crypto;
pub mod digest;
mod error;
pub mod files;
mod storage;

pub use crate::cipher::FileCipher;
pub use crate::container::Container;
pub use crate::crypto::{Entropy, OsEntropy, derive_key};
pub use crate::error::{Error, Result};
pub use crate::storage::Storage;

use zeroize::Zeroizing;

/// Encrypts `plaintext` with a fresh random salt and nonce.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    FileCipher::new().encrypt(plaintext, password)
}

/// Decrypts a container produced by [`encrypt`].
pub fn decrypt(container: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>> {
    FileCipher::new().decrypt(container, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_roundtrip() {
        let container = encrypt(b"hello world", "correct horse").unwrap();
        let plaintext = decrypt(&container, "correct horse").unwrap();

        assert_eq!(plaintext.as_slice(), b"hello world");
        assert!(matches!(
            decrypt(&container, "wrong horse"),
            Err(Error::DecryptionFailed)
        ));
    }

    #[test]
    fn decrypt_error_message_is_generic() {
        let container = encrypt(b"x", "a").unwrap();
        let err = decrypt(&container, "b").unwrap_err();

        assert_eq!(
            err.to_string(),
            "decryption failed: wrong password or corrupted file"
        );
    }
}
