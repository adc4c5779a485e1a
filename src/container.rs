//! Byte layout of an encrypted file.
//!
//! ```text
//! SALT (16) | NONCE (12) | CIPHERTEXT + TAG (variable)
//! ```
//!
//! There is no magic, version byte or length prefix. Every field sits at
//! a fixed offset, which keeps the format bit-compatible with files
//! written by other implementations of the same layout.

use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// Length of the fixed prefix (salt and nonce).
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// A container split into its three parts.
///
/// Borrows from the input buffer when decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'a> {
    salt: &'a [u8; SALT_LEN],
    nonce: &'a [u8; NONCE_LEN],
    ciphertext: &'a [u8],
}

impl<'a> Container<'a> {
    /// Creates a container from its components.
    pub fn new(
        salt: &'a [u8; SALT_LEN],
        nonce: &'a [u8; NONCE_LEN],
        ciphertext: &'a [u8],
    ) -> Self {
        Self {
            salt,
            nonce,
            ciphertext,
        }
    }

    /// Splits `data` into salt, nonce and ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedContainer`] if `data` is shorter than
    /// [`HEADER_LEN`]. The ciphertext itself is not checked here; a bad
    /// one is caught when decryption fails to authenticate it.
    pub fn decode(data: &'a [u8]) -> Result<Self> {
        let Some((salt, rest)) = data.split_first_chunk::<SALT_LEN>() else {
            return Err(Error::MalformedContainer { len: data.len() });
        };
        let Some((nonce, ciphertext)) = rest.split_first_chunk::<NONCE_LEN>() else {
            return Err(Error::MalformedContainer { len: data.len() });
        };

        Ok(Self::new(salt, nonce, ciphertext))
    }

    /// Serializes the container to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());

        buf.extend_from_slice(self.salt);
        buf.extend_from_slice(self.nonce);
        buf.extend_from_slice(self.ciphertext);

        buf
    }

    /// Returns the key derivation salt.
    pub fn salt(&self) -> &'a [u8; SALT_LEN] {
        self.salt
    }

    /// Returns the AEAD nonce.
    pub fn nonce(&self) -> &'a [u8; NONCE_LEN] {
        self.nonce
    }

    /// Returns the ciphertext, tag included.
    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }
}
