//! Password-based encryption of whole files.

use zeroize::Zeroizing;

use crate::container::Container;
use crate::crypto::{self, Entropy, NONCE_LEN, OsEntropy, SALT_LEN};
use crate::error::Result;

/// Encrypts and decrypts containers with a password.
///
/// Holds no key material between calls. Every [`encrypt`](Self::encrypt)
/// draws a fresh salt and nonce, so the derived key is never reused and
/// two encryptions of the same input differ.
#[derive(Debug, Default, Clone)]
pub struct FileCipher<E = OsEntropy> {
    entropy: E,
}

impl FileCipher {
    /// Creates a cipher backed by the OS random generator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Entropy> FileCipher<E> {
    /// Creates a cipher drawing salts and nonces from `entropy`.
    pub fn with_entropy(entropy: E) -> Self {
        Self { entropy }
    }

    /// Encrypts `plaintext` into a container.
    ///
    /// # Errors
    ///
    /// Fails only if the random source does.
    pub fn encrypt(&self, plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_LEN];
        self.entropy.fill(&mut salt)?;
        let mut nonce = [0u8; NONCE_LEN];
        self.entropy.fill(&mut nonce)?;

        let key = crypto::derive_key(password, &salt);
        let ciphertext = crypto::seal(&key, &nonce, plaintext)?;
        drop(key);

        Ok(Container::new(&salt, &nonce, &ciphertext).encode())
    }

    /// Recovers the plaintext from a container.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedContainer`](crate::Error::MalformedContainer)
    ///   if `container` is shorter than 28 bytes.
    /// - [`Error::DecryptionFailed`](crate::Error::DecryptionFailed) on a
    ///   wrong password or any damage to the container.
    pub fn decrypt(&self, container: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let container = Container::decode(container)?;

        let key = crypto::derive_key(password, container.salt());
        crypto::open(&key, container.nonce(), container.ciphertext())
    }
}
