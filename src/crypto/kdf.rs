use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};

/// A 256-bit key, wiped from memory when dropped.
pub type DerivedKey = Zeroizing<[u8; KEY_LEN]>;

/// Derive the file key from a password and salt.
///
/// PBKDF2-HMAC-SHA256 with [`PBKDF2_ITERATIONS`] rounds. The same
/// password and salt always give the same key, which is what lets
/// decryption rebuild it from the salt stored in the container.
/// An empty password is accepted.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, key.as_mut_slice());
    key
}
