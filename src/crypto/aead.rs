use super::{KEY_LEN, NONCE_LEN};
use crate::error::{Error, Result};
use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

fn cipher(key: &[u8; KEY_LEN]) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key))
}

/// Encrypt plaintext, returning ciphertext with the tag appended
pub fn seal(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::EncryptionFailed)
}

/// Decrypt and authenticate ciphertext
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::DecryptionFailed)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::TAG_LEN;

    const KEY: [u8; KEY_LEN] = [9u8; KEY_LEN];
    const NONCE: [u8; NONCE_LEN] = [3u8; NONCE_LEN];

    #[test]
    fn seal_appends_tag() {
        let ciphertext = seal(&KEY, &NONCE, b"abc").unwrap();
        assert_eq!(ciphertext.len(), 3 + TAG_LEN);
    }

    #[test]
    fn open_reverses_seal() {
        let ciphertext = seal(&KEY, &NONCE, b"secret data").unwrap();
        let plaintext = open(&KEY, &NONCE, &ciphertext).unwrap();

        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn open_with_other_key_fails() {
        let ciphertext = seal(&KEY, &NONCE, b"secret data").unwrap();
        let result = open(&[1u8; KEY_LEN], &NONCE, &ciphertext);

        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn open_with_other_nonce_fails() {
        let ciphertext = seal(&KEY, &NONCE, b"secret data").unwrap();
        let result = open(&KEY, &[4u8; NONCE_LEN], &ciphertext);

        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn open_without_tag_fails() {
        let result = open(&KEY, &NONCE, &[]);
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }
}
