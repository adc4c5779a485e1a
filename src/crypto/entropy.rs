use crate::error::{Error, Result};

/// Source of the random bytes used for salts and nonces.
pub trait Entropy: Send + Sync {
    /// Fill `buf` completely with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl Entropy for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        getrandom::fill(buf).map_err(Error::Entropy)
    }
}

impl<F> Entropy for F
where
    F: Fn(&mut [u8]) -> Result<()> + Send + Sync,
{
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        self(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_entropy_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        OsEntropy.fill(&mut a).unwrap();
        OsEntropy.fill(&mut b).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn closures_are_entropy_sources() {
        let fixed = |buf: &mut [u8]| -> Result<()> {
            buf.fill(0xAB);
            Ok(())
        };
        let mut buf = [0u8; 4];
        fixed.fill(&mut buf).unwrap();

        assert_eq!(buf, [0xAB; 4]);
    }
}
