use core::fmt;

use crate::error::{Error, Result};

const MAX_SIZE_BYTES: u8 = core::mem::size_of::<usize>() as u8;

/// Variable length unsigned integer.
///
/// Encoded as one byte holding the number `d` of significant bytes, followed by those `d`
/// bytes in big-endian order. Zero is encoded as a single `0` byte.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Debug, Default)]
pub struct Size(usize);

impl Size {
    pub fn new(n: usize) -> Self {
        Self(n)
    }

    pub fn inner(&self) -> usize {
        self.0
    }

    /// Number of significant bytes of the value.
    pub(crate) fn num_bytes(self) -> u8 {
        let bits = usize::BITS - self.0.leading_zeros();
        ((bits + 7) / 8) as u8
    }

    /// Feed the significant bytes, most significant first, to `codec`.
    pub(crate) fn encode(self, mut codec: impl FnMut(u8) -> Result<()>) -> Result<()> {
        let d = self.num_bytes() as usize;
        let bytes = self.0.to_be_bytes();
        bytes[bytes.len() - d..].iter().try_for_each(|b| codec(*b))
    }

    /// Read `num_bytes` bytes from `codec` and rebuild the value.
    pub(crate) fn decode(mut codec: impl FnMut() -> Result<u8>, num_bytes: u8) -> Result<Self> {
        if num_bytes > MAX_SIZE_BYTES {
            return Err(Error::InvalidSize(num_bytes as usize));
        }
        let mut n = 0usize;
        for _ in 0..num_bytes {
            n = (n << 8) | codec()? as usize;
        }
        Ok(Size(n))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Size({})", self.0)
    }
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Self(n)
    }
}

#[cfg(test)]
mod tests {
    use super::Size;

    #[test]
    fn num_bytes_is_minimal() {
        assert_eq!(Size::new(0).num_bytes(), 0);
        assert_eq!(Size::new(1).num_bytes(), 1);
        assert_eq!(Size::new(255).num_bytes(), 1);
        assert_eq!(Size::new(256).num_bytes(), 2);
        assert_eq!(Size::new(usize::MAX).num_bytes() as usize, core::mem::size_of::<usize>());
    }

    #[test]
    fn decode_rejects_oversized_length() {
        assert!(Size::decode(|| Ok(0), 9).is_err());
    }
}
