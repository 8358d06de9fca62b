use alloc::vec::Vec;
use core::fmt;

wrapper_type! {
    /// Byte string of any length, encoded after its [`Size`](super::Size)
    #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    Bytes = Vec<u8>
}

impl<T: AsRef<[u8]>> Bytes<T> {
    pub fn as_slice(&self) -> &[u8] {
        self.inner().as_ref()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// The bytes as text, if they are valid UTF-8
    pub fn to_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_slice()).ok()
    }
}

impl Bytes<&mut Vec<u8>> {
    /// Sizes the target vector to the length read from the message
    pub(crate) fn resize(&mut self, new_size: usize) {
        self.inner_mut().resize(new_size, 0);
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        self.inner_mut().as_mut_slice()
    }
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for Bytes<T> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<T: AsRef<[u8]>> fmt::Display for Bytes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_slice()))
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(bytes: Bytes) -> Self {
        bytes.into_inner()
    }
}
