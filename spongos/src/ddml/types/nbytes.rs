wrapper_type! {
    /// Byte array whose length both sides agree on, so it is not encoded
    #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
    NBytes
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for NBytes<T> {
    fn as_ref(&self) -> &[u8] {
        self.inner().as_ref()
    }
}

impl<T: AsMut<[u8]>> AsMut<[u8]> for NBytes<T> {
    fn as_mut(&mut self) -> &mut [u8] {
        self.inner_mut().as_mut()
    }
}
