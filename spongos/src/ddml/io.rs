use alloc::string::String;

use crate::error::{Error, Result};

/// Output stream the wrap context writes to.
pub trait OStream {
    /// Reserve the next `n` bytes of the stream, returning them for writing.
    fn try_advance(&mut self, n: usize) -> Result<&mut [u8]>;

    /// Hex dump of the bytes not yet written.
    fn dump(&self) -> String;
}

/// Input stream the unwrap context reads from.
pub trait IStream {
    /// Consume the next `n` bytes of the stream.
    fn try_advance(&mut self, n: usize) -> Result<&[u8]>;

    /// Hex dump of the bytes not yet read.
    fn dump(&self) -> String;
}

impl<'b> OStream for &'b mut [u8] {
    fn try_advance(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.len() {
            return Err(Error::StreamAllocationExceededOut(n, self.len()));
        }
        let (head, tail) = core::mem::take(self).split_at_mut(n);
        *self = tail;
        Ok(head)
    }

    fn dump(&self) -> String {
        hex::encode(&self[..])
    }
}

impl<'b> IStream for &'b [u8] {
    fn try_advance(&mut self, n: usize) -> Result<&[u8]> {
        if n > self.len() {
            return Err(Error::StreamAllocationExceededIn(n, self.len()));
        }
        let stream: &'b [u8] = *self;
        let (head, tail) = stream.split_at(n);
        *self = tail;
        Ok(head)
    }

    fn dump(&self) -> String {
        hex::encode(self)
    }
}

impl<T> OStream for &mut T
where
    T: OStream,
{
    fn try_advance(&mut self, n: usize) -> Result<&mut [u8]> {
        (**self).try_advance(n)
    }

    fn dump(&self) -> String {
        (**self).dump()
    }
}

impl<T> IStream for &mut T
where
    T: IStream,
{
    fn try_advance(&mut self, n: usize) -> Result<&[u8]> {
        (**self).try_advance(n)
    }

    fn dump(&self) -> String {
        (**self).dump()
    }
}
