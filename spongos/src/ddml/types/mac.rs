/// Number of bytes squeezed as a tag on wrap, and compared against the message on unwrap
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct Mac(usize);

impl Mac {
    pub const fn new(length: usize) -> Self {
        Self(length)
    }

    pub fn length(&self) -> usize {
        self.0
    }
}
