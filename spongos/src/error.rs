use alloc::string::String;

use displaydoc::Display;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Display, Debug, PartialEq, Eq)]
pub enum Error {
    /// Not enough space allocated for output stream (expected: {0}, found: {1})
    StreamAllocationExceededOut(usize, usize),
    /// Not enough space allocated for input stream (expected: {0}, found: {1})
    StreamAllocationExceededIn(usize, usize),
    /// Output stream has not been exhausted. Remaining: {0}
    OutputStreamNotFullyConsumed(usize),
    /// Input stream has not been exhausted. Remaining: {0}
    InputStreamNotFullyConsumed(usize),
    /// Size of vec/array does not match (expected: {0}, found: {1})
    LengthMismatch(usize, usize),
    /// Size is encoded with {0} bytes, no more than 8 bytes are supported
    InvalidSize(usize),
    /// Unexpected value for {0}: {1}
    InvalidOption(&'static str, u8),
    /// Cannot {0} with {1}: {2}
    InvalidAction(&'static str, String, String),
    /// There was an issue with the calculated signature, cannot unwrap message
    SignatureMismatch,
    /// Integrity violation. Bad MAC
    BadMac,
    /// Failed to convert {0} key to an x25519 key
    KeyConversion(&'static str),
    /// Bytes do not encode a valid {0}
    InvalidKey(&'static str),
    /// Failure during {0}: {1}
    Context(&'static str, String),
}

impl Error {
    /// Label the error with the DDML step or message part that produced it.
    pub fn context(self, step: &'static str) -> Self {
        use alloc::string::ToString;
        Error::Context(step, self.to_string())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
