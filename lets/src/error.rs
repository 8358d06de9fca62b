use alloc::string::String;
use core::array::TryFromSliceError;

use hex::FromHexError;
use thiserror_no_std::Error;

use spongos::error::Error as SpongosError;

use crate::address::Address;

pub type Result<T> = core::result::Result<T, Error>;

/// Failures of the message layer. Encoding failures of the sponge are wrapped in
/// [`Error::Spongos`].
#[derive(Debug, Error)]
pub enum Error {
    /// What was parsed, the separator that was expected and the input
    #[error("cannot parse {0}: '{2}' has no '{1}'")]
    Malformed(&'static str, &'static str, String),

    #[error("{0} is not {1}: {2}")]
    Encoding(&'static str, &'static str, FromHexError),

    #[error("{0} takes {1} bytes, got {2}")]
    InvalidSize(&'static str, usize, usize),

    /// Field, value and width of the field in bits
    #[error("{0} {1} exceeds {2} bits")]
    Overflow(&'static str, u32, u8),

    #[error("spongos: {0}")]
    Spongos(SpongosError),

    #[error("{0:?}")]
    External(anyhow::Error),

    #[error("no message at {0} in the {1}")]
    MessageMissing(Address, &'static str),

    #[error("expected a single message at {0}, found {1}")]
    MessageNotUnique(Address, usize),
}

impl From<SpongosError> for Error {
    fn from(error: SpongosError) -> Self {
        Self::Spongos(error)
    }
}

impl From<TryFromSliceError> for Error {
    fn from(error: TryFromSliceError) -> Self {
        Self::External(anyhow::Error::msg(error))
    }
}
