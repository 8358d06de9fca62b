//! Stream Errors

// Rust
use alloc::string::String;

// 3rd-party
use thiserror_no_std::Error as ThisError;

// Streams
use lets::{
    address::{Address, MsgId},
    error::Error as LetsError,
    id::{Identifier, PskId},
};
use spongos::error::Error as SpongosError;

pub type Result<T> = core::result::Result<T, Error>;

/// Error type of the streams crate.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not connected to a stream. A user must either create a stream or connect to an existing one before attempting to {0}")]
    NoStream(&'static str),

    #[error("the user is already connected to the stream '{0}'")]
    StreamAlreadyAttached(Address),

    #[error("the user does not have an identity, but needs one to {0}")]
    NoIdentity(&'static str),

    #[error("only {0} can {1}")]
    Unauthorized(&'static str, &'static str),

    #[error("cannot link to message '{0}': {1}")]
    InvalidLink(MsgId, &'static str),

    #[error("payload of {0} bytes exceeds the payload length limit of {1} bytes")]
    PayloadTooLarge(usize, usize),

    #[error("address already taken. The address '{0}' where the message is being sent already contains some data")]
    AddressUsed(Address),

    #[error("unexpected message type {0}")]
    MessageTypeUnknown(u8),

    #[error("Message not linked. The {0} message at address '{1}' is not linked to any message. \
Any {0} message must be linked to a previous message by including the address of the previous message in the header")]
    NotLinked(&'static str, Address),

    #[error("'{0}' is not a subscriber of the stream")]
    UnknownSubscriber(Identifier),

    #[error("unknown PSK '{0}'. Add the PSK to the user before sending keyloads that include it")]
    UnknownPsk(PskId),

    #[error("unsupported encoding '{0}'. Only 'utf-8' is supported")]
    UnsupportedEncoding(String),

    #[error("Error wrapping the {0} message to be sent at '{1}': {2}")]
    Wrapping(&'static str, Address, LetsError),

    #[error("Error unwrapping the {0} message at address '{1}': {2}")]
    Unwrapping(&'static str, Address, LetsError),

    #[error("user state backup cannot be restored: {0}")]
    Backup(SpongosError),

    #[error("Transport error: {0}")]
    Transport(LetsError),

    #[error("Internal Spongos error: {0}")]
    Spongos(SpongosError),
}

impl From<SpongosError> for Error {
    fn from(error: SpongosError) -> Self {
        Self::Spongos(error)
    }
}

impl From<LetsError> for Error {
    fn from(error: LetsError) -> Self {
        Self::Transport(error)
    }
}
