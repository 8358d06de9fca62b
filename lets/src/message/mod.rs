mod content;
mod hdf;
mod message;
mod pcf;
mod preparsed;
mod transport;
/// Frame versions and encodings
pub mod version;

pub use content::{
    ContentDecrypt, ContentEncrypt, ContentEncryptSizeOf, ContentSign, ContentSignSizeof, ContentSizeof, ContentUnwrap,
    ContentVerify, ContentWrap,
};
pub use hdf::HDF;
pub use message::Message;
pub use pcf::PCF;
/// Message whose header is read, waiting for the state its content joins
pub use preparsed::PreparsedMessage;
pub use transport::TransportMessage;

#[cfg(test)]
mod tests;
