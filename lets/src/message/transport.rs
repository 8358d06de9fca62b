use alloc::vec::Vec;

use spongos::PRP;

use crate::{error::Result, message::preparsed::PreparsedMessage};

/// Encoded message, the unit a [`Transport`](crate::transport::Transport) moves around
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TransportMessage(Vec<u8>);

impl TransportMessage {
    pub fn new(body: Vec<u8>) -> Self {
        Self(body)
    }

    pub fn body(&self) -> &[u8] {
        self.as_ref()
    }

    pub fn into_body(self) -> Vec<u8> {
        self.0
    }

    /// Reads the header only. See [`PreparsedMessage`].
    pub fn parse_header<F>(self) -> Result<PreparsedMessage<F>>
    where
        F: PRP + Default,
    {
        PreparsedMessage::parse(self)
    }
}

impl AsRef<[u8]> for TransportMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for TransportMessage {
    fn from(body: Vec<u8>) -> Self {
        Self::new(body)
    }
}

impl From<TransportMessage> for Vec<u8> {
    fn from(message: TransportMessage) -> Self {
        message.0
    }
}
