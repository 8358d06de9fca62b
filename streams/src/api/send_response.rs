use core::fmt;

use lets::address::{Address, MsgId};

/// Outcome of publishing a message: the [`Address`] it was published at, along with whatever the
/// transport answered
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub struct SendResponse<TSR> {
    address: Address,
    transport_response: TSR,
}

impl<TSR> SendResponse<TSR> {
    pub(crate) fn new(address: Address, transport_response: TSR) -> Self {
        Self {
            address,
            transport_response,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Identifier of the message within its channel, which is what later messages link to
    pub fn link(&self) -> MsgId {
        self.address.relative()
    }

    pub fn response(&self) -> &TSR {
        &self.transport_response
    }

    pub fn into_parts(self) -> (Address, TSR) {
        (self.address, self.transport_response)
    }
}

impl<TSR> fmt::Display for SendResponse<TSR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message sent at {}", self.address)
    }
}
