//! Storage the messages of a channel are published to. A transport only knows addresses and raw
//! messages: reading them is up to the user.
// Rust
use alloc::{boxed::Box, rc::Rc, vec::Vec};
use core::cell::RefCell;

// 3rd-party
use async_trait::async_trait;

// Local
use crate::{
    address::Address,
    error::{Error, Result},
};

#[async_trait(?Send)]
pub trait Transport<'a> {
    type Msg;
    /// What the transport answers to a published message
    type SendResponse;

    async fn send_message(&mut self, address: Address, msg: Self::Msg) -> Result<Self::SendResponse>
    where
        'a: 'async_trait;

    /// All the messages published at `address`
    async fn recv_messages(&mut self, address: Address) -> Result<Vec<Self::Msg>>
    where
        'a: 'async_trait;

    /// The single message published at `address`
    async fn recv_message(&mut self, address: Address) -> Result<Self::Msg>
    where
        'a: 'async_trait,
    {
        let mut msgs = self.recv_messages(address).await?;
        if msgs.len() > 1 {
            return Err(Error::MessageNotUnique(address, msgs.len()));
        }
        msgs.pop().ok_or(Error::MessageMissing(address, "transport"))
    }
}

/// Implements [`Transport`] for a handle shared between users, reaching the inner transport
/// through `$access`
macro_rules! shared_transport {
    ($handle:ty, $access:ident) => {
        #[async_trait(?Send)]
        impl<'a, Tsp: Transport<'a>> Transport<'a> for $handle {
            type Msg = Tsp::Msg;
            type SendResponse = Tsp::SendResponse;

            async fn send_message(&mut self, address: Address, msg: Tsp::Msg) -> Result<Tsp::SendResponse>
            where
                Self::Msg: 'async_trait,
            {
                self.$access().send_message(address, msg).await
            }

            async fn recv_messages(&mut self, address: Address) -> Result<Vec<Tsp::Msg>> {
                self.$access().recv_messages(address).await
            }
        }
    };
}

shared_transport!(Rc<RefCell<Tsp>>, borrow_mut);

// `sync-parking-lot` wins when both features are enabled
#[cfg(any(feature = "sync-spin", feature = "sync-parking-lot"))]
mod sync {
    use alloc::{boxed::Box, sync::Arc, vec::Vec};

    use async_trait::async_trait;
    #[cfg(feature = "sync-parking-lot")]
    use parking_lot::Mutex;
    #[cfg(all(feature = "sync-spin", not(feature = "sync-parking-lot")))]
    use spin::Mutex;

    use super::Transport;
    use crate::{address::Address, error::Result};

    shared_transport!(Arc<Mutex<Tsp>>, lock);
}

/// In-memory transport
pub mod bucket;
