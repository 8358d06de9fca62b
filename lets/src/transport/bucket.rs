// Rust
use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};

// 3rd-party
use async_trait::async_trait;

// Local
use crate::{
    address::Address,
    error::{Error, Result},
    message::TransportMessage,
    transport::Transport,
};

/// Transport that keeps every message in memory. Messages sent to the same address accumulate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Client<Msg = TransportMessage> {
    // BTreeMap keeps the client no_std without pulling a hasher
    bucket: BTreeMap<Address, Vec<Msg>>,
}

impl<Msg> Client<Msg> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of addresses holding at least one message
    pub fn len(&self) -> usize {
        self.bucket.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bucket.is_empty()
    }
}

// Deriving Default would require `Msg: Default`
impl<Msg> Default for Client<Msg> {
    fn default() -> Self {
        Self {
            bucket: BTreeMap::default(),
        }
    }
}

#[async_trait(?Send)]
impl<Msg> Transport<'_> for Client<Msg>
where
    Msg: Clone,
{
    type Msg = Msg;
    type SendResponse = Msg;

    /// Stores `msg` at `address` and hands it back as the send response
    async fn send_message(&mut self, address: Address, msg: Msg) -> Result<Msg>
    where
        Self::Msg: 'async_trait,
    {
        self.bucket.entry(address).or_default().push(msg.clone());
        Ok(msg)
    }

    async fn recv_messages(&mut self, address: Address) -> Result<Vec<Msg>> {
        self.bucket
            .get(&address)
            .cloned()
            .ok_or(Error::MessageMissing(address, "bucket"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stored_message_is_received() -> Result<()> {
        let mut client = Client::new();
        let address = Address::new([1; 40], [1; 12]);
        client.send_message(address, TransportMessage::new(vec![1, 2, 3])).await?;

        assert_eq!(client.recv_message(address).await?, TransportMessage::new(vec![1, 2, 3]));
        assert_eq!(client.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn missing_address_is_reported() {
        let mut client = Client::<TransportMessage>::new();
        let address = Address::new([1; 40], [2; 12]);
        assert!(matches!(
            client.recv_message(address).await,
            Err(Error::MessageMissing(a, "bucket")) if a == address
        ));
    }

    #[tokio::test]
    async fn duplicated_address_is_not_unique() -> Result<()> {
        let mut client = Client::new();
        let address = Address::new([1; 40], [3; 12]);
        client.send_message(address, TransportMessage::new(vec![1])).await?;
        client.send_message(address, TransportMessage::new(vec![2])).await?;

        assert!(matches!(
            client.recv_message(address).await,
            Err(Error::MessageNotUnique(_, 2))
        ));
        assert_eq!(client.recv_messages(address).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn shared_client_sees_messages_of_every_handle() -> Result<()> {
        use alloc::rc::Rc;
        use core::cell::RefCell;

        let shared = Rc::new(RefCell::new(Client::new()));
        let mut sender = shared.clone();
        let mut receiver = shared;
        let address = Address::new([4; 40], [4; 12]);
        sender.send_message(address, TransportMessage::new(vec![9])).await?;
        assert_eq!(receiver.recv_message(address).await?.into_body(), vec![9]);
        Ok(())
    }
}
