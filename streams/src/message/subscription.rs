//! A user asks to join a channel with a subscription, linked to the announcement.
//!
//! The subscriber draws a random unsubscribe key and encrypts it to the author over x25519. Its
//! identifier is then masked under that key, so only the author learns who subscribed. The
//! state reached at the end of the message is what a later unsubscription joins.
//!
//! ```ddml
//! message Subscription {
//!     join(spongos);
//!     x25519(pub/priv_key)    u8      x25519_ephemeral_pubkey[32];
//!     commit;
//!     mask                    u8      unsubscribe_key[32];
//!     mask                    u8      identifier[33];
//!     absorb                  u8      sig_type(0);
//!     commit;
//!     squeeze external        u8      hash[64];
//!     ed25519(hash)           u8      signature[64];
//! }
//! ```

// Streams
use lets::{
    id::{Identifier, Identity},
    message::{
        ContentDecrypt, ContentEncrypt, ContentEncryptSizeOf, ContentSign, ContentSignSizeof, ContentSizeof,
        ContentUnwrap, ContentVerify, ContentWrap,
    },
};
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Join, Mask},
        io,
    },
    error::Result,
    Spongos,
};

pub(crate) const UNSUBSCRIBE_KEY_SIZE: usize = 32;

pub(crate) struct Wrap<'a> {
    announcement_state: &'a mut Spongos,
    unsubscribe_key: [u8; UNSUBSCRIBE_KEY_SIZE],
    subscriber: &'a Identity,
    author: &'a Identifier,
}

impl<'a> Wrap<'a> {
    pub(crate) fn new(
        announcement_state: &'a mut Spongos,
        unsubscribe_key: [u8; UNSUBSCRIBE_KEY_SIZE],
        subscriber: &'a Identity,
        author: &'a Identifier,
    ) -> Self {
        Self {
            announcement_state,
            unsubscribe_key,
            subscriber,
            author,
        }
    }
}

impl<'a> ContentSizeof<Wrap<'a>> for sizeof::Context {
    fn sizeof(&mut self, content: &Wrap<'a>) -> Result<&mut Self> {
        self.encrypt_sizeof(content.author, &content.unsubscribe_key)?
            .mask(content.subscriber.identifier())?
            .sign_sizeof(content.subscriber)
    }
}

impl<'a, OS> ContentWrap<Wrap<'a>> for wrap::Context<OS>
where
    OS: io::OStream,
{
    fn wrap(&mut self, content: &mut Wrap<'a>) -> Result<&mut Self> {
        self.join(content.announcement_state)?
            .encrypt(content.author, &content.unsubscribe_key)?
            .mask(content.subscriber.identifier())?
            .sign(content.subscriber)
    }
}

/// Read by the author, who alone can decrypt the unsubscribe key
pub(crate) struct Unwrap<'a> {
    announcement_state: &'a mut Spongos,
    author: &'a Identity,
    unsubscribe_key: [u8; UNSUBSCRIBE_KEY_SIZE],
    subscriber: Identifier,
}

impl<'a> Unwrap<'a> {
    pub(crate) fn new(announcement_state: &'a mut Spongos, author: &'a Identity) -> Self {
        Self {
            announcement_state,
            author,
            unsubscribe_key: [0; UNSUBSCRIBE_KEY_SIZE],
            subscriber: Identifier::default(),
        }
    }

    pub(crate) fn subscriber_identifier(&self) -> &Identifier {
        &self.subscriber
    }

    pub(crate) fn into_subscriber_identifier(self) -> Identifier {
        self.subscriber
    }

    #[cfg(test)]
    pub(crate) fn unsubscribe_key(&self) -> [u8; UNSUBSCRIBE_KEY_SIZE] {
        self.unsubscribe_key
    }
}

impl<'a, IS> ContentUnwrap<Unwrap<'a>> for unwrap::Context<IS>
where
    IS: io::IStream,
{
    fn unwrap(&mut self, content: &mut Unwrap<'a>) -> Result<&mut Self> {
        self.join(content.announcement_state)?
            .decrypt(content.author, &mut content.unsubscribe_key)?
            .mask(&mut content.subscriber)?
            .verify(&content.subscriber)
    }
}
