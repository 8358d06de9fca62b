//! A subscriber leaves the channel by publishing an unsubscription linked to its own
//! subscription. Only the author shares the state of that subscription, so nobody else learns who
//! left.
//!
//! ```ddml
//! message Unsubscription {
//!     join(spongos);
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
    message::{ContentSign, ContentSignSizeof, ContentSizeof, ContentUnwrap, ContentVerify, ContentWrap},
};
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Join, Mask},
        io,
    },
    error::Result,
    Spongos,
};

pub(crate) struct Wrap<'a> {
    /// State of the subscription being revoked
    subscription_state: &'a mut Spongos,
    subscriber: &'a Identity,
}

impl<'a> Wrap<'a> {
    pub(crate) fn new(subscription_state: &'a mut Spongos, subscriber: &'a Identity) -> Self {
        Self {
            subscription_state,
            subscriber,
        }
    }
}

impl<'a> ContentSizeof<Wrap<'a>> for sizeof::Context {
    fn sizeof(&mut self, content: &Wrap<'a>) -> Result<&mut Self> {
        self.mask(content.subscriber.identifier())?.sign_sizeof(content.subscriber)
    }
}

impl<'a, OS> ContentWrap<Wrap<'a>> for wrap::Context<OS>
where
    OS: io::OStream,
{
    fn wrap(&mut self, content: &mut Wrap<'a>) -> Result<&mut Self> {
        self.join(content.subscription_state)?
            .mask(content.subscriber.identifier())?
            .sign(content.subscriber)
    }
}

pub(crate) struct Unwrap<'a> {
    subscription_state: &'a mut Spongos,
    subscriber: Identifier,
}

impl<'a> Unwrap<'a> {
    pub(crate) fn new(subscription_state: &'a mut Spongos) -> Self {
        Self {
            subscription_state,
            subscriber: Identifier::default(),
        }
    }

    /// Subscriber leaving, whose signature was verified
    pub(crate) fn into_subscriber(self) -> Identifier {
        self.subscriber
    }
}

impl<'a, IS> ContentUnwrap<Unwrap<'a>> for unwrap::Context<IS>
where
    IS: io::IStream,
{
    fn unwrap(&mut self, content: &mut Unwrap<'a>) -> Result<&mut Self> {
        self.join(content.subscription_state)?
            .mask(&mut content.subscriber)?
            .verify(&content.subscriber)
    }
}
