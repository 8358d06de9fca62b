//! Packets carry the application data of a channel: a public payload, readable by anyone holding
//! the linked state, and a masked payload. Both kinds differ only in how the payloads are
//! authenticated.
//!
//! A signed packet proves who published it:
//! ```ddml
//! message SignedPacket {
//!     join(spongos);
//!     absorb              uint    public_size;
//!     absorb              u8      public_payload[public_size];
//!     mask                uint    masked_size;
//!     mask                u8      masked_payload[masked_size];
//!     absorb              u8      sig_type(0);
//!     commit;
//!     squeeze external    u8      hash[64];
//!     ed25519(hash)       u8      signature[64];
//!     commit;
//! }
//! ```
//!
//! A tagged packet only proves it was published by someone holding the linked state:
//! ```ddml
//! message TaggedPacket {
//!     join(spongos);
//!     absorb bytes public_payload;
//!     mask bytes masked_payload;
//!     commit;
//!     squeeze byte mac[32];
//! }
//! ```
// Rust
use alloc::vec::Vec;

// Streams
use lets::{
    id::{Identifier, Identity},
    message::{ContentSign, ContentSignSizeof, ContentSizeof, ContentUnwrap, ContentVerify, ContentWrap},
};
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit, Join, Mask, Squeeze},
        io,
        types::{Bytes, Mac},
    },
    error::Result,
    Spongos,
};

/// Tag of a tagged packet
const MAC: Mac = Mac::new(32);

pub(crate) struct Wrap<'a> {
    initial_state: &'a mut Spongos,
    public_payload: &'a [u8],
    masked_payload: &'a [u8],
    /// Signs the packet if present, tags it otherwise
    signer: Option<&'a Identity>,
}

impl<'a> Wrap<'a> {
    pub(crate) fn signed(
        initial_state: &'a mut Spongos,
        signer: &'a Identity,
        public_payload: &'a [u8],
        masked_payload: &'a [u8],
    ) -> Self {
        Self {
            initial_state,
            public_payload,
            masked_payload,
            signer: Some(signer),
        }
    }

    pub(crate) fn tagged(initial_state: &'a mut Spongos, public_payload: &'a [u8], masked_payload: &'a [u8]) -> Self {
        Self {
            initial_state,
            public_payload,
            masked_payload,
            signer: None,
        }
    }
}

impl<'a> ContentSizeof<Wrap<'a>> for sizeof::Context {
    fn sizeof(&mut self, packet: &Wrap<'a>) -> Result<&mut Self> {
        self.absorb(Bytes::new(packet.public_payload))?
            .mask(Bytes::new(packet.masked_payload))?;
        match packet.signer {
            Some(signer) => self.sign_sizeof(signer)?.commit(),
            None => self.commit()?.squeeze(&MAC),
        }
    }
}

impl<'a, OS> ContentWrap<Wrap<'a>> for wrap::Context<OS>
where
    OS: io::OStream,
{
    fn wrap(&mut self, packet: &mut Wrap<'a>) -> Result<&mut Self> {
        self.join(packet.initial_state)?
            .absorb(Bytes::new(packet.public_payload))?
            .mask(Bytes::new(packet.masked_payload))?;
        match packet.signer {
            Some(signer) => self.sign(signer)?.commit(),
            None => self.commit()?.squeeze(&MAC),
        }
    }
}

pub(crate) struct Unwrap<'a> {
    initial_state: &'a mut Spongos,
    /// Expected signer of a signed packet, `None` for a tagged packet
    publisher: Option<&'a Identifier>,
    public_payload: Vec<u8>,
    masked_payload: Vec<u8>,
}

impl<'a> Unwrap<'a> {
    /// Reads a signed packet, whose signature must verify against `publisher`
    pub(crate) fn signed(initial_state: &'a mut Spongos, publisher: &'a Identifier) -> Self {
        Self {
            initial_state,
            publisher: Some(publisher),
            public_payload: Vec::new(),
            masked_payload: Vec::new(),
        }
    }

    pub(crate) fn tagged(initial_state: &'a mut Spongos) -> Self {
        Self {
            initial_state,
            publisher: None,
            public_payload: Vec::new(),
            masked_payload: Vec::new(),
        }
    }

    /// Signer of the packet, if it was signed
    pub(crate) fn signer(&self) -> Option<&Identifier> {
        self.publisher
    }

    /// Consumes the packet, returning its public and masked payloads
    pub(crate) fn into_payloads(self) -> (Vec<u8>, Vec<u8>) {
        (self.public_payload, self.masked_payload)
    }
}

impl<'a, IS> ContentUnwrap<Unwrap<'a>> for unwrap::Context<IS>
where
    IS: io::IStream,
{
    fn unwrap(&mut self, packet: &mut Unwrap<'a>) -> Result<&mut Self> {
        self.join(packet.initial_state)?
            .absorb(Bytes::new(&mut packet.public_payload))?
            .mask(Bytes::new(&mut packet.masked_payload))?;
        match packet.publisher {
            Some(publisher) => self.verify(publisher)?.commit(),
            None => self.commit()?.squeeze(&MAC),
        }
    }
}
