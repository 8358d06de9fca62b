//! `Announce` message _wrapping_ and _unwrapping_.
//!
//! The `Announce` message is the _genesis_ message of a Stream.
//!
//! It announces the stream owner's identifier and the branching mode of the stream. The
//! `Announce` message is similar to a self-signed certificate in a conventional PKI.
//!
//! ```ddml
//! message Announce {
//!     absorb           u8     identifier[33];
//!     absorb           u8     flags;
//!     absorb           u8     sig_type(0);
//!     commit;
//!     squeeze external u8     hash[64];
//!     ed25519(hash)    u8     signature[64];
//!     commit;
//! }
//! ```

// Streams
use lets::{
    id::{Identifier, Identity},
    message::{ContentSign, ContentSignSizeof, ContentSizeof, ContentUnwrap, ContentVerify, ContentWrap},
};
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit},
        io,
        types::Uint8,
    },
    error::Result,
};

/// Bit of the announcement flags set when the stream is multi-branching
const MULTI_BRANCHING: u8 = 0b0000_0001;

pub(crate) struct Wrap<'a> {
    author_id: &'a Identity,
    multi_branching: bool,
}

impl<'a> Wrap<'a> {
    pub(crate) fn new(author_id: &'a Identity, multi_branching: bool) -> Self {
        Self {
            author_id,
            multi_branching,
        }
    }

    fn flags(&self) -> Uint8 {
        if self.multi_branching {
            Uint8::new(MULTI_BRANCHING)
        } else {
            Uint8::new(0)
        }
    }
}

impl<'a> ContentSizeof<Wrap<'a>> for sizeof::Context {
    fn sizeof(&mut self, announcement: &Wrap<'a>) -> Result<&mut Self> {
        self.absorb(announcement.author_id.identifier())?
            .absorb(announcement.flags())?
            .sign_sizeof(announcement.author_id)?
            .commit()
    }
}

impl<'a, OS> ContentWrap<Wrap<'a>> for wrap::Context<OS>
where
    OS: io::OStream,
{
    fn wrap(&mut self, announcement: &mut Wrap<'a>) -> Result<&mut Self> {
        self.absorb(announcement.author_id.identifier())?
            .absorb(announcement.flags())?
            .sign(announcement.author_id)?
            .commit()
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Default, Debug)]
pub(crate) struct Unwrap {
    author_id: Identifier,
    flags: u8,
}

impl Unwrap {
    #[cfg(test)]
    pub(crate) fn author_id(&self) -> &Identifier {
        &self.author_id
    }

    pub(crate) fn into_author_id(self) -> Identifier {
        self.author_id
    }

    pub(crate) fn is_multi_branching(&self) -> bool {
        self.flags & MULTI_BRANCHING != 0
    }
}

impl<IS> ContentUnwrap<Unwrap> for unwrap::Context<IS>
where
    IS: io::IStream,
{
    fn unwrap(&mut self, announcement: &mut Unwrap) -> Result<&mut Self> {
        let mut flags = Uint8::default();
        self.absorb(&mut announcement.author_id)?
            .absorb(&mut flags)?
            .verify(&announcement.author_id)?
            .commit()?;
        announcement.flags = flags.inner();
        Ok(self)
    }
}
