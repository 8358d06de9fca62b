// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit, Ed25519 as Ed25519Command, Squeeze, X25519},
        io,
        modifiers::External,
        types::{NBytes, Uint8},
    },
    error::Result as SpongosResult,
    PRP,
};

// Local
use crate::{
    id::{ed25519::Ed25519, identifier::Identifier},
    message::{ContentDecrypt, ContentSign, ContentSignSizeof},
};

/// Secret side of a user: the key pair that signs and decrypts, together with the
/// [`Identifier`] other users know it by.
#[derive(PartialEq, Eq, Hash, Debug)]
pub struct Identity {
    ed25519: Ed25519,
    identifier: Identifier,
}

impl Identity {
    pub fn new(ed25519: Ed25519) -> Self {
        let identifier = ed25519.public_key().into();
        Self { ed25519, identifier }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn ed25519(&self) -> &Ed25519 {
        &self.ed25519
    }
}

impl From<Ed25519> for Identity {
    fn from(ed25519: Ed25519) -> Self {
        Self::new(ed25519)
    }
}

impl ContentSignSizeof<Identity> for sizeof::Context {
    fn sign_sizeof(&mut self, signer: &Identity) -> SpongosResult<&mut Self> {
        let mut hash = External::new(NBytes::new([0; 64]));
        self.absorb(Uint8::new(0))?
            .commit()?
            .squeeze(hash.as_mut())?
            .ed25519(signer.ed25519.inner(), hash.as_ref())
    }
}

impl<OS, F> ContentSign<Identity> for wrap::Context<OS, F>
where
    F: PRP,
    OS: io::OStream,
{
    /// Signs the hash squeezed from the current state. The leading oneof tells the verifier
    /// which signature scheme follows.
    fn sign(&mut self, signer: &Identity) -> SpongosResult<&mut Self> {
        let mut hash = External::new(NBytes::new([0; 64]));
        self.absorb(Uint8::new(0))?
            .commit()?
            .squeeze(hash.as_mut())?
            .ed25519(signer.ed25519.inner(), hash.as_ref())
    }
}

impl<IS, F> ContentDecrypt<Identity> for unwrap::Context<IS, F>
where
    F: PRP,
    IS: io::IStream,
{
    fn decrypt(&mut self, recipient: &Identity, key: &mut [u8]) -> SpongosResult<&mut Self> {
        self.x25519(&recipient.ed25519.ke_sk(), NBytes::new(key))
    }
}
