//! A keyload hands a fresh session key to the readers of a branch. Messages linked to the keyload
//! join the state reached once the key is absorbed, which only its readers can compute.
//!
//! Each subscriber gets the key through x25519, each PSK holder under its PSK. Every recipient
//! slot is a fork of the main state, so a reader can skip the slots meant for others.
//!
//! ```ddml
//! message Keyload {
//!     join(spongos);
//!     absorb                      u8  nonce[16];
//!     absorb                      size n_subscribers;
//!     repeated(n_subscribers):
//!       fork;
//!       mask                      u8  permission;
//!       mask                      u8  identifier[33];
//!       x25519(pub_key)           u8  x25519_ephemeral_pubkey[32];
//!       commit;
//!       mask                      u8  key[32];
//!     absorb                      size n_psks;
//!     repeated(n_psks):
//!       fork;
//!       mask                      u8  psk_id[16];
//!       absorb external           u8  psk[32];
//!       commit;
//!       mask                      u8  key[32];
//!     absorb external             u8  key[32];
//!     absorb                      u8  sig_type(0);
//!     commit;
//!     squeeze external            u8  hash[64];
//!     ed25519(hash)               u8  signature[64];
//!     commit;
//! }
//! ```
// Rust
use alloc::vec::Vec;

// IOTA
use crypto::keys::x25519;
use hashbrown::HashMap;

// Streams
use lets::{
    id::{Identifier, Identity, Permissioned, Psk, PskId},
    message::{
        ContentDecrypt, ContentEncrypt, ContentEncryptSizeOf, ContentSign, ContentSignSizeof, ContentSizeof,
        ContentUnwrap, ContentVerify, ContentWrap,
    },
};
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit, Fork, Join, Mask},
        io,
        modifiers::External,
        types::{NBytes, Size},
    },
    error::Result,
    Spongos,
};

pub(crate) const NONCE_SIZE: usize = 16;
pub(crate) const KEY_SIZE: usize = 32;

/// Length of a subscriber slot past the identifier: ephemeral public key and encrypted key
const SUBSCRIBER_SLOT_TAIL: usize = x25519::PUBLIC_KEY_LENGTH + KEY_SIZE;

pub(crate) struct Wrap<'a> {
    linked_state: &'a mut Spongos,
    subscribers: &'a [Permissioned<&'a Identifier>],
    psks: &'a [(PskId, Psk)],
    session_key: [u8; KEY_SIZE],
    nonce: [u8; NONCE_SIZE],
    author: &'a Identity,
}

impl<'a> Wrap<'a> {
    pub(crate) fn new(
        linked_state: &'a mut Spongos,
        subscribers: &'a [Permissioned<&'a Identifier>],
        psks: &'a [(PskId, Psk)],
        session_key: [u8; KEY_SIZE],
        nonce: [u8; NONCE_SIZE],
        author: &'a Identity,
    ) -> Self {
        Self {
            linked_state,
            subscribers,
            psks,
            session_key,
            nonce,
            author,
        }
    }
}

impl<'a> ContentSizeof<Wrap<'a>> for sizeof::Context {
    fn sizeof(&mut self, keyload: &Wrap<'a>) -> Result<&mut sizeof::Context> {
        let session_key = NBytes::new(&keyload.session_key);
        self.absorb(NBytes::new(keyload.nonce))?
            .absorb(Size::new(keyload.subscribers.len()))?;
        for permission in keyload.subscribers {
            self.fork()
                .mask(permission)?
                .encrypt_sizeof(*permission.identifier(), &keyload.session_key)?;
        }
        self.absorb(Size::new(keyload.psks.len()))?;
        for (psk_id, psk) in keyload.psks {
            self.fork()
                .mask(psk_id)?
                .absorb(External::new(&NBytes::new(psk)))?
                .commit()?
                .mask(session_key)?;
        }
        self.absorb(External::new(&session_key))?
            .sign_sizeof(keyload.author)?
            .commit()
    }
}

impl<'a, OS> ContentWrap<Wrap<'a>> for wrap::Context<OS>
where
    OS: io::OStream,
{
    fn wrap(&mut self, keyload: &mut Wrap<'a>) -> Result<&mut Self> {
        let session_key = NBytes::new(&keyload.session_key);
        self.join(keyload.linked_state)?
            .absorb(NBytes::new(keyload.nonce))?
            .absorb(Size::new(keyload.subscribers.len()))?;
        for permission in keyload.subscribers {
            self.fork()
                .mask(permission)?
                .encrypt(*permission.identifier(), &keyload.session_key)?;
        }
        self.absorb(Size::new(keyload.psks.len()))?;
        for (psk_id, psk) in keyload.psks {
            self.fork()
                .mask(psk_id)?
                .absorb(External::new(&NBytes::new(psk)))?
                .commit()?
                .mask(session_key)?;
        }
        self.absorb(External::new(&session_key))?
            .sign(keyload.author)?
            .commit()
    }
}

/// Reads a keyload as `reader`, or as a plain PSK holder when there is no reader identity.
///
/// Every recipient is listed, whether or not the session key could be recovered.
pub(crate) struct Unwrap<'a> {
    linked_state: &'a mut Spongos,
    reader: Option<&'a Identity>,
    author: &'a Identifier,
    psk_store: &'a HashMap<PskId, Psk>,
    subscribers: Vec<Permissioned<Identifier>>,
    psks: Vec<PskId>,
    session_key: Option<[u8; KEY_SIZE]>,
}

impl<'a> Unwrap<'a> {
    pub(crate) fn new(
        linked_state: &'a mut Spongos,
        reader: Option<&'a Identity>,
        author: &'a Identifier,
        psk_store: &'a HashMap<PskId, Psk>,
    ) -> Self {
        Self {
            linked_state,
            reader,
            author,
            psk_store,
            subscribers: Vec::new(),
            psks: Vec::new(),
            session_key: None,
        }
    }

    /// Whether the session key was recovered
    pub(crate) fn is_readable(&self) -> bool {
        self.session_key.is_some()
    }

    pub(crate) fn into_parts(self) -> (Vec<Permissioned<Identifier>>, Vec<PskId>) {
        (self.subscribers, self.psks)
    }

    /// The reader, if `subscriber` is the reader and no key was recovered yet
    fn reader_slot(&self, subscriber: &Identifier) -> Option<&'a Identity> {
        self.reader
            .filter(|reader| self.session_key.is_none() && reader.identifier() == subscriber)
    }

    /// The stored PSK under `psk_id`, if no key was recovered yet
    fn psk_slot(&self, psk_id: &PskId) -> Option<&'a Psk> {
        let psk_store: &'a HashMap<PskId, Psk> = self.psk_store;
        psk_store.get(psk_id).filter(|_| self.session_key.is_none())
    }
}

impl<'a, IS> ContentUnwrap<Unwrap<'a>> for unwrap::Context<IS>
where
    IS: io::IStream,
{
    fn unwrap(&mut self, keyload: &mut Unwrap<'a>) -> Result<&mut Self> {
        let mut nonce = [0u8; NONCE_SIZE];
        let mut subscribers_count = Size::default();
        self.join(keyload.linked_state)?
            .absorb(NBytes::new(&mut nonce))?
            .absorb(&mut subscribers_count)?;
        for _ in 0..subscribers_count.inner() {
            let mut slot = self.fork();
            let mut permission = Permissioned::<Identifier>::default();
            slot.mask(&mut permission)?;
            if let Some(reader) = keyload.reader_slot(permission.identifier()) {
                let mut session_key = [0u8; KEY_SIZE];
                slot.decrypt(reader, &mut session_key)?;
                keyload.session_key = Some(session_key);
            } else {
                slot.drop(SUBSCRIBER_SLOT_TAIL)?;
            }
            keyload.subscribers.push(permission);
        }

        let mut psks_count = Size::default();
        self.absorb(&mut psks_count)?;
        for _ in 0..psks_count.inner() {
            let mut slot = self.fork();
            let mut psk_id = PskId::default();
            slot.mask(&mut psk_id)?;
            if let Some(psk) = keyload.psk_slot(&psk_id) {
                let mut session_key = [0u8; KEY_SIZE];
                slot.absorb(External::new(&NBytes::new(psk)))?
                    .commit()?
                    .mask(NBytes::new(&mut session_key))?;
                keyload.session_key = Some(session_key);
            } else {
                slot.drop(KEY_SIZE)?;
            }
            keyload.psks.push(psk_id);
        }

        // An outsider stops here: the signature is over the session key
        if let Some(session_key) = keyload.session_key {
            self.absorb(External::new(&NBytes::new(&session_key)))?
                .verify(keyload.author)?
                .commit()?;
        }
        Ok(self)
    }
}
