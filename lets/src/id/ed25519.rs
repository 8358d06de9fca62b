// Rust
use core::hash::Hash;

// IOTA
use crypto::{keys::x25519, signatures::ed25519};

// Streams
use spongos::{KeccakF1600, SpongosRng};

/// Wrapper for [`ed25519::SecretKey`]
pub struct Ed25519(ed25519::SecretKey);

impl Ed25519 {
    pub fn new(secret: ed25519::SecretKey) -> Self {
        Self(secret)
    }

    /// Derives the secret key from `seed`: the seed keys a [`SpongosRng`] that the key is then
    /// generated with, so the same seed always gives the same key pair.
    pub fn from_seed<T>(seed: T) -> Self
    where
        T: AsRef<[u8]>,
    {
        Self(ed25519::SecretKey::generate_with(&mut SpongosRng::<KeccakF1600>::new(
            seed,
        )))
    }

    pub fn from_bytes(bytes: [u8; ed25519::SECRET_KEY_LENGTH]) -> Self {
        Self(ed25519::SecretKey::from_bytes(bytes))
    }

    pub fn public_key(&self) -> ed25519::PublicKey {
        self.0.public_key()
    }

    /// Key exchange secret derived from the signing key
    pub(crate) fn ke_sk(&self) -> x25519::SecretKey {
        (&self.0).into()
    }

    pub(crate) fn inner(&self) -> &ed25519::SecretKey {
        &self.0
    }
}

impl PartialEq for Ed25519 {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for Ed25519 {}

impl Hash for Ed25519 {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.0.as_slice().hash(state);
    }
}

impl AsRef<[u8]> for Ed25519 {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<ed25519::SecretKey> for Ed25519 {
    fn from(secret_key: ed25519::SecretKey) -> Self {
        Self(secret_key)
    }
}

impl core::fmt::Debug for Ed25519 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Ed25519").field(&hex::encode(self.public_key())).finish()
    }
}
