// Rust
use core::convert::TryFrom;

// IOTA
use crypto::{keys::x25519, signatures::ed25519};

// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit, Ed25519 as Ed25519Command, Guard, Mask, Squeeze, X25519},
        io,
        modifiers::External,
        types::{NBytes, Uint8},
    },
    error::{Error as SpongosError, Result as SpongosResult},
    PRP,
};

// Local
use crate::message::{ContentEncrypt, ContentEncryptSizeOf, ContentVerify};

/// Public identification of a user: what other users verify signatures and encrypt keys with.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Identifier {
    /// Ed25519 public key
    Ed25519(ed25519::PublicKey),
}

impl core::fmt::Debug for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Ed25519(pk) => f.debug_tuple("Ed25519").field(&hex::encode(pk)).finish(),
        }
    }
}

impl Identifier {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Identifier::Ed25519(public_key) => public_key.as_slice(),
        }
    }

    /// Key exchange public key, derived from the Ed25519 public key
    pub fn ke_pk(&self) -> SpongosResult<x25519::PublicKey> {
        match self {
            Identifier::Ed25519(pk) => {
                x25519::PublicKey::try_from(pk).map_err(|_| SpongosError::KeyConversion("ed25519 public"))
            }
        }
    }

    fn oneof(&self) -> Uint8 {
        match self {
            Identifier::Ed25519(_) => Uint8::new(0),
        }
    }
}

/// Placeholder overwritten when an identifier is unwrapped: the public key of the all-zero secret
/// key.
impl Default for Identifier {
    fn default() -> Self {
        Identifier::Ed25519(ed25519::SecretKey::from_bytes([0; ed25519::SECRET_KEY_LENGTH]).public_key())
    }
}

impl From<ed25519::PublicKey> for Identifier {
    fn from(pk: ed25519::PublicKey) -> Self {
        Identifier::Ed25519(pk)
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl core::fmt::LowerHex for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", hex::encode(self))
    }
}

impl core::fmt::UpperHex for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", hex::encode_upper(self))
    }
}

impl core::fmt::Display for Identifier {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(self, f)
    }
}

/// An identifier is encoded as its oneof tag followed by the key, either plain or masked.
macro_rules! identifier_command {
    ($($command:ident :: $method:ident),*) => {$(
        impl $command<&Identifier> for sizeof::Context {
            fn $method(&mut self, identifier: &Identifier) -> SpongosResult<&mut Self> {
                match identifier {
                    Identifier::Ed25519(pk) => self.$method(identifier.oneof())?.$method(pk),
                }
            }
        }

        impl<OS: io::OStream, F: PRP> $command<&Identifier> for wrap::Context<OS, F> {
            fn $method(&mut self, identifier: &Identifier) -> SpongosResult<&mut Self> {
                match identifier {
                    Identifier::Ed25519(pk) => self.$method(identifier.oneof())?.$method(pk),
                }
            }
        }

        impl<IS: io::IStream, F: PRP> $command<&mut Identifier> for unwrap::Context<IS, F> {
            fn $method(&mut self, identifier: &mut Identifier) -> SpongosResult<&mut Self> {
                let mut oneof = Uint8::default();
                self.$method(&mut oneof)?;
                match oneof.inner() {
                    0 => {
                        let mut pk = [0u8; ed25519::PUBLIC_KEY_LENGTH];
                        self.$method(NBytes::new(&mut pk))?;
                        let pk = ed25519::PublicKey::try_from_bytes(pk)
                            .map_err(|_| SpongosError::InvalidKey("ed25519 public key"))?;
                        *identifier = Identifier::Ed25519(pk);
                    }
                    o => return Err(SpongosError::InvalidOption("identifier", o)),
                }
                Ok(self)
            }
        }
    )*};
}

identifier_command!(Absorb::absorb, Mask::mask);

impl<IS, F> ContentVerify<Identifier> for unwrap::Context<IS, F>
where
    F: PRP,
    IS: io::IStream,
{
    /// Verifies the Ed25519 signature over the hash squeezed from the current state.
    fn verify(&mut self, verifier: &Identifier) -> SpongosResult<&mut Self> {
        let mut oneof = Uint8::default();
        self.absorb(&mut oneof)?;
        let Identifier::Ed25519(public_key) = verifier;
        let mut hash = External::new(NBytes::new([0; 64]));
        self.guard(
            oneof == verifier.oneof(),
            SpongosError::InvalidOption("signature", oneof.inner()),
        )?
        .commit()?
        .squeeze(hash.as_mut())?
        .ed25519(public_key, hash.as_ref())
    }
}

impl ContentEncryptSizeOf<Identifier> for sizeof::Context {
    fn encrypt_sizeof(&mut self, recipient: &Identifier, key: &[u8]) -> SpongosResult<&mut Self> {
        self.x25519(&recipient.ke_pk()?, NBytes::new(key))
    }
}

impl<OS, F> ContentEncrypt<Identifier> for wrap::Context<OS, F>
where
    F: PRP,
    OS: io::OStream,
{
    fn encrypt(&mut self, recipient: &Identifier, key: &[u8]) -> SpongosResult<&mut Self> {
        self.x25519(&recipient.ke_pk()?, NBytes::new(key))
    }
}
