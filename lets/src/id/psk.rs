// Rust
use core::{
    convert::{TryFrom, TryInto},
    fmt::{self, Debug, Display, Formatter, LowerHex, UpperHex},
};

// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Mask},
        io,
        types::NBytes,
    },
    error::Result as SpongosResult,
    KeccakF1600, Spongos, PRP,
};

// Local
use crate::error::{Error, Result};

/// Pre-shared key: a 32 byte secret shared out of band. Holders of a `Psk` can open the keyloads
/// that include it without being subscribed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Psk([u8; Self::SIZE]);

impl Psk {
    pub const SIZE: usize = 32;

    pub fn new(array: [u8; Self::SIZE]) -> Self {
        Self(array)
    }

    /// Derive a key from an arbitrary seed: `sponge("PSK" || seed)`
    pub fn from_seed<T>(seed: T) -> Self
    where
        T: AsRef<[u8]>,
    {
        let mut spongos = Spongos::<KeccakF1600>::init();
        spongos.absorb("PSK");
        spongos.sponge(seed)
    }

    /// Public identifier of the key, the only part of it that is ever announced
    pub fn to_pskid(self) -> PskId {
        let mut spongos = Spongos::<KeccakF1600>::init();
        spongos.absorb("PSKID");
        spongos.sponge(self)
    }
}

impl AsRef<[u8]> for Psk {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for Psk {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl TryFrom<&[u8]> for Psk {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| Error::InvalidSize("Psk", Self::SIZE, bytes.len()))
    }
}

/// Never print the key itself
impl Debug for Psk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Psk({})", self.to_pskid())
    }
}

/// 16 byte identifier of a [`Psk`]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct PskId([u8; Self::SIZE]);

impl PskId {
    pub const SIZE: usize = 16;

    pub fn new(array: [u8; Self::SIZE]) -> Self {
        Self(array)
    }

    pub fn from_seed<T>(seed: T) -> Self
    where
        T: AsRef<[u8]>,
    {
        Psk::from_seed(seed).to_pskid()
    }
}

impl AsRef<[u8]> for PskId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsMut<[u8]> for PskId {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl TryFrom<&[u8]> for PskId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| Error::InvalidSize("PskId", Self::SIZE, bytes.len()))
    }
}

impl Display for PskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        LowerHex::fmt(self, f)
    }
}

impl LowerHex for PskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self))
    }
}

impl UpperHex for PskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self))
    }
}

macro_rules! mask_nbytes {
    ($($t:ty),*) => {$(
        impl Mask<&$t> for sizeof::Context {
            fn mask(&mut self, t: &$t) -> SpongosResult<&mut Self> {
                self.mask(NBytes::new(t))
            }
        }

        impl<OS: io::OStream, F: PRP> Mask<&$t> for wrap::Context<OS, F> {
            fn mask(&mut self, t: &$t) -> SpongosResult<&mut Self> {
                self.mask(NBytes::new(t))
            }
        }

        impl<IS: io::IStream, F: PRP> Mask<&mut $t> for unwrap::Context<IS, F> {
            fn mask(&mut self, t: &mut $t) -> SpongosResult<&mut Self> {
                self.mask(NBytes::new(t))
            }
        }
    )*};
}

mask_nbytes!(Psk, PskId);
