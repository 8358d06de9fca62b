// Rust
use alloc::string::{String, ToString};
use core::{
    convert::TryInto,
    fmt::{self, Display, Formatter, LowerHex, UpperHex},
    str::FromStr,
};

// IOTA
use crypto::hashes::{blake2b::Blake2b256, Digest};

// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Mask},
        io,
        types::NBytes,
    },
    error::Result as SpongosResult,
    KeccakF1600, Spongos, PRP,
};

// Local
use crate::{
    error::{Error, Result},
    id::Identifier,
};

/// Location of a message: the [application address](`AppAddr`) shared by every message of a
/// channel, plus the [message identifier](`MsgId`) of the message within it.
///
/// ## exchangeable encoding
/// An `Address` is exchanged as the colon-separated hex encoding of both parts, produced by
/// [`Address::to_string()`][Display] and read back by [`Address::from_str`]:
/// ```
/// # use lets::address::Address;
/// let address = Address::new([170; 40], [255; 12]);
/// let address_str = address.to_string();
/// assert_eq!(
///     address_str,
///     "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:ffffffffffffffffffffffff"
/// );
/// assert_eq!(address_str.parse::<Address>().unwrap(), address);
/// ```
///
/// [Display]: #impl-Display
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Address {
    appaddr: AppAddr,
    msgid: MsgId,
}

impl Address {
    pub fn new<A, M>(appaddr: A, msgid: M) -> Self
    where
        A: Into<AppAddr>,
        M: Into<MsgId>,
    {
        Self {
            appaddr: appaddr.into(),
            msgid: msgid.into(),
        }
    }

    /// Returns the [Message Id](`MsgId`)
    pub fn relative(self) -> MsgId {
        self.msgid
    }

    /// Returns the [Application Address](`AppAddr`)
    pub fn base(self) -> AppAddr {
        self.appaddr
    }

    /// Index of the message in the transport: `Blake2b256(appaddr || msgid)`
    pub fn to_msg_index(self) -> [u8; 32] {
        let hasher = Blake2b256::new();
        hasher.chain(self.appaddr).chain(self.msgid).finalize().into()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}:{:x}", self.appaddr, self.msgid)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(string: &str) -> Result<Address> {
        let (appaddr_str, msgid_str) = string
            .split_once(':')
            .ok_or_else(|| Error::Malformed("address string", ":", string.to_string()))?;
        Ok(Address {
            appaddr: appaddr_str.parse()?,
            msgid: msgid_str.parse()?,
        })
    }
}

/// Decode a fixed size hex string
fn decode_hex<const N: usize>(name: &'static str, s: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(s).map_err(|e| Error::Encoding(name, "hexadecimal", e))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| Error::InvalidSize(name, N, len))
}

/// Fixed size identifier exchanged as lowercase hex
macro_rules! byte_id {
    ($(#[$attr:meta])* $name:ident, $size:literal) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $size]);

        impl $name {
            pub const SIZE: usize = $size;

            pub fn new(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }

            pub fn to_hex_string(self) -> String {
                hex::encode(self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0; $size])
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                decode_hex(stringify!($name), s).map(Self)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                LowerHex::fmt(self, f)
            }
        }

        impl LowerHex for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl UpperHex for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode_upper(self.0))
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl AsMut<[u8]> for $name {
            fn as_mut(&mut self) -> &mut [u8] {
                &mut self.0
            }
        }

        impl From<[u8; $size]> for $name {
            fn from(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }
        }
    };
}

byte_id!(
    /// 40 byte application address. Every message of a channel shares it.
    AppAddr,
    40
);

byte_id!(
    /// 12 byte message identifier, unique within an application.
    MsgId,
    12
);

impl AppAddr {
    /// Derive the address of the `channel_idx`-th channel created by `author`
    pub fn gen(author: &Identifier, channel_idx: u64) -> AppAddr {
        let mut spongos = Spongos::<KeccakF1600>::init();
        spongos.absorb(author);
        spongos.absorb(channel_idx.to_be_bytes());
        spongos.commit();
        spongos.squeeze()
    }
}

impl MsgId {
    /// Identifier of the `seq_num`-th message of `publisher` in the application. Knowing the
    /// publisher and its sequence number is enough to find its next message.
    pub fn gen(appaddr: AppAddr, publisher: &Identifier, seq_num: usize) -> MsgId {
        let mut spongos = Spongos::<KeccakF1600>::init();
        spongos.absorb(appaddr);
        spongos.absorb(publisher);
        spongos.absorb((seq_num as u64).to_be_bytes());
        spongos.commit();
        spongos.squeeze()
    }
}

/// Both address parts are plain fixed size byte arrays in DDML.
macro_rules! ddml_nbytes {
    ($($t:ty),*) => {$(
        impl Absorb<&$t> for sizeof::Context {
            fn absorb(&mut self, t: &$t) -> SpongosResult<&mut Self> {
                self.absorb(NBytes::new(t))
            }
        }

        impl<OS: io::OStream, F: PRP> Absorb<&$t> for wrap::Context<OS, F> {
            fn absorb(&mut self, t: &$t) -> SpongosResult<&mut Self> {
                self.absorb(NBytes::new(t))
            }
        }

        impl<IS: io::IStream, F: PRP> Absorb<&mut $t> for unwrap::Context<IS, F> {
            fn absorb(&mut self, t: &mut $t) -> SpongosResult<&mut Self> {
                self.absorb(NBytes::new(t))
            }
        }

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

ddml_nbytes!(AppAddr, MsgId);

impl Mask<&Address> for sizeof::Context {
    fn mask(&mut self, address: &Address) -> SpongosResult<&mut Self> {
        self.mask(&address.appaddr)?.mask(&address.msgid)
    }
}

impl<OS: io::OStream, F: PRP> Mask<&Address> for wrap::Context<OS, F> {
    fn mask(&mut self, address: &Address) -> SpongosResult<&mut Self> {
        self.mask(&address.appaddr)?.mask(&address.msgid)
    }
}

impl<IS: io::IStream, F: PRP> Mask<&mut Address> for unwrap::Context<IS, F> {
    fn mask(&mut self, address: &mut Address) -> SpongosResult<&mut Self> {
        self.mask(&mut address.appaddr)?.mask(&mut address.msgid)
    }
}

#[cfg(test)]
mod tests {
    use crate::id::{Ed25519, Identity};

    use super::*;

    #[test]
    fn address_string_round_trip() {
        let address = Address::new([1; 40], [2; 12]);
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn malformed_address_strings_are_rejected() {
        assert!(matches!(
            "no-colon".parse::<Address>(),
            Err(Error::Malformed("address string", ":", _))
        ));
        assert!(matches!(
            "zz:ffffffffffffffffffffffff".parse::<Address>(),
            Err(Error::Encoding("AppAddr", _, _))
        ));
        assert!(matches!(
            format!("{}:ffff", AppAddr::default()).parse::<Address>(),
            Err(Error::InvalidSize("MsgId", 12, 2))
        ));
    }

    #[test]
    fn msgid_depends_on_publisher_and_sequence() {
        let alice = Identity::new(Ed25519::from_seed("alice"));
        let bob = Identity::new(Ed25519::from_seed("bob"));
        let appaddr = AppAddr::gen(alice.identifier(), 0);

        assert_eq!(
            MsgId::gen(appaddr, alice.identifier(), 1),
            MsgId::gen(appaddr, alice.identifier(), 1)
        );
        assert_ne!(
            MsgId::gen(appaddr, alice.identifier(), 1),
            MsgId::gen(appaddr, alice.identifier(), 2)
        );
        assert_ne!(
            MsgId::gen(appaddr, alice.identifier(), 1),
            MsgId::gen(appaddr, bob.identifier(), 1)
        );
        assert_ne!(appaddr, AppAddr::gen(alice.identifier(), 1));
    }

    #[test]
    fn msg_index_differs_per_message() {
        let a = Address::new([1; 40], [2; 12]);
        let b = Address::new([1; 40], [3; 12]);
        assert_ne!(a.to_msg_index(), b.to_msg_index());
    }
}
