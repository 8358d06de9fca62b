use core::fmt;

macro_rules! uint {
    ($name:ident, $int:ty, $n:literal) => {
        /// Fixed width unsigned integer, big-endian encoded.
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
        pub struct $name($int);

        impl $name {
            pub const fn new(u: $int) -> Self {
                Self(u)
            }

            pub fn to_bytes(self) -> [u8; $n] {
                self.0.to_be_bytes()
            }

            pub fn from_bytes(bytes: [u8; $n]) -> Self {
                Self(<$int>::from_be_bytes(bytes))
            }

            pub fn inner(&self) -> $int {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$int> for $name {
            fn from(u: $int) -> Self {
                Self(u)
            }
        }
    };
}

uint!(Uint8, u8, 1);
uint!(Uint16, u16, 2);
uint!(Uint32, u32, 4);
uint!(Uint64, u64, 8);

/// Lets a single byte be absorbed as an external field.
impl AsRef<[u8]> for Uint8 {
    fn as_ref(&self) -> &[u8] {
        core::slice::from_ref(&self.0)
    }
}
