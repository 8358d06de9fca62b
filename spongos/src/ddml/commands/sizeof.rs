//! Size of the encoded message.
//!
//! The sizeof context only counts the bytes that would be written by the wrap context.
//! External fields and sponge operations do not add to the size.
use crypto::{keys::x25519, signatures::ed25519};
use generic_array::typenum::Unsigned;

use crate::{
    core::{prp::PRP, spongos::Spongos},
    ddml::{
        commands::{Absorb, Commit, Dump, Ed25519, Fork, Guard, Join, Mask, Repeated, Skip, Squeeze, X25519},
        modifiers::External,
        types::{Bytes, Mac, Maybe, NBytes, Size, Uint16, Uint32, Uint64, Uint8},
    },
    error::{Error, Result},
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Context {
    size: usize,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes accumulated so far.
    pub fn finalize(self) -> usize {
        self.size
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn add(&mut self, n: usize) -> Result<&mut Self> {
        self.size += n;
        Ok(self)
    }
}

fn size_len(size: Size) -> usize {
    size.num_bytes() as usize + 1
}

/// Absorb, Mask and Skip all write the field as is, so they count the same.
macro_rules! plain_fields {
    ($($command:ident :: $method:ident),*) => {$(
        impl $command<Uint8> for Context {
            fn $method(&mut self, _: Uint8) -> Result<&mut Self> {
                self.add(1)
            }
        }

        impl $command<Uint16> for Context {
            fn $method(&mut self, _: Uint16) -> Result<&mut Self> {
                self.add(2)
            }
        }

        impl $command<Uint32> for Context {
            fn $method(&mut self, _: Uint32) -> Result<&mut Self> {
                self.add(4)
            }
        }

        impl $command<Uint64> for Context {
            fn $method(&mut self, _: Uint64) -> Result<&mut Self> {
                self.add(8)
            }
        }

        impl $command<Size> for Context {
            fn $method(&mut self, size: Size) -> Result<&mut Self> {
                self.add(size_len(size))
            }
        }

        impl<T: AsRef<[u8]>> $command<NBytes<T>> for Context {
            fn $method(&mut self, nbytes: NBytes<T>) -> Result<&mut Self> {
                self.add(nbytes.as_ref().len())
            }
        }

        impl<T: AsRef<[u8]>> $command<Bytes<T>> for Context {
            fn $method(&mut self, bytes: Bytes<T>) -> Result<&mut Self> {
                self.add(size_len(Size::new(bytes.len())) + bytes.len())
            }
        }
    )*};
}

plain_fields!(Absorb::absorb, Mask::mask, Skip::skip);

impl Absorb<&ed25519::PublicKey> for Context {
    fn absorb(&mut self, _: &ed25519::PublicKey) -> Result<&mut Self> {
        self.add(ed25519::PUBLIC_KEY_LENGTH)
    }
}

impl Absorb<&x25519::PublicKey> for Context {
    fn absorb(&mut self, _: &x25519::PublicKey) -> Result<&mut Self> {
        self.add(x25519::PUBLIC_KEY_LENGTH)
    }
}

impl Mask<&ed25519::PublicKey> for Context {
    fn mask(&mut self, _: &ed25519::PublicKey) -> Result<&mut Self> {
        self.add(ed25519::PUBLIC_KEY_LENGTH)
    }
}

impl Mask<&x25519::PublicKey> for Context {
    fn mask(&mut self, _: &x25519::PublicKey) -> Result<&mut Self> {
        self.add(x25519::PUBLIC_KEY_LENGTH)
    }
}

impl<F: PRP> Mask<&Spongos<F>> for Context {
    fn mask(&mut self, _: &Spongos<F>) -> Result<&mut Self> {
        self.add(F::RateSize::USIZE + F::CapacitySize::USIZE)
    }
}

impl<T> Absorb<Maybe<Option<T>>> for Context
where
    Self: Absorb<T>,
{
    fn absorb(&mut self, maybe: Maybe<Option<T>>) -> Result<&mut Self> {
        <Self as Absorb<Uint8>>::absorb(self, Uint8::new(0))?;
        if let Some(t) = maybe.into_inner() {
            self.absorb(t)?;
        }
        Ok(self)
    }
}

impl<T> Mask<Maybe<Option<T>>> for Context
where
    Self: Mask<T>,
{
    fn mask(&mut self, maybe: Maybe<Option<T>>) -> Result<&mut Self> {
        <Self as Mask<Uint8>>::mask(self, Uint8::new(0))?;
        if let Some(t) = maybe.into_inner() {
            self.mask(t)?;
        }
        Ok(self)
    }
}

impl<T> Absorb<External<T>> for Context {
    fn absorb(&mut self, _: External<T>) -> Result<&mut Self> {
        Ok(self)
    }
}

impl Squeeze<Mac> for Context {
    fn squeeze(&mut self, mac: Mac) -> Result<&mut Self> {
        self.add(mac.length())
    }
}

impl Squeeze<&Mac> for Context {
    fn squeeze(&mut self, mac: &Mac) -> Result<&mut Self> {
        self.add(mac.length())
    }
}

impl<T> Squeeze<External<T>> for Context {
    fn squeeze(&mut self, _: External<T>) -> Result<&mut Self> {
        Ok(self)
    }
}

impl Commit for Context {
    fn commit(&mut self) -> Result<&mut Self> {
        Ok(self)
    }
}

impl<'a, T> Ed25519<&'a ed25519::SecretKey, External<T>> for Context {
    fn ed25519(&mut self, _: &'a ed25519::SecretKey, _: External<T>) -> Result<&mut Self> {
        self.add(ed25519::SIGNATURE_LENGTH)
    }
}

impl<'a, T: AsRef<[u8]>> X25519<&'a x25519::PublicKey, NBytes<T>> for Context {
    fn x25519(&mut self, _: &'a x25519::PublicKey, key: NBytes<T>) -> Result<&mut Self> {
        self.add(x25519::PUBLIC_KEY_LENGTH + key.as_ref().len())
    }
}

/// Forking does not change the size, the fork writes to the same stream.
impl<'a> Fork<'a> for Context {
    type Forked = &'a mut Context;

    fn fork(&'a mut self) -> &'a mut Context {
        self
    }
}

impl<F> Join<F> for Context {
    fn join(&mut self, _: &mut Spongos<F>) -> Result<&mut Self> {
        Ok(self)
    }
}

impl Repeated for Context {
    fn repeated<I, C>(&mut self, values: I, mut handle: C) -> Result<&mut Self>
    where
        I: IntoIterator,
        C: FnMut(&mut Self, I::Item) -> Result<()>,
    {
        for value in values {
            handle(self, value)?;
        }
        Ok(self)
    }
}

impl Guard for Context {
    fn guard<E>(&mut self, cond: bool, err: E) -> Result<&mut Self>
    where
        E: Into<Error>,
    {
        if cond {
            Ok(self)
        } else {
            Err(err.into())
        }
    }
}

impl Dump for Context {
    fn dump(&mut self, _args: core::fmt::Arguments<'_>) -> Result<&mut Self> {
        #[cfg(feature = "std")]
        println!("dump: {}: size=[{}]", _args, self.size);
        Ok(self)
    }
}
