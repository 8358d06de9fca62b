//! Unwrap context: decodes fields from an input stream, mirroring the wrap context.
use alloc::vec::Vec;
use core::fmt;

use crypto::{keys::x25519, signatures::ed25519};

use crate::{
    core::{
        prp::{keccak::KeccakF1600, PRP},
        spongos::Spongos,
    },
    ddml::{
        commands::{Absorb, Commit, Dump, Ed25519, Fork, Guard, Join, Mask, Repeated, Skip, Squeeze, X25519},
        io,
        modifiers::External,
        types::{Bytes, Mac, Maybe, NBytes, Size, Uint16, Uint32, Uint64, Uint8},
    },
    error::{Error, Result},
};

pub struct Context<IS, F = KeccakF1600> {
    spongos: Spongos<F>,
    stream: IS,
}

impl<IS, F> Context<IS, F> {
    pub fn new(stream: IS) -> Self
    where
        F: Default,
    {
        Self::new_with_spongos(stream, Spongos::init())
    }

    pub fn new_with_spongos(stream: IS, spongos: Spongos<F>) -> Self {
        Self { spongos, stream }
    }

    /// Remaining input.
    pub fn stream(&self) -> &IS {
        &self.stream
    }

    pub fn finalize(mut self) -> Spongos<F>
    where
        F: PRP,
    {
        self.spongos.commit();
        self.spongos
    }
}

impl<IS: io::IStream, F> Context<IS, F> {
    /// Skip `n` bytes of input without touching the sponge. Used to step over the entries of a
    /// repeated block that belong to someone else.
    pub fn drop(&mut self, n: usize) -> Result<&mut Self> {
        self.stream.try_advance(n)?;
        Ok(self)
    }
}

impl<IS, F: PRP> fmt::Debug for Context<IS, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("unwrap::Context").field("spongos", &self.spongos).finish()
    }
}

trait Unwrap {
    fn unwrapn<T>(&mut self, bytes: T) -> Result<&mut Self>
    where
        T: AsMut<[u8]>;

    fn unwrap_size(&mut self, size: &mut Size) -> Result<&mut Self> {
        let mut num_bytes = [0u8];
        self.unwrapn(&mut num_bytes)?;
        *size = Size::decode(
            || {
                let mut byte = [0u8];
                self.unwrapn(&mut byte)?;
                Ok(byte[0])
            },
            num_bytes[0],
        )?;
        Ok(self)
    }

    fn unwrap_bytes(&mut self, mut bytes: Bytes<&mut Vec<u8>>) -> Result<&mut Self> {
        let mut size = Size::default();
        self.unwrap_size(&mut size)?;
        bytes.resize(size.inner());
        self.unwrapn(bytes.as_mut_slice())
    }
}

struct AbsorbContext<'a, IS, F> {
    ctx: &'a mut Context<IS, F>,
}

impl<IS: io::IStream, F: PRP> Unwrap for AbsorbContext<'_, IS, F> {
    fn unwrapn<T>(&mut self, mut bytes: T) -> Result<&mut Self>
    where
        T: AsMut<[u8]>,
    {
        let bytes = bytes.as_mut();
        bytes.copy_from_slice(self.ctx.stream.try_advance(bytes.len())?);
        self.ctx.spongos.absorb(&*bytes);
        Ok(self)
    }
}

struct MaskContext<'a, IS, F> {
    ctx: &'a mut Context<IS, F>,
}

impl<IS: io::IStream, F: PRP> Unwrap for MaskContext<'_, IS, F> {
    fn unwrapn<T>(&mut self, mut bytes: T) -> Result<&mut Self>
    where
        T: AsMut<[u8]>,
    {
        let bytes = bytes.as_mut();
        let cipher = self.ctx.stream.try_advance(bytes.len())?;
        self.ctx.spongos.decrypt_mut(cipher, bytes)?;
        Ok(self)
    }
}

struct SkipContext<'a, IS, F> {
    ctx: &'a mut Context<IS, F>,
}

impl<IS: io::IStream, F> Unwrap for SkipContext<'_, IS, F> {
    fn unwrapn<T>(&mut self, mut bytes: T) -> Result<&mut Self>
    where
        T: AsMut<[u8]>,
    {
        let bytes = bytes.as_mut();
        bytes.copy_from_slice(self.ctx.stream.try_advance(bytes.len())?);
        Ok(self)
    }
}

macro_rules! plain_fields {
    ($($command:ident :: $method:ident => $helper:ident where $($bound:ident)?),*) => {$(
        impl<'a, IS: io::IStream, F $(: $bound)?> $command<&'a mut Uint8> for Context<IS, F> {
            fn $method(&mut self, u: &'a mut Uint8) -> Result<&mut Self> {
                let mut v = [0u8; 1];
                $helper { ctx: self }.unwrapn(&mut v)?;
                *u = Uint8::from_bytes(v);
                Ok(self)
            }
        }

        impl<'a, IS: io::IStream, F $(: $bound)?> $command<&'a mut Uint16> for Context<IS, F> {
            fn $method(&mut self, u: &'a mut Uint16) -> Result<&mut Self> {
                let mut v = [0u8; 2];
                $helper { ctx: self }.unwrapn(&mut v)?;
                *u = Uint16::from_bytes(v);
                Ok(self)
            }
        }

        impl<'a, IS: io::IStream, F $(: $bound)?> $command<&'a mut Uint32> for Context<IS, F> {
            fn $method(&mut self, u: &'a mut Uint32) -> Result<&mut Self> {
                let mut v = [0u8; 4];
                $helper { ctx: self }.unwrapn(&mut v)?;
                *u = Uint32::from_bytes(v);
                Ok(self)
            }
        }

        impl<'a, IS: io::IStream, F $(: $bound)?> $command<&'a mut Uint64> for Context<IS, F> {
            fn $method(&mut self, u: &'a mut Uint64) -> Result<&mut Self> {
                let mut v = [0u8; 8];
                $helper { ctx: self }.unwrapn(&mut v)?;
                *u = Uint64::from_bytes(v);
                Ok(self)
            }
        }

        impl<'a, IS: io::IStream, F $(: $bound)?> $command<&'a mut Size> for Context<IS, F> {
            fn $method(&mut self, size: &'a mut Size) -> Result<&mut Self> {
                $helper { ctx: self }.unwrap_size(size)?;
                Ok(self)
            }
        }

        impl<IS: io::IStream, F $(: $bound)?, T: AsMut<[u8]>> $command<NBytes<T>> for Context<IS, F> {
            fn $method(&mut self, nbytes: NBytes<T>) -> Result<&mut Self> {
                $helper { ctx: self }.unwrapn(nbytes)?;
                Ok(self)
            }
        }

        impl<'a, IS: io::IStream, F $(: $bound)?> $command<Bytes<&'a mut Vec<u8>>> for Context<IS, F> {
            fn $method(&mut self, bytes: Bytes<&'a mut Vec<u8>>) -> Result<&mut Self> {
                $helper { ctx: self }.unwrap_bytes(bytes)?;
                Ok(self)
            }
        }
    )*};
}

plain_fields!(
    Absorb::absorb => AbsorbContext where PRP,
    Mask::mask => MaskContext where PRP,
    Skip::skip => SkipContext where
);

impl<'a, IS: io::IStream, F: PRP> Absorb<&'a mut ed25519::PublicKey> for Context<IS, F> {
    fn absorb(&mut self, public_key: &'a mut ed25519::PublicKey) -> Result<&mut Self> {
        let mut bytes = [0u8; ed25519::PUBLIC_KEY_LENGTH];
        AbsorbContext { ctx: self }.unwrapn(&mut bytes)?;
        *public_key =
            ed25519::PublicKey::try_from_bytes(bytes).map_err(|_| Error::InvalidKey("ed25519 public key"))?;
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP> Absorb<&'a mut x25519::PublicKey> for Context<IS, F> {
    fn absorb(&mut self, public_key: &'a mut x25519::PublicKey) -> Result<&mut Self> {
        let mut bytes = [0u8; x25519::PUBLIC_KEY_LENGTH];
        AbsorbContext { ctx: self }.unwrapn(&mut bytes)?;
        *public_key = x25519::PublicKey::from(bytes);
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP> Mask<&'a mut ed25519::PublicKey> for Context<IS, F> {
    fn mask(&mut self, public_key: &'a mut ed25519::PublicKey) -> Result<&mut Self> {
        let mut bytes = [0u8; ed25519::PUBLIC_KEY_LENGTH];
        MaskContext { ctx: self }.unwrapn(&mut bytes)?;
        *public_key =
            ed25519::PublicKey::try_from_bytes(bytes).map_err(|_| Error::InvalidKey("ed25519 public key"))?;
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP> Mask<&'a mut x25519::PublicKey> for Context<IS, F> {
    fn mask(&mut self, public_key: &'a mut x25519::PublicKey) -> Result<&mut Self> {
        let mut bytes = [0u8; x25519::PUBLIC_KEY_LENGTH];
        MaskContext { ctx: self }.unwrapn(&mut bytes)?;
        *public_key = x25519::PublicKey::from(bytes);
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP> Mask<&'a mut Spongos<F>> for Context<IS, F> {
    fn mask(&mut self, spongos: &'a mut Spongos<F>) -> Result<&mut Self> {
        MaskContext { ctx: self }
            .unwrapn(spongos.outer_mut())?
            .unwrapn(spongos.inner_mut())?;
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP, T: Default> Absorb<Maybe<&'a mut Option<T>>> for Context<IS, F>
where
    for<'b> Self: Absorb<&'b mut T>,
{
    fn absorb(&mut self, maybe: Maybe<&'a mut Option<T>>) -> Result<&mut Self> {
        let mut oneof = Uint8::default();
        <Self as Absorb<&mut Uint8>>::absorb(self, &mut oneof)?;
        match oneof.inner() {
            0 => *maybe.into_inner() = None,
            1 => {
                let mut t = T::default();
                self.absorb(&mut t)?;
                *maybe.into_inner() = Some(t);
            }
            o => return Err(Error::InvalidOption("maybe", o)),
        }
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP, T: Default> Mask<Maybe<&'a mut Option<T>>> for Context<IS, F>
where
    for<'b> Self: Mask<&'b mut T>,
{
    fn mask(&mut self, maybe: Maybe<&'a mut Option<T>>) -> Result<&mut Self> {
        let mut oneof = Uint8::default();
        <Self as Mask<&mut Uint8>>::mask(self, &mut oneof)?;
        match oneof.inner() {
            0 => *maybe.into_inner() = None,
            1 => {
                let mut t = T::default();
                self.mask(&mut t)?;
                *maybe.into_inner() = Some(t);
            }
            o => return Err(Error::InvalidOption("maybe", o)),
        }
        Ok(self)
    }
}

impl<IS, F: PRP, T: AsRef<[u8]>> Absorb<External<T>> for Context<IS, F> {
    fn absorb(&mut self, external: External<T>) -> Result<&mut Self> {
        self.spongos.absorb(external.inner());
        Ok(self)
    }
}

impl<IS: io::IStream, F: PRP> Squeeze<&Mac> for Context<IS, F> {
    fn squeeze(&mut self, mac: &Mac) -> Result<&mut Self> {
        let expected = self.stream.try_advance(mac.length())?;
        if !self.spongos.squeeze_eq(expected) {
            return Err(Error::BadMac);
        }
        Ok(self)
    }
}

impl<IS: io::IStream, F: PRP> Squeeze<Mac> for Context<IS, F> {
    fn squeeze(&mut self, mac: Mac) -> Result<&mut Self> {
        self.squeeze(&mac)
    }
}

impl<IS, F: PRP, T: AsMut<[u8]>> Squeeze<External<&mut NBytes<T>>> for Context<IS, F> {
    fn squeeze(&mut self, external: External<&mut NBytes<T>>) -> Result<&mut Self> {
        self.spongos.squeeze_mut(external.into_inner());
        Ok(self)
    }
}

impl<IS, F: PRP> Commit for Context<IS, F> {
    fn commit(&mut self) -> Result<&mut Self> {
        self.spongos.commit();
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F, T> Ed25519<&'a ed25519::PublicKey, External<&'a NBytes<T>>> for Context<IS, F>
where
    T: AsRef<[u8]>,
{
    fn ed25519(&mut self, public_key: &'a ed25519::PublicKey, hash: External<&'a NBytes<T>>) -> Result<&mut Self> {
        let mut signature = [0u8; ed25519::SIGNATURE_LENGTH];
        signature.copy_from_slice(self.stream.try_advance(ed25519::SIGNATURE_LENGTH)?);
        let signature = ed25519::Signature::from_bytes(signature);
        if !public_key.verify(&signature, hash.into_inner().as_ref()) {
            return Err(Error::SignatureMismatch);
        }
        Ok(self)
    }
}

impl<'a, IS: io::IStream, F: PRP, T: AsMut<[u8]>> X25519<&'a x25519::SecretKey, NBytes<T>> for Context<IS, F> {
    fn x25519(&mut self, secret_key: &'a x25519::SecretKey, key: NBytes<T>) -> Result<&mut Self> {
        let mut ephemeral_public_key = x25519::PublicKey::from([0u8; x25519::PUBLIC_KEY_LENGTH]);
        self.absorb(&mut ephemeral_public_key)?;
        let shared_secret = secret_key.diffie_hellman(&ephemeral_public_key);
        self.absorb(External::new(shared_secret.as_bytes()))?.commit()?.mask(key)
    }
}

impl<'a, IS: 'a, F: Clone> Fork<'a> for Context<IS, F> {
    type Forked = Context<&'a mut IS, F>;

    fn fork(&'a mut self) -> Self::Forked {
        Context::new_with_spongos(&mut self.stream, self.spongos.fork())
    }
}

impl<IS, F: PRP> Join<F> for Context<IS, F> {
    fn join(&mut self, joinee: &mut Spongos<F>) -> Result<&mut Self> {
        self.spongos.join(joinee);
        Ok(self)
    }
}

impl<IS, F> Repeated for Context<IS, F> {
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

impl<IS, F> Guard for Context<IS, F> {
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

#[cfg(feature = "std")]
impl<IS: io::IStream, F: PRP> Dump for Context<IS, F> {
    fn dump(&mut self, args: fmt::Arguments<'_>) -> Result<&mut Self> {
        println!("dump: {}: istream=[{}] spongos=[{:?}]", args, self.stream.dump(), self.spongos);
        Ok(self)
    }
}
