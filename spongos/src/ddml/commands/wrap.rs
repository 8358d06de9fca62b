//! Wrap context: encodes fields into an output stream while driving the sponge.
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

pub struct Context<OS, F = KeccakF1600> {
    spongos: Spongos<F>,
    stream: OS,
}

impl<OS, F> Context<OS, F> {
    pub fn new(stream: OS) -> Self
    where
        F: Default,
    {
        Self::new_with_spongos(stream, Spongos::init())
    }

    /// Continue wrapping from an existing sponge state.
    pub fn new_with_spongos(stream: OS, spongos: Spongos<F>) -> Self {
        Self { spongos, stream }
    }

    pub fn stream(&self) -> &OS {
        &self.stream
    }

    /// Commit and hand back the sponge, which then identifies the wrapped message.
    pub fn finalize(mut self) -> Spongos<F>
    where
        F: PRP,
    {
        self.spongos.commit();
        self.spongos
    }
}

impl<OS, F: PRP> fmt::Debug for Context<OS, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("wrap::Context").field("spongos", &self.spongos).finish()
    }
}

/// The encoding shared by Absorb, Mask and Skip; only `wrapn` differs between them.
trait Wrap {
    fn wrapn<T>(&mut self, bytes: T) -> Result<&mut Self>
    where
        T: AsRef<[u8]>;

    fn wrap_size(&mut self, size: Size) -> Result<&mut Self> {
        self.wrapn([size.num_bytes()])?;
        size.encode(|byte| {
            self.wrapn([byte])?;
            Ok(())
        })?;
        Ok(self)
    }

    fn wrap_bytes<T>(&mut self, bytes: Bytes<T>) -> Result<&mut Self>
    where
        T: AsRef<[u8]>,
    {
        self.wrap_size(Size::new(bytes.len()))?.wrapn(bytes.as_slice())
    }
}

struct AbsorbContext<'a, OS, F> {
    ctx: &'a mut Context<OS, F>,
}

impl<OS: io::OStream, F: PRP> Wrap for AbsorbContext<'_, OS, F> {
    fn wrapn<T>(&mut self, bytes: T) -> Result<&mut Self>
    where
        T: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();
        self.ctx.spongos.absorb(bytes);
        self.ctx.stream.try_advance(bytes.len())?.copy_from_slice(bytes);
        Ok(self)
    }
}

struct MaskContext<'a, OS, F> {
    ctx: &'a mut Context<OS, F>,
}

impl<OS: io::OStream, F: PRP> Wrap for MaskContext<'_, OS, F> {
    fn wrapn<T>(&mut self, bytes: T) -> Result<&mut Self>
    where
        T: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();
        let cipher = self.ctx.stream.try_advance(bytes.len())?;
        self.ctx.spongos.encrypt_mut(bytes, cipher)?;
        Ok(self)
    }
}

struct SkipContext<'a, OS, F> {
    ctx: &'a mut Context<OS, F>,
}

impl<OS: io::OStream, F> Wrap for SkipContext<'_, OS, F> {
    fn wrapn<T>(&mut self, bytes: T) -> Result<&mut Self>
    where
        T: AsRef<[u8]>,
    {
        let bytes = bytes.as_ref();
        self.ctx.stream.try_advance(bytes.len())?.copy_from_slice(bytes);
        Ok(self)
    }
}

macro_rules! plain_fields {
    ($($command:ident :: $method:ident => $helper:ident where $($bound:ident)?),*) => {$(
        impl<OS: io::OStream, F $(: $bound)?> $command<Uint8> for Context<OS, F> {
            fn $method(&mut self, u: Uint8) -> Result<&mut Self> {
                $helper { ctx: self }.wrapn(u.to_bytes())?;
                Ok(self)
            }
        }

        impl<OS: io::OStream, F $(: $bound)?> $command<Uint16> for Context<OS, F> {
            fn $method(&mut self, u: Uint16) -> Result<&mut Self> {
                $helper { ctx: self }.wrapn(u.to_bytes())?;
                Ok(self)
            }
        }

        impl<OS: io::OStream, F $(: $bound)?> $command<Uint32> for Context<OS, F> {
            fn $method(&mut self, u: Uint32) -> Result<&mut Self> {
                $helper { ctx: self }.wrapn(u.to_bytes())?;
                Ok(self)
            }
        }

        impl<OS: io::OStream, F $(: $bound)?> $command<Uint64> for Context<OS, F> {
            fn $method(&mut self, u: Uint64) -> Result<&mut Self> {
                $helper { ctx: self }.wrapn(u.to_bytes())?;
                Ok(self)
            }
        }

        impl<OS: io::OStream, F $(: $bound)?> $command<Size> for Context<OS, F> {
            fn $method(&mut self, size: Size) -> Result<&mut Self> {
                $helper { ctx: self }.wrap_size(size)?;
                Ok(self)
            }
        }

        impl<OS: io::OStream, F $(: $bound)?, T: AsRef<[u8]>> $command<NBytes<T>> for Context<OS, F> {
            fn $method(&mut self, nbytes: NBytes<T>) -> Result<&mut Self> {
                $helper { ctx: self }.wrapn(nbytes)?;
                Ok(self)
            }
        }

        impl<OS: io::OStream, F $(: $bound)?, T: AsRef<[u8]>> $command<Bytes<T>> for Context<OS, F> {
            fn $method(&mut self, bytes: Bytes<T>) -> Result<&mut Self> {
                $helper { ctx: self }.wrap_bytes(bytes)?;
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

impl<OS: io::OStream, F: PRP> Absorb<&ed25519::PublicKey> for Context<OS, F> {
    fn absorb(&mut self, public_key: &ed25519::PublicKey) -> Result<&mut Self> {
        AbsorbContext { ctx: self }.wrapn(public_key)?;
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP> Absorb<&x25519::PublicKey> for Context<OS, F> {
    fn absorb(&mut self, public_key: &x25519::PublicKey) -> Result<&mut Self> {
        AbsorbContext { ctx: self }.wrapn(public_key)?;
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP> Mask<&ed25519::PublicKey> for Context<OS, F> {
    fn mask(&mut self, public_key: &ed25519::PublicKey) -> Result<&mut Self> {
        MaskContext { ctx: self }.wrapn(public_key)?;
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP> Mask<&x25519::PublicKey> for Context<OS, F> {
    fn mask(&mut self, public_key: &x25519::PublicKey) -> Result<&mut Self> {
        MaskContext { ctx: self }.wrapn(public_key)?;
        Ok(self)
    }
}

/// Encrypts the full state of a committed sponge.
impl<OS: io::OStream, F: PRP> Mask<&Spongos<F>> for Context<OS, F> {
    fn mask(&mut self, spongos: &Spongos<F>) -> Result<&mut Self> {
        MaskContext { ctx: self }.wrapn(spongos.outer())?.wrapn(spongos.inner())?;
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP, T> Absorb<Maybe<Option<T>>> for Context<OS, F>
where
    Self: Absorb<T>,
{
    fn absorb(&mut self, maybe: Maybe<Option<T>>) -> Result<&mut Self> {
        match maybe.into_inner() {
            Some(t) => <Self as Absorb<Uint8>>::absorb(self, Uint8::new(1))?.absorb(t)?,
            None => <Self as Absorb<Uint8>>::absorb(self, Uint8::new(0))?,
        };
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP, T> Mask<Maybe<Option<T>>> for Context<OS, F>
where
    Self: Mask<T>,
{
    fn mask(&mut self, maybe: Maybe<Option<T>>) -> Result<&mut Self> {
        match maybe.into_inner() {
            Some(t) => <Self as Mask<Uint8>>::mask(self, Uint8::new(1))?.mask(t)?,
            None => <Self as Mask<Uint8>>::mask(self, Uint8::new(0))?,
        };
        Ok(self)
    }
}

impl<OS, F: PRP, T: AsRef<[u8]>> Absorb<External<T>> for Context<OS, F> {
    fn absorb(&mut self, external: External<T>) -> Result<&mut Self> {
        self.spongos.absorb(external.inner());
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP> Squeeze<&Mac> for Context<OS, F> {
    fn squeeze(&mut self, mac: &Mac) -> Result<&mut Self> {
        let out = self.stream.try_advance(mac.length())?;
        self.spongos.squeeze_mut(out);
        Ok(self)
    }
}

impl<OS: io::OStream, F: PRP> Squeeze<Mac> for Context<OS, F> {
    fn squeeze(&mut self, mac: Mac) -> Result<&mut Self> {
        self.squeeze(&mac)
    }
}

impl<OS, F: PRP, T: AsMut<[u8]>> Squeeze<External<&mut NBytes<T>>> for Context<OS, F> {
    fn squeeze(&mut self, external: External<&mut NBytes<T>>) -> Result<&mut Self> {
        self.spongos.squeeze_mut(external.into_inner());
        Ok(self)
    }
}

impl<OS, F: PRP> Commit for Context<OS, F> {
    fn commit(&mut self) -> Result<&mut Self> {
        self.spongos.commit();
        Ok(self)
    }
}

impl<'a, OS: io::OStream, F, T> Ed25519<&'a ed25519::SecretKey, External<&'a NBytes<T>>> for Context<OS, F>
where
    T: AsRef<[u8]>,
{
    fn ed25519(&mut self, secret_key: &'a ed25519::SecretKey, hash: External<&'a NBytes<T>>) -> Result<&mut Self> {
        let signature = secret_key.sign(hash.into_inner().as_ref());
        self.stream
            .try_advance(ed25519::SIGNATURE_LENGTH)?
            .copy_from_slice(&signature.to_bytes());
        Ok(self)
    }
}

#[cfg(feature = "osrng")]
impl<'a, OS: io::OStream, F: PRP, T: AsRef<[u8]>> X25519<&'a x25519::PublicKey, NBytes<T>> for Context<OS, F> {
    fn x25519(&mut self, remote_public_key: &'a x25519::PublicKey, key: NBytes<T>) -> Result<&mut Self> {
        use rand::{rngs::StdRng, SeedableRng};

        let ephemeral_secret_key = x25519::SecretKey::generate_with(&mut StdRng::from_entropy());
        let shared_secret = ephemeral_secret_key.diffie_hellman(remote_public_key);
        self.absorb(&ephemeral_secret_key.public_key())?
            .absorb(External::new(shared_secret.as_bytes()))?
            .commit()?
            .mask(key)
    }
}

impl<'a, OS: 'a, F: Clone> Fork<'a> for Context<OS, F> {
    type Forked = Context<&'a mut OS, F>;

    fn fork(&'a mut self) -> Self::Forked {
        Context::new_with_spongos(&mut self.stream, self.spongos.fork())
    }
}

impl<OS, F: PRP> Join<F> for Context<OS, F> {
    fn join(&mut self, joinee: &mut Spongos<F>) -> Result<&mut Self> {
        self.spongos.join(joinee);
        Ok(self)
    }
}

impl<OS, F> Repeated for Context<OS, F> {
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

impl<OS, F> Guard for Context<OS, F> {
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
impl<OS: io::OStream, F: PRP> Dump for Context<OS, F> {
    fn dump(&mut self, args: fmt::Arguments<'_>) -> Result<&mut Self> {
        println!("dump: {}: ostream=[{}] spongos=[{:?}]", args, self.stream.dump(), self.spongos);
        Ok(self)
    }
}
