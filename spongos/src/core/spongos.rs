use core::{cmp, fmt, ops::Range};

use generic_array::{typenum::Unsigned, GenericArray};

use super::prp::{keccak::KeccakF1600, PRP};
use crate::error::{Error, Result};

type Capacity<F> = GenericArray<u8, <F as PRP>::CapacitySize>;
type Rate<F> = GenericArray<u8, <F as PRP>::RateSize>;

/// Duplex sponge over the permutation `F`.
///
/// Data goes through the outer part of the state, `pos` bytes of which are used. The permutation
/// runs whenever the outer part is full, and on [`commit`](Spongos::commit).
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Spongos<F = KeccakF1600> {
    state: F,
    pos: usize,
}

impl<F: Default> Spongos<F> {
    pub fn init() -> Self {
        Self::default()
    }
}

impl<F: PRP> Spongos<F> {
    /// Walks `len` bytes through the outer state. `step` gets each chunk of the outer state along
    /// with the range of the data it lines up with.
    fn duplex<S>(&mut self, len: usize, mut step: S)
    where
        S: FnMut(&mut [u8], Range<usize>),
    {
        let mut done = 0;
        while done < len {
            let end = cmp::min(self.pos + len - done, F::RateSize::USIZE);
            let chunk = &mut self.state.outer_mut()[self.pos..end];
            let n = chunk.len();
            step(chunk, done..done + n);
            done += n;
            self.pos += n;
            if self.pos == F::RateSize::USIZE {
                self.commit();
            }
        }
    }

    pub fn absorb<T>(&mut self, data: T)
    where
        T: AsRef<[u8]>,
    {
        let data = data.as_ref();
        self.duplex(data.len(), |outer, range| {
            outer.iter_mut().zip(&data[range]).for_each(|(o, d)| *o ^= d)
        });
    }

    pub fn squeeze_mut<T>(&mut self, mut output: T)
    where
        T: AsMut<[u8]>,
    {
        let output = output.as_mut();
        self.duplex(output.len(), |outer, range| output[range].copy_from_slice(outer));
    }

    pub fn squeeze<R>(&mut self) -> R
    where
        R: AsMut<[u8]> + Default,
    {
        let mut output = R::default();
        self.squeeze_mut(&mut output);
        output
    }

    /// Squeezes as many bytes as `expected` holds and tells whether they match. The whole input
    /// is compared whatever the position of the first difference.
    pub fn squeeze_eq<T>(&mut self, expected: T) -> bool
    where
        T: AsRef<[u8]>,
    {
        let expected = expected.as_ref();
        let mut equal = true;
        self.duplex(expected.len(), |outer, range| {
            equal &= outer
                .iter()
                .zip(&expected[range])
                .fold(true, |eq, (o, e)| eq & (o == e))
        });
        equal
    }

    /// `absorb(data)`, `commit()`, then `squeeze()`
    pub fn sponge<T, R>(&mut self, data: T) -> R
    where
        T: AsRef<[u8]>,
        R: AsMut<[u8]> + Default,
    {
        self.absorb(data);
        self.commit();
        self.squeeze()
    }

    /// Encrypts `plain` into `cipher`, which must be as long
    pub fn encrypt_mut<P, C>(&mut self, plain: P, mut cipher: C) -> Result<()>
    where
        P: AsRef<[u8]>,
        C: AsMut<[u8]>,
    {
        let plain = plain.as_ref();
        let cipher = cipher.as_mut();
        if plain.len() != cipher.len() {
            return Err(Error::LengthMismatch(plain.len(), cipher.len()));
        }
        self.duplex(plain.len(), |outer, range| {
            for ((o, p), c) in outer.iter_mut().zip(&plain[range.clone()]).zip(&mut cipher[range]) {
                *c = *o ^ p;
                *o = *c;
            }
        });
        Ok(())
    }

    /// Decrypts `cipher` into `plain`, which must be as long
    pub fn decrypt_mut<C, P>(&mut self, cipher: C, mut plain: P) -> Result<()>
    where
        C: AsRef<[u8]>,
        P: AsMut<[u8]>,
    {
        let cipher = cipher.as_ref();
        let plain = plain.as_mut();
        if plain.len() != cipher.len() {
            return Err(Error::LengthMismatch(cipher.len(), plain.len()));
        }
        self.duplex(cipher.len(), |outer, range| {
            for ((o, c), p) in outer.iter_mut().zip(&cipher[range.clone()]).zip(&mut plain[range]) {
                *p = *o ^ c;
                *o = *c;
            }
        });
        Ok(())
    }

    /// Pads the outer state with zeros and runs the permutation. No-op right after a transform.
    pub fn commit(&mut self) {
        if self.pos != 0 {
            self.state.outer_mut()[self.pos..].iter_mut().for_each(|o| *o = 0);
            self.state.transform();
            self.pos = 0;
        }
    }

    /// Absorbs the capacity of `joinee`, once transformed over a cleared outer state. `joinee`
    /// is modified: [`fork`](Spongos::fork) it first to keep it.
    pub fn join(&mut self, joinee: &mut Self) {
        joinee.commit();
        joinee.state.outer_mut().iter_mut().for_each(|o| *o = 0);
        joinee.state.transform();
        let capacity: Capacity<F> = joinee.squeeze();
        self.absorb(&capacity);
    }

    pub(crate) fn outer(&self) -> &Rate<F> {
        self.state.outer()
    }

    pub(crate) fn outer_mut(&mut self) -> &mut Rate<F> {
        self.state.outer_mut()
    }

    pub(crate) fn inner(&self) -> &Capacity<F> {
        self.state.inner()
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Capacity<F> {
        self.state.inner_mut()
    }
}

impl<F: Clone> Spongos<F> {
    /// Independent copy of the sponge
    pub fn fork(&self) -> Self {
        self.clone()
    }
}

impl<F: PRP> fmt::Debug for Spongos<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outer = self.state.outer();
        write!(
            f,
            "[{}:{}|{}]",
            hex::encode(&outer[..self.pos]),
            hex::encode(&outer[self.pos..]),
            hex::encode(self.state.inner())
        )
    }
}
