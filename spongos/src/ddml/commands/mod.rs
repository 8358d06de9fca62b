//! DDML commands.
//!
//! Each command is a trait implemented by the three contexts. Commands return `&mut Self` so
//! that a message can be written as a single chain that reads like its DDML description:
//!
//! ```ddml
//! message Example {
//!     absorb u8 tag;
//!     mask   bytes payload;
//!     commit;
//!     squeeze u8 mac[32];
//! }
//! ```
use crate::{
    core::spongos::Spongos,
    error::{Error, Result},
};

/// Absorb a field in plain text: the value is written to the stream and absorbed into the
/// sponge. With the `External` modifier the value is absorbed but not written.
pub trait Absorb<Type> {
    fn absorb(&mut self, field: Type) -> Result<&mut Self>;
}

/// Squeeze bytes out of the sponge: a [`Mac`](crate::ddml::types::Mac) is written and checked
/// by the reader, an external hash is only kept in memory.
pub trait Squeeze<Type> {
    fn squeeze(&mut self, field: Type) -> Result<&mut Self>;
}

/// Encrypt (wrap) or decrypt (unwrap) a field with the sponge.
pub trait Mask<Type> {
    fn mask(&mut self, field: Type) -> Result<&mut Self>;
}

/// Write or read a field without touching the sponge.
pub trait Skip<Type> {
    fn skip(&mut self, field: Type) -> Result<&mut Self>;
}

/// Transform the sponge if its outer state holds absorbed data.
pub trait Commit {
    fn commit(&mut self) -> Result<&mut Self>;
}

/// Sign (wrap) or verify (unwrap) a previously squeezed hash.
pub trait Ed25519<Key, Hash> {
    fn ed25519(&mut self, key: Key, hash: Hash) -> Result<&mut Self>;
}

/// Encapsulate a key for the holder of an x25519 key pair: an ephemeral public key is
/// absorbed, the shared secret is absorbed externally and the key is masked.
pub trait X25519<ExchangeKey, EncryptionKey> {
    fn x25519(&mut self, exchange_key: ExchangeKey, encryption_key: EncryptionKey) -> Result<&mut Self>;
}

/// Continue on a copy of the sponge. Commands applied to the fork do not affect the
/// original, but they share the same stream.
pub trait Fork<'a> {
    type Forked;
    fn fork(&'a mut self) -> Self::Forked;
}

/// Absorb the state of another sponge.
pub trait Join<F> {
    fn join(&mut self, joinee: &mut Spongos<F>) -> Result<&mut Self>;
}

/// Run `handle` once for each value in `values`.
pub trait Repeated {
    fn repeated<I, C>(&mut self, values: I, handle: C) -> Result<&mut Self>
    where
        I: IntoIterator,
        C: FnMut(&mut Self, I::Item) -> Result<()>;
}

/// Fail with `err` unless `cond` holds.
pub trait Guard {
    fn guard<E>(&mut self, cond: bool, err: E) -> Result<&mut Self>
    where
        E: Into<Error>;
}

/// Print the state of the context, for debugging.
pub trait Dump {
    fn dump(&mut self, args: core::fmt::Arguments<'_>) -> Result<&mut Self>;
}

pub mod sizeof;
pub mod unwrap;
pub mod wrap;

#[cfg(test)]
mod tests;
