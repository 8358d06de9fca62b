//! A duplex sponge over Keccak-F[1600], together with DDML, the command language that sizes,
//! wraps and unwraps messages while feeding them through the sponge.
//!
//! [`Spongos`] is the state shared by both ends of a message. [`SpongosRng`] derives
//! deterministic randomness from it.
#![no_std]

#[cfg_attr(test, macro_use)]
extern crate alloc;

// `Dump` prints the sponge state
#[cfg(feature = "std")]
#[macro_use]
extern crate std;

mod core;
pub mod ddml;
pub mod error;

pub use crate::core::{
    prng::SpongosRng,
    prp::{keccak::KeccakF1600, PRP},
    spongos::Spongos,
};
