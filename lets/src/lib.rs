//! Message layer of the channel protocol.
//!
//! * [`address`]: where a message lives, an application address plus a message identifier
//! * [`id`]: identities that sign and decrypt, and the identifiers others know them by
//! * [`message`]: header (`HDF`) and payload (`PCF`) frames, encoded with the DDML of `spongos`
//! * [`transport`]: where messages are published and read from
#![allow(clippy::module_inception)]
#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod address;
pub mod error;
pub mod id;
pub mod message;
pub mod transport;
