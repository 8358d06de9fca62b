//! C bindings of the channel protocol.
//!
//! Authors, subscribers, transports, addresses and messages cross the boundary as opaque heap
//! handles created by the `*_new`/`auth_*`/`sub_*` functions and released by their matching
//! `*_drop`/`drop_*` function. Every function accepts null handles: they are reported with a null
//! return value or an [`Err`] status, never with a panic. `include/streams.h` declares the
//! surface for C consumers.

mod api;
pub use api::*;
