//! High-level Implementation of the Streams Channel Protocol.
//!
//! API functions can be found through the [`User`]. A user publishes and reads messages through
//! a [`Transport`](transport::Transport); the in-memory [`bucket::Client`](transport::bucket::Client)
//! is provided.
//!
//! ## Starting a new Channel
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use streams::{id::Ed25519, transport::bucket, Result, User};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let transport = Rc::new(RefCell::new(bucket::Client::new()));
//!     let mut author = User::builder()
//!         .with_identity(Ed25519::from_seed("A cryptographically secure seed"))
//!         .with_transport(transport)
//!         .build();
//!
//!     let announcement = author.create_stream(true).await?;
//!     assert_eq!(author.stream_address(), Some(announcement.address()));
//!     Ok(())
//! }
//! ```

#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

/// Protocol message types and encodings
mod message;

/// [`User`] API.
mod api;

pub use api::{
    message::{Announcement, Keyload, Message, MessageContent, Orphan, SignedPacket, Subscription, TaggedPacket, Unsubscription},
    messages::Messages,
    send_response::SendResponse,
    user::{User, DEFAULT_PAYLOAD_LENGTH},
    user_builder::{IntoTransport, UserBuilder},
};

/// Errors for Streams
mod error;
pub use error::{Error, Result};

pub use lets::{
    address::{Address, AppAddr, MsgId},
    id,
    message::TransportMessage,
    transport,
};
