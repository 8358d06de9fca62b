//! Who publishes and who reads: an [`Identity`] holds secret keys, its [`Identifier`] is what
//! other users see. A [`Psk`] grants reading rights without any identity.
mod ed25519;
mod identifier;
mod identity;
mod permission;
mod psk;

pub use ed25519::Ed25519;
pub use identifier::Identifier;
pub use identity::Identity;
pub use permission::Permissioned;
pub use psk::{Psk, PskId};

#[cfg(test)]
mod tests;
