//! Contents of the channel messages and their DDML encodings

pub(crate) mod announcement;
pub(crate) mod keyload;
/// Signed and tagged packets
pub(crate) mod packet;
pub(crate) mod subscription;
pub(crate) mod unsubscription;

/// Message type constants
pub(crate) mod message_types;

#[cfg(test)]
mod tests;
