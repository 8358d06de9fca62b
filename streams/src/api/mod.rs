/// Last sequence number read or written per publisher, along with its permission
mod cursor_store;

pub mod message;
/// Polling of the channel for messages not read yet
pub mod messages;
pub(crate) mod send_response;
pub mod user;
pub mod user_builder;
