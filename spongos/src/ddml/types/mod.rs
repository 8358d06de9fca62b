mod bytes;
mod mac;
mod maybe;
mod nbytes;
mod size;
mod uint;

pub use bytes::Bytes;
pub use mac::Mac;
pub use maybe::Maybe;
pub use nbytes::NBytes;
pub use size::Size;
pub use uint::{Uint16, Uint32, Uint64, Uint8};
