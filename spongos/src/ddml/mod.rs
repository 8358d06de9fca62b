//! DDML: a data description language extended with commands for cryptographic processing,
//! embedded in Rust.
//!
//! A message is described once as a chain of commands and executed against three contexts:
//! [`commands::sizeof::Context`] computes the encoded length, [`commands::wrap::Context`]
//! writes the message while updating a [`Spongos`](crate::Spongos) and
//! [`commands::unwrap::Context`] reads it back, replaying the same sponge operations.

/// Declares a transparent wrapper whose only role is to select how a value is encoded
macro_rules! wrapper_type {
    ($(#[$attr:meta])* $name:ident $(= $default:ty)?) => {
        $(#[$attr])*
        pub struct $name<T $(= $default)?>(T);

        impl<T> $name<T> {
            pub fn new(t: T) -> Self {
                Self(t)
            }

            pub fn inner(&self) -> &T {
                &self.0
            }

            pub fn inner_mut(&mut self) -> &mut T {
                &mut self.0
            }

            pub fn into_inner(self) -> T {
                self.0
            }
        }
    };
}

pub mod commands;
pub mod io;
pub mod modifiers;
pub mod types;
