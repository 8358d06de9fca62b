//! Content traits: a message content is described once per DDML context.
//!
//! `sizeof::Context` implements the `*Sizeof` traits, `wrap::Context` the writing traits and
//! `unwrap::Context` the reading ones, so that the three descriptions of a content stay side
//! by side.
use spongos::error::Result;

/// Encoded size of `T`
pub trait ContentSizeof<T> {
    fn sizeof(&mut self, content: &T) -> Result<&mut Self>;
}

/// Encode `T` into the context stream
pub trait ContentWrap<T> {
    fn wrap(&mut self, content: &mut T) -> Result<&mut Self>;
}

/// Decode `T` from the context stream
pub trait ContentUnwrap<T> {
    fn unwrap(&mut self, content: &mut T) -> Result<&mut Self>;
}

/// Encoded size of the signature made by `T`
pub trait ContentSignSizeof<T> {
    fn sign_sizeof(&mut self, signer: &T) -> Result<&mut Self>;
}

/// Sign the current sponge state with `T` and write the signature
pub trait ContentSign<T> {
    fn sign(&mut self, signer: &T) -> Result<&mut Self>;
}

/// Read a signature and check it against the current sponge state
pub trait ContentVerify<T> {
    fn verify(&mut self, verifier: &T) -> Result<&mut Self>;
}

/// Encoded size of `key` encrypted for `T`
pub trait ContentEncryptSizeOf<T> {
    fn encrypt_sizeof(&mut self, recipient: &T, key: &[u8]) -> Result<&mut Self>;
}

/// Encrypt `key` for recipient `T`
pub trait ContentEncrypt<T> {
    fn encrypt(&mut self, recipient: &T, key: &[u8]) -> Result<&mut Self>;
}

/// Decrypt a key encrypted for `T` into `key`
pub trait ContentDecrypt<T> {
    fn decrypt(&mut self, recipient: &T, key: &mut [u8]) -> Result<&mut Self>;
}
