use alloc::vec::Vec;

use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Mask},
        types::Bytes,
    },
    error::{Error as SpongosError, Result},
    KeccakF1600,
};

use crate::{
    id::{Ed25519, Identifier, Identity, Permissioned, Psk, PskId},
    message::{ContentDecrypt, ContentEncrypt, ContentEncryptSizeOf, ContentSign, ContentSignSizeof, ContentVerify},
};

type WrapCtx<'a> = wrap::Context<&'a mut [u8], KeccakF1600>;
type UnwrapCtx<'a> = unwrap::Context<&'a [u8], KeccakF1600>;

fn signed(signer: &Identity, content: &[u8]) -> Result<Vec<u8>> {
    let size = sizeof::Context::new()
        .absorb(Bytes::new(content))?
        .sign_sizeof(signer)?
        .finalize();
    let mut buf = vec![0; size];
    WrapCtx::new(&mut buf[..]).absorb(Bytes::new(content))?.sign(signer)?;
    Ok(buf)
}

fn verify(verifier: &Identifier, buf: &[u8]) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    UnwrapCtx::new(buf).absorb(Bytes::new(&mut content))?.verify(verifier)?;
    Ok(content)
}

#[test]
fn signature_verifies_with_signer_identifier() -> Result<()> {
    let alice = Identity::new(Ed25519::from_seed("alice"));
    let buf = signed(&alice, b"hello")?;
    assert_eq!(verify(alice.identifier(), &buf)?, b"hello".to_vec());
    Ok(())
}

#[test]
fn signature_fails_with_other_identifier() -> Result<()> {
    let alice = Identity::new(Ed25519::from_seed("alice"));
    let eve = Identity::new(Ed25519::from_seed("eve"));
    let buf = signed(&alice, b"hello")?;
    assert_eq!(verify(eve.identifier(), &buf), Err(SpongosError::SignatureMismatch));
    Ok(())
}

#[test]
fn key_is_decrypted_by_recipient_only() -> Result<()> {
    let bob = Identity::new(Ed25519::from_seed("bob"));
    let eve = Identity::new(Ed25519::from_seed("eve"));
    let key = [7u8; 32];

    let size = sizeof::Context::new()
        .encrypt_sizeof(bob.identifier(), &key)?
        .finalize();
    let mut buf = vec![0; size];
    WrapCtx::new(&mut buf[..]).encrypt(bob.identifier(), &key)?;

    let mut decrypted = [0u8; 32];
    UnwrapCtx::new(&buf[..]).decrypt(&bob, &mut decrypted)?;
    assert_eq!(decrypted, key);

    let mut garbage = [0u8; 32];
    UnwrapCtx::new(&buf[..]).decrypt(&eve, &mut garbage)?;
    assert_ne!(garbage, key);
    Ok(())
}

#[test]
fn masked_identifier_is_recovered() -> Result<()> {
    let alice = Identity::new(Ed25519::from_seed("alice"));
    let size = sizeof::Context::new().mask(alice.identifier())?.finalize();
    let mut buf = vec![0; size];
    WrapCtx::new(&mut buf[..]).mask(alice.identifier())?;

    let mut identifier = Identifier::default();
    UnwrapCtx::new(&buf[..]).mask(&mut identifier)?;
    assert_eq!(&identifier, alice.identifier());
    Ok(())
}

#[test]
fn unknown_identifier_oneof_is_rejected() {
    let buf = [9u8; 33];
    let mut identifier = Identifier::default();
    assert_eq!(
        UnwrapCtx::new(&buf[..]).absorb(&mut identifier).map(|_| ()),
        Err(SpongosError::InvalidOption("identifier", 9))
    );
}

#[test]
fn permission_is_recovered() -> Result<()> {
    let bob = Identity::new(Ed25519::from_seed("bob"));
    let permission = Permissioned::ReadWrite(bob.identifier());
    let size = sizeof::Context::new().mask(&permission)?.finalize();
    let mut buf = vec![0; size];
    WrapCtx::new(&mut buf[..]).mask(&permission)?;

    let mut recovered = Permissioned::default();
    UnwrapCtx::new(&buf[..]).mask(&mut recovered)?;
    assert_eq!(recovered, Permissioned::ReadWrite(bob.identifier().clone()));
    assert!(!recovered.is_readonly());
    Ok(())
}

#[test]
fn same_seed_gives_same_keys() {
    assert_eq!(Ed25519::from_seed("seed"), Ed25519::from_seed("seed"));
    assert_ne!(Ed25519::from_seed("seed"), Ed25519::from_seed("other seed"));
    assert_eq!(Psk::from_seed("psk").to_pskid(), PskId::from_seed("psk"));
    assert_ne!(PskId::from_seed("psk"), PskId::from_seed("other psk"));
}
