use alloc::vec::Vec;

use crypto::{keys::x25519, signatures::ed25519};

use crate::{
    core::{prng::SpongosRng, prp::keccak::KeccakF1600, spongos::Spongos},
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit, Ed25519, Fork, Guard, Mask, Repeated, Skip, Squeeze, X25519},
        modifiers::External,
        types::{Bytes, Mac, Maybe, NBytes, Size, Uint16, Uint32, Uint64, Uint8},
    },
    error::{Error, Result},
};

type WrapCtx<'a> = wrap::Context<&'a mut [u8], KeccakF1600>;
type UnwrapCtx<'a> = unwrap::Context<&'a [u8], KeccakF1600>;

const MAC: Mac = Mac::new(32);

fn wrap_fields(buf: &mut [u8]) -> Result<usize> {
    let payload = b"a payload longer than one byte".to_vec();
    let mut ctx = WrapCtx::new(buf);
    ctx.absorb(Uint8::new(7))?
        .absorb(Uint16::new(0x1234))?
        .mask(Uint32::new(0xdead_beef))?
        .skip(Uint64::new(u64::MAX))?
        .absorb(Size::new(300))?
        .mask(Bytes::new(&payload))?
        .absorb(NBytes::new([9u8; 16]))?
        .absorb(Maybe::new(Some(Size::new(5))))?
        .mask(Maybe::<Option<Size>>::new(None))?
        .commit()?
        .squeeze(MAC)?;
    Ok(ctx.stream().len())
}

#[test]
fn fields_unwrap_to_wrapped_values() -> Result<()> {
    let payload = b"a payload longer than one byte".to_vec();
    let size = sizeof::Context::new()
        .absorb(Uint8::new(7))?
        .absorb(Uint16::new(0x1234))?
        .mask(Uint32::new(0xdead_beef))?
        .skip(Uint64::new(u64::MAX))?
        .absorb(Size::new(300))?
        .mask(Bytes::new(&payload))?
        .absorb(NBytes::new([9u8; 16]))?
        .absorb(Maybe::new(Some(Size::new(5))))?
        .mask(Maybe::<Option<Size>>::new(None))?
        .commit()?
        .squeeze(MAC)?
        .finalize();

    let mut buf = vec![0u8; size];
    let remaining = wrap_fields(&mut buf)?;
    assert_eq!(remaining, 0, "sizeof must match the wrapped length");

    let mut u8_ = Uint8::default();
    let mut u16_ = Uint16::default();
    let mut u32_ = Uint32::default();
    let mut u64_ = Uint64::default();
    let mut size_ = Size::default();
    let mut bytes_ = Vec::new();
    let mut nbytes_ = [0u8; 16];
    let mut some_: Option<Size> = None;
    let mut none_ = Some(Size::new(1));
    let mut ctx = UnwrapCtx::new(&buf[..]);
    ctx.absorb(&mut u8_)?
        .absorb(&mut u16_)?
        .mask(&mut u32_)?
        .skip(&mut u64_)?
        .absorb(&mut size_)?
        .mask(Bytes::new(&mut bytes_))?
        .absorb(NBytes::new(&mut nbytes_))?
        .absorb(Maybe::new(&mut some_))?
        .mask(Maybe::new(&mut none_))?
        .commit()?
        .squeeze(MAC)?;

    assert!(ctx.stream().is_empty());
    assert_eq!(u8_.inner(), 7);
    assert_eq!(u16_.inner(), 0x1234);
    assert_eq!(u32_.inner(), 0xdead_beef);
    assert_eq!(u64_.inner(), u64::MAX);
    assert_eq!(size_, Size::new(300));
    assert_eq!(bytes_, payload);
    assert_eq!(nbytes_, [9u8; 16]);
    assert_eq!(some_, Some(Size::new(5)));
    assert_eq!(none_, None);
    Ok(())
}

#[test]
fn masked_fields_are_not_plain_text() -> Result<()> {
    let key = NBytes::new([7u8; 32]);
    let secret = [0x42u8; 32];
    let mut buf = vec![0u8; 32];
    WrapCtx::new(&mut buf[..])
        .absorb(External::new(&key))?
        .commit()?
        .mask(NBytes::new(secret))?;
    assert_ne!(buf, secret.to_vec());

    let mut recovered = [0u8; 32];
    UnwrapCtx::new(&buf[..])
        .absorb(External::new(&key))?
        .commit()?
        .mask(NBytes::new(&mut recovered))?;
    assert_eq!(recovered, secret);
    Ok(())
}

#[test]
fn tampering_is_detected_by_mac() -> Result<()> {
    let size = sizeof::Context::new()
        .mask(Bytes::new(b"hello"))?
        .commit()?
        .squeeze(MAC)?
        .finalize();
    let mut buf = vec![0u8; size];
    WrapCtx::new(&mut buf[..]).mask(Bytes::new(b"hello"))?.commit()?.squeeze(MAC)?;

    buf[2] ^= 0x01;
    let mut plain = Vec::new();
    let result = UnwrapCtx::new(&buf[..])
        .mask(Bytes::new(&mut plain))
        .and_then(|ctx| ctx.commit())
        .and_then(|ctx| ctx.squeeze(MAC))
        .map(|_| ());
    assert_eq!(result, Err(Error::BadMac));
    Ok(())
}

#[test]
fn short_stream_is_rejected() {
    let buf = [0u8; 3];
    let mut u = Uint32::default();
    assert_eq!(
        UnwrapCtx::new(&buf[..]).absorb(&mut u).map(|_| ()),
        Err(Error::StreamAllocationExceededIn(4, 3))
    );
}

#[test]
fn invalid_maybe_flag_is_rejected() {
    let buf = [2u8, 0];
    let mut maybe: Option<Uint8> = None;
    assert_eq!(
        UnwrapCtx::new(&buf[..]).absorb(Maybe::new(&mut maybe)).map(|_| ()),
        Err(Error::InvalidOption("maybe", 2))
    );
}

#[test]
fn signed_hash_verifies_only_with_signer_key() -> Result<()> {
    let mut rng = SpongosRng::<KeccakF1600>::new("signer");
    let secret_key = ed25519::SecretKey::generate_with(&mut rng);
    let other_key = ed25519::SecretKey::generate_with(&mut rng).public_key();

    let mut hash = NBytes::new([0u8; 64]);
    let size = sizeof::Context::new()
        .absorb(Bytes::new(b"signed content"))?
        .commit()?
        .squeeze(External::new(&mut hash))?
        .ed25519(&secret_key, External::new(&hash))?
        .finalize();
    let mut buf = vec![0u8; size];
    WrapCtx::new(&mut buf[..])
        .absorb(Bytes::new(b"signed content"))?
        .commit()?
        .squeeze(External::new(&mut hash))?
        .ed25519(&secret_key, External::new(&hash))?;

    let verify = |public_key: &ed25519::PublicKey| -> Result<()> {
        let mut content = Vec::new();
        let mut hash = NBytes::new([0u8; 64]);
        UnwrapCtx::new(&buf[..])
            .absorb(Bytes::new(&mut content))?
            .commit()?
            .squeeze(External::new(&mut hash))?
            .ed25519(public_key, External::new(&hash))?;
        Ok(())
    };
    verify(&secret_key.public_key())?;
    assert_eq!(verify(&other_key), Err(Error::SignatureMismatch));
    Ok(())
}

#[test]
fn x25519_key_is_recovered_by_recipient() -> Result<()> {
    let mut rng = SpongosRng::<KeccakF1600>::new("recipient");
    let recipient = x25519::SecretKey::generate_with(&mut rng);
    let key = [0x5au8; 32];

    let size = sizeof::Context::new()
        .x25519(&recipient.public_key(), NBytes::new(key))?
        .finalize();
    let mut buf = vec![0u8; size];
    WrapCtx::new(&mut buf[..]).x25519(&recipient.public_key(), NBytes::new(key))?;

    let mut recovered = [0u8; 32];
    UnwrapCtx::new(&buf[..]).x25519(&recipient, NBytes::new(&mut recovered))?;
    assert_eq!(recovered, key);

    let intruder = x25519::SecretKey::generate_with(&mut rng);
    let mut garbage = [0u8; 32];
    UnwrapCtx::new(&buf[..]).x25519(&intruder, NBytes::new(&mut garbage))?;
    assert_ne!(garbage, key);
    Ok(())
}

#[test]
fn forked_entries_can_be_skipped() -> Result<()> {
    let entries = [[1u8; 8], [2u8; 8], [3u8; 8]];
    let mut buf = vec![0u8; 2 + 3 * 8];
    let mut ctx = WrapCtx::new(&mut buf[..]);
    ctx.absorb(Size::new(entries.len()))?.repeated(entries.iter(), |ctx, entry| {
        ctx.fork().mask(NBytes::new(entry))?;
        Ok(())
    })?;

    let mut n = Size::default();
    let mut second = [0u8; 8];
    let mut ctx = UnwrapCtx::new(&buf[..]);
    ctx.absorb(&mut n)?;
    for i in 0..n.inner() {
        if i == 1 {
            ctx.fork().mask(NBytes::new(&mut second))?;
        } else {
            ctx.drop(8)?;
        }
    }
    assert_eq!(second, [2u8; 8]);
    assert!(ctx.stream().is_empty());
    Ok(())
}

#[test]
fn masked_spongos_is_restored() -> Result<()> {
    let mut original = Spongos::<KeccakF1600>::init();
    original.absorb(b"state");
    original.commit();

    let size = sizeof::Context::new().mask(&original)?.finalize();
    let mut buf = vec![0u8; size];
    WrapCtx::new(&mut buf[..]).mask(&original)?;

    let mut restored = Spongos::<KeccakF1600>::init();
    UnwrapCtx::new(&buf[..]).mask(&mut restored)?;
    assert_eq!(restored, original);
    Ok(())
}

#[test]
fn guard_fails_with_given_error() {
    let mut buf = [0u8; 0];
    let result = WrapCtx::new(&mut buf[..]).guard(false, Error::BadMac).map(|_| ());
    assert_eq!(result, Err(Error::BadMac));
}
