use alloc::vec::Vec;

use hashbrown::HashMap;

use lets::{
    id::{Ed25519, Identity, Permissioned, Psk},
    message::{ContentSizeof, ContentUnwrap, ContentWrap},
};
use spongos::{
    ddml::commands::{sizeof, unwrap, wrap},
    error::{Error as SpongosError, Result},
    KeccakF1600, Spongos,
};

use super::{announcement, keyload, packet, subscription};

type UnwrapCtx<'a> = unwrap::Context<&'a [u8], KeccakF1600>;

fn wrap_content<C>(content: &mut C) -> Result<Vec<u8>>
where
    sizeof::Context: ContentSizeof<C>,
    for<'b> wrap::Context<&'b mut [u8], KeccakF1600>: ContentWrap<C>,
{
    let mut ctx = sizeof::Context::new();
    ctx.sizeof(content)?;
    let mut buf = vec![0u8; ctx.finalize()];
    let mut ctx = wrap::Context::<&mut [u8], KeccakF1600>::new(&mut buf[..]);
    ctx.wrap(content)?;
    assert!(ctx.stream().is_empty(), "sizeof must match the wrapped length");
    Ok(buf)
}

/// State of the message every test content is linked to
fn linked_state() -> Spongos {
    let mut spongos = Spongos::init();
    spongos.absorb("linked message");
    spongos.commit();
    spongos
}

fn identity(seed: &str) -> Identity {
    Identity::new(Ed25519::from_seed(seed))
}

#[test]
fn announcement_carries_author_and_branching() -> Result<()> {
    let author = identity("author");
    let buf = wrap_content(&mut announcement::Wrap::new(&author, true))?;

    let mut announcement = announcement::Unwrap::default();
    UnwrapCtx::new(&buf[..]).unwrap(&mut announcement)?;
    assert_eq!(announcement.author_id(), author.identifier());
    assert!(announcement.is_multi_branching());

    let buf = wrap_content(&mut announcement::Wrap::new(&author, false))?;
    let mut announcement = announcement::Unwrap::default();
    UnwrapCtx::new(&buf[..]).unwrap(&mut announcement)?;
    assert!(!announcement.is_multi_branching());
    Ok(())
}

#[test]
fn author_recovers_subscription() -> Result<()> {
    let author = identity("author");
    let subscriber = identity("subscriber");
    let unsubscribe_key = [7u8; subscription::UNSUBSCRIBE_KEY_SIZE];

    let mut state = linked_state();
    let buf = wrap_content(&mut subscription::Wrap::new(
        &mut state,
        unsubscribe_key,
        &subscriber,
        author.identifier(),
    ))?;

    let mut state = linked_state();
    let mut subscription = subscription::Unwrap::new(&mut state, &author);
    UnwrapCtx::new(&buf[..]).unwrap(&mut subscription)?;
    assert_eq!(subscription.subscriber_identifier(), subscriber.identifier());
    assert_eq!(subscription.unsubscribe_key(), unsubscribe_key);
    Ok(())
}

#[test]
fn subscription_read_by_someone_else_fails() -> Result<()> {
    let author = identity("author");
    let subscriber = identity("subscriber");
    let eavesdropper = identity("eavesdropper");

    let mut state = linked_state();
    let buf = wrap_content(&mut subscription::Wrap::new(
        &mut state,
        [1; subscription::UNSUBSCRIBE_KEY_SIZE],
        &subscriber,
        author.identifier(),
    ))?;

    let mut state = linked_state();
    let mut subscription = subscription::Unwrap::new(&mut state, &eavesdropper);
    let result = UnwrapCtx::new(&buf[..]).unwrap(&mut subscription).map(|_| ());
    assert!(result.is_err());
    Ok(())
}

#[test]
fn keyload_is_read_by_subscribers_and_psk_holders_only() -> Result<()> {
    let author = identity("author");
    let reader = identity("reader");
    let writer = identity("writer");
    let outsider = identity("outsider");
    let psk = Psk::from_seed("shared out of band");

    let subscribers = [
        Permissioned::Read(reader.identifier()),
        Permissioned::ReadWrite(writer.identifier()),
    ];
    let psks = [(psk.to_pskid(), psk)];
    let mut state = linked_state();
    let buf = wrap_content(&mut keyload::Wrap::new(
        &mut state,
        &subscribers,
        &psks,
        [3; keyload::KEY_SIZE],
        [4; keyload::NONCE_SIZE],
        &author,
    ))?;

    let no_psks = HashMap::new();
    for subscriber in [&reader, &writer] {
        let mut state = linked_state();
        let mut keyload = keyload::Unwrap::new(&mut state, Some(subscriber), author.identifier(), &no_psks);
        UnwrapCtx::new(&buf[..]).unwrap(&mut keyload)?;
        assert!(keyload.is_readable());
        let (permissions, pskids) = keyload.into_parts();
        assert_eq!(
            permissions,
            vec![
                Permissioned::Read(reader.identifier().clone()),
                Permissioned::ReadWrite(writer.identifier().clone())
            ]
        );
        assert_eq!(pskids, vec![psk.to_pskid()]);
    }

    let mut psk_store = HashMap::new();
    psk_store.insert(psk.to_pskid(), psk);
    let mut state = linked_state();
    let mut keyload = keyload::Unwrap::new(&mut state, None, author.identifier(), &psk_store);
    UnwrapCtx::new(&buf[..]).unwrap(&mut keyload)?;
    assert!(keyload.is_readable());

    let mut state = linked_state();
    let mut keyload = keyload::Unwrap::new(&mut state, Some(&outsider), author.identifier(), &no_psks);
    UnwrapCtx::new(&buf[..]).unwrap(&mut keyload)?;
    assert!(!keyload.is_readable());
    Ok(())
}

#[test]
fn keyload_signed_by_someone_else_is_rejected() -> Result<()> {
    let author = identity("author");
    let impostor = identity("impostor");
    let reader = identity("reader");

    let subscribers = [Permissioned::Read(reader.identifier())];
    let mut state = linked_state();
    let buf = wrap_content(&mut keyload::Wrap::new(
        &mut state,
        &subscribers,
        &[],
        [3; keyload::KEY_SIZE],
        [4; keyload::NONCE_SIZE],
        &impostor,
    ))?;

    let no_psks = HashMap::new();
    let mut state = linked_state();
    let mut keyload = keyload::Unwrap::new(&mut state, Some(&reader), author.identifier(), &no_psks);
    let result = UnwrapCtx::new(&buf[..]).unwrap(&mut keyload).map(|_| ());
    assert_eq!(result, Err(SpongosError::SignatureMismatch));
    Ok(())
}

#[test]
fn packets_need_the_linked_state() -> Result<()> {
    let publisher = identity("publisher");

    let mut state = linked_state();
    let buf = wrap_content(&mut packet::Wrap::tagged(&mut state, b"public", b"masked"))?;
    let mut state = linked_state();
    let mut tagged = packet::Unwrap::tagged(&mut state);
    UnwrapCtx::new(&buf[..]).unwrap(&mut tagged)?;
    assert!(tagged.signer().is_none());
    assert_eq!(tagged.into_payloads(), (b"public".to_vec(), b"masked".to_vec()));

    let mut other_state = Spongos::init();
    let mut tagged = packet::Unwrap::tagged(&mut other_state);
    let result = UnwrapCtx::new(&buf[..]).unwrap(&mut tagged).map(|_| ());
    assert_eq!(result, Err(SpongosError::BadMac));

    let mut state = linked_state();
    let buf = wrap_content(&mut packet::Wrap::signed(&mut state, &publisher, b"public", b"masked"))?;
    let mut state = linked_state();
    let mut signed = packet::Unwrap::signed(&mut state, publisher.identifier());
    UnwrapCtx::new(&buf[..]).unwrap(&mut signed)?;
    assert_eq!(signed.signer(), Some(publisher.identifier()));
    assert_eq!(signed.into_payloads().1, b"masked");
    Ok(())
}

#[test]
fn signed_packets_verify_against_the_expected_publisher() -> Result<()> {
    let publisher = identity("publisher");
    let impostor = identity("impostor");

    let mut state = linked_state();
    let buf = wrap_content(&mut packet::Wrap::signed(&mut state, &impostor, b"public", b"masked"))?;
    let mut state = linked_state();
    let mut signed = packet::Unwrap::signed(&mut state, publisher.identifier());
    let result = UnwrapCtx::new(&buf[..]).unwrap(&mut signed).map(|_| ());
    assert_eq!(result, Err(SpongosError::SignatureMismatch));
    Ok(())
}
