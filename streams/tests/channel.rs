use std::{cell::RefCell, rc::Rc, time::Duration};

use streams::{
    id::{Ed25519, Identifier, Permissioned, Psk, PskId},
    transport::bucket,
    Address, Error, Result, User,
};

type Transport = Rc<RefCell<bucket::Client>>;

fn new_transport() -> Transport {
    Rc::new(RefCell::new(bucket::Client::new()))
}

fn user(seed: &str, transport: &Transport) -> User<Transport> {
    User::builder()
        .with_identity(Ed25519::from_seed(seed))
        .with_transport(transport.clone())
        .build()
}

/// Author with a stream, and a subscriber the author has accepted
async fn channel(multi_branching: bool) -> Result<(User<Transport>, User<Transport>, Address, Transport)> {
    let transport = new_transport();
    let mut author = user("author", &transport);
    let announcement = author.create_stream(multi_branching).await?;
    let mut subscriber = user("subscriber", &transport);
    subscriber.receive_message(announcement.address()).await?;
    let subscription = subscriber.subscribe().await?;
    author.receive_message(subscription.address()).await?;
    Ok((author, subscriber, announcement.address(), transport))
}

fn identifier(user: &User<Transport>) -> Identifier {
    user.identifier().cloned().expect("every test user has an identity")
}

#[tokio::test]
async fn subscriber_reads_the_packets_of_the_author() -> Result<()> {
    let transport = new_transport();
    let mut author = user("author", &transport);
    let announcement = author.create_stream(true).await?;
    assert_eq!(author.announcement_address()?, announcement.address());

    let mut subscriber = user("subscriber", &transport);
    let announcement_msg = subscriber.receive_message(announcement.address()).await?;
    let content = announcement_msg.as_announcement().expect("an announcement");
    assert_eq!(&content.author_identifier, author.identifier().expect("author identity"));
    assert!(content.multi_branching);
    assert_eq!(subscriber.stream_address(), Some(announcement.address()));

    let subscription = subscriber.subscribe().await?;
    let subscription_msg = author.receive_message(subscription.address()).await?;
    assert_eq!(
        subscription_msg.as_subscription().map(|s| s.subscriber_identifier()),
        subscriber.identifier()
    );
    assert_eq!(author.subscribers().collect::<Vec<_>>(), vec![&identifier(&subscriber)]);

    let keyload = author.send_keyload_for_all(announcement.link()).await?;
    let tagged = author
        .send_tagged_packet(keyload.link(), b"tagged public", b"tagged masked")
        .await?;
    let signed = author
        .send_signed_packet(tagged.link(), b"signed public", b"signed masked")
        .await?;

    let msgs = subscriber.fetch_next_messages().await?;
    assert_eq!(msgs.len(), 3);
    assert!(msgs[0].is_keyload() && msgs[0].address() == keyload.address());
    assert!(msgs[0]
        .as_keyload()
        .expect("a keyload")
        .includes_subscriber(&identifier(&subscriber)));
    assert!(msgs[1].is_tagged_packet() && msgs[1].address() == tagged.address());
    assert_eq!(msgs[1].public_payload(), Some(&b"tagged public"[..]));
    assert_eq!(msgs[1].masked_payload(), Some(&b"tagged masked"[..]));
    assert!(msgs[2].is_signed_packet() && msgs[2].address() == signed.address());
    assert_eq!(
        msgs[2].as_signed_packet().map(|p| &p.publisher_identifier),
        author.identifier()
    );
    assert_eq!(msgs[2].masked_payload(), Some(&b"signed masked"[..]));

    assert_eq!(subscriber.sync().await?, 0);
    assert_eq!(author.sync().await?, 0);
    Ok(())
}

#[tokio::test]
async fn read_write_subscriber_publishes_to_the_author() -> Result<()> {
    let (mut author, mut subscriber, announcement, _transport) = channel(true).await?;
    let keyload = author
        .send_keyload(
            announcement.relative(),
            vec![Permissioned::ReadWrite(identifier(&subscriber))],
            Vec::<PskId>::new(),
        )
        .await?;
    assert_eq!(subscriber.sync().await?, 1);

    let packet = subscriber
        .send_signed_packet(keyload.link(), b"public", b"masked")
        .await?;
    let msgs = author.fetch_next_messages().await?;
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].address(), packet.address());
    assert_eq!(msgs[0].publisher(), &identifier(&subscriber));
    assert_eq!(msgs[0].masked_payload(), Some(&b"masked"[..]));
    Ok(())
}

#[tokio::test]
async fn read_only_subscriber_cannot_publish() -> Result<()> {
    let (mut author, mut subscriber, announcement, _transport) = channel(true).await?;
    let keyload = author.send_keyload_for_all(announcement.relative()).await?;
    subscriber.sync().await?;

    let result = subscriber
        .send_tagged_packet(keyload.link(), b"public", b"masked")
        .await;
    assert!(matches!(result, Err(Error::Unauthorized(..))));
    let result = subscriber.send_keyload_for_all(keyload.link()).await;
    assert!(matches!(result, Err(Error::Unauthorized(..))));
    Ok(())
}

#[tokio::test]
async fn psk_holder_reads_without_identity() -> Result<()> {
    let transport = new_transport();
    let psk = Psk::from_seed("a psk shared out of band");
    let mut author = user("author", &transport);
    assert!(author.add_psk(psk));
    let announcement = author.create_stream(true).await?;

    let mut reader: User<Transport> = User::builder().with_psk(psk).with_transport(transport.clone()).build();
    reader.receive_message(announcement.address()).await?;

    let keyload = author.send_keyload_for_all(announcement.link()).await?;
    author
        .send_tagged_packet(keyload.link(), b"public", b"masked")
        .await?;

    let msgs = reader.fetch_next_messages().await?;
    assert_eq!(msgs.len(), 2);
    assert!(msgs[0].as_keyload().expect("a keyload").includes_psk(&psk.to_pskid()));
    assert_eq!(msgs[1].masked_payload(), Some(&b"masked"[..]));

    let result = reader
        .send_tagged_packet(keyload.link(), b"public", b"masked")
        .await;
    assert!(matches!(result, Err(Error::NoIdentity(..))));
    Ok(())
}

#[tokio::test]
async fn late_subscriber_cannot_read_earlier_keyloads() -> Result<()> {
    let (mut author, _subscriber, announcement, transport) = channel(true).await?;
    let keyload = author.send_keyload_for_all(announcement.relative()).await?;
    let packet = author
        .send_tagged_packet(keyload.link(), b"public", b"masked")
        .await?;

    let mut late = user("late subscriber", &transport);
    late.receive_message(announcement).await?;
    assert!(late.receive_message(packet.address()).await?.is_orphan());
    assert!(late.receive_message(keyload.address()).await?.is_unreadable());
    assert!(late.receive_message(packet.address()).await?.is_orphan());
    Ok(())
}

#[tokio::test]
async fn single_branch_streams_only_link_to_the_latest_message() -> Result<()> {
    let (mut author, _subscriber, announcement, _transport) = channel(false).await?;
    let keyload = author.send_keyload_for_all(announcement.relative()).await?;
    assert_eq!(author.latest_link(), Some(keyload.link()));

    let result = author
        .send_tagged_packet(announcement.relative(), b"public", b"masked")
        .await;
    assert!(matches!(result, Err(Error::InvalidLink(..))));

    let packet = author
        .send_tagged_packet(keyload.link(), b"public", b"masked")
        .await?;
    assert_eq!(author.latest_link(), Some(packet.link()));
    Ok(())
}

#[tokio::test]
async fn publishing_needs_a_stream_and_a_free_address() -> Result<()> {
    let transport = new_transport();
    let mut author = user("author", &transport);
    let mut subscriber = user("subscriber", &transport);
    assert!(matches!(subscriber.subscribe().await, Err(Error::NoStream(..))));

    author.create_stream(true).await?;
    assert!(matches!(
        author.create_stream(true).await,
        Err(Error::StreamAlreadyAttached(..))
    ));

    let mut impostor = user("author", &transport);
    assert!(matches!(impostor.create_stream(true).await, Err(Error::AddressUsed(..))));
    Ok(())
}

#[tokio::test]
async fn payloads_are_limited() -> Result<()> {
    let transport = new_transport();
    let mut author: User<Transport> = User::builder()
        .with_identity(Ed25519::from_seed("author"))
        .with_transport(transport)
        .with_payload_length(8)
        .build();
    let announcement = author.create_stream(true).await?;
    let keyload = author.send_keyload_for_all(announcement.link()).await?;

    let result = author
        .send_signed_packet(keyload.link(), b"public", b"masked")
        .await;
    assert!(matches!(result, Err(Error::PayloadTooLarge(12, 8))));
    author
        .send_signed_packet(keyload.link(), b"pub", b"mask")
        .await?;
    Ok(())
}

#[tokio::test]
async fn keyloads_only_include_known_recipients() -> Result<()> {
    let (mut author, _subscriber, announcement, _transport) = channel(true).await?;
    let stranger = Ed25519::from_seed("stranger");
    let stranger = streams::id::Identity::new(stranger).identifier().clone();

    let result = author
        .send_keyload(
            announcement.relative(),
            vec![Permissioned::Read(stranger)],
            Vec::<PskId>::new(),
        )
        .await;
    assert!(matches!(result, Err(Error::UnknownSubscriber(..))));

    let result = author
        .send_keyload(
            announcement.relative(),
            Vec::<Permissioned<Identifier>>::new(),
            vec![PskId::from_seed("unknown psk")],
        )
        .await;
    assert!(matches!(result, Err(Error::UnknownPsk(..))));
    Ok(())
}

#[tokio::test]
async fn unsubscribed_subscriber_is_forgotten() -> Result<()> {
    let (mut author, mut subscriber, _announcement, _transport) = channel(true).await?;
    let unsubscription = subscriber.unsubscribe().await?;
    let msg = author.receive_message(unsubscription.address()).await?;
    assert!(msg.is_unsubscription());
    assert_eq!(author.subscribers().count(), 0);
    assert_eq!(author.cursor(&identifier(&subscriber)), None);
    Ok(())
}

#[tokio::test]
async fn other_subscribers_sync_past_an_unsubscription() -> Result<()> {
    let (mut author, mut subscriber1, announcement, transport) = channel(true).await?;
    let mut subscriber2 = user("subscriber2", &transport);
    subscriber2.receive_message(announcement).await?;
    let subscription = subscriber2.subscribe().await?;
    author.receive_message(subscription.address()).await?;

    author.send_keyload_for_all_rw(announcement.relative()).await?;
    assert_eq!(subscriber1.sync().await?, 1);
    assert_eq!(subscriber2.sync().await?, 1);
    let subscriber1_id = identifier(&subscriber1);
    assert_eq!(subscriber2.cursor(&subscriber1_id), Some(0));

    subscriber1.unsubscribe().await?;
    // subscriber2 never read the subscription the unsubscription links to
    let synced = tokio::time::timeout(Duration::from_secs(5), subscriber2.sync())
        .await
        .expect("sync must end once the unsubscription has been fetched")?;
    assert_eq!(synced, 0);
    assert_eq!(subscriber2.cursor(&subscriber1_id), Some(1));
    assert_eq!(subscriber2.sync().await?, 0);

    author.sync().await?;
    assert_eq!(author.cursor(&subscriber1_id), None);
    assert_eq!(author.subscribers().collect::<Vec<_>>(), vec![&identifier(&subscriber2)]);
    Ok(())
}

#[tokio::test]
async fn backup_restores_the_same_user() -> Result<()> {
    let (mut author, mut subscriber, announcement, transport) = channel(true).await?;
    author.add_psk(Psk::from_seed("psk"));
    let keyload = author.send_keyload_for_all(announcement.relative()).await?;
    subscriber.sync().await?;

    let backup = author.backup("password")?;
    let mut restored = User::restore(&backup, "password", transport.clone())?;
    assert_eq!(restored, author);

    // The restored author can keep publishing where the original left off
    let packet = restored
        .send_tagged_packet(keyload.link(), b"public", b"masked")
        .await?;
    let msgs = subscriber.fetch_next_messages().await?;
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].address(), packet.address());

    let result = User::restore(&backup, "wrong password", transport);
    assert!(matches!(result, Err(Error::Backup(..))));
    Ok(())
}

#[tokio::test]
async fn backup_with_trailing_bytes_is_rejected() -> Result<()> {
    let (mut author, _subscriber, _announcement, transport) = channel(true).await?;
    let mut backup = author.backup("password")?;
    backup.push(0);
    let result = User::restore(&backup, "password", transport);
    assert!(matches!(result, Err(Error::Backup(..))));
    Ok(())
}

#[tokio::test]
async fn subscriber_recovers_from_the_announcement() -> Result<()> {
    let (mut author, subscriber, announcement, transport) = channel(true).await?;
    let keyload = author.send_keyload_for_all(announcement.relative()).await?;
    author
        .send_signed_packet(keyload.link(), b"public", b"masked")
        .await?;

    let recovered: User<Transport> = User::builder()
        .with_identity(Ed25519::from_seed("subscriber"))
        .with_transport(transport)
        .recover(announcement)
        .await?;
    assert_eq!(recovered.identifier(), subscriber.identifier());
    assert_eq!(recovered.cursor(&identifier(&author)), Some(2));
    Ok(())
}
