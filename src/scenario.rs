use std::{cell::RefCell, rc::Rc};

use anyhow::{bail, ensure, Context, Result};
use rand::Rng;
use tracing::info;

use streams::{
    id::Ed25519,
    transport::{bucket, Transport},
    Address, Message, TransportMessage, User,
};

use crate::config::Config;

const SEED_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ9";
const SEED_LENGTH: usize = 10;
const SUBSCRIBER_SEED: &str = "SUBSCRIBERA9SEED";
const PUBLIC_PAYLOAD: &str = "A public payload woopeee";
const MASKED_PAYLOAD: &str = "A private payload uhu";

type SharedTransport = Rc<RefCell<bucket::Client>>;

/// Random seed drawn from the tryte alphabet
pub fn new_seed() -> String {
    let mut rng = rand::thread_rng();
    (0..SEED_LENGTH)
        .map(|_| SEED_ALPHABET[rng.gen_range(0..SEED_ALPHABET.len())] as char)
        .collect()
}

/// Fetches the message stored at `link`
async fn get_transaction(transport: &mut SharedTransport, link: Address) -> Result<TransportMessage> {
    transport
        .recv_message(link)
        .await
        .with_context(|| format!("fetching the message at {}", link))
}

fn user(seed: &str, config: &Config, transport: &SharedTransport) -> User<SharedTransport> {
    User::builder()
        .with_identity(Ed25519::from_seed(seed))
        .with_payload_length(config.payload_length)
        .with_transport(transport.clone())
        .build()
}

/// Runs the channel lifecycle, returning the messages the subscriber read after subscribing
pub async fn run(config: &Config) -> Result<Vec<Message>> {
    let mut transport: SharedTransport = Rc::new(RefCell::new(bucket::Client::new()));
    let seed = config.seed.clone().unwrap_or_else(new_seed);

    info!(%seed, "making author");
    let mut author = user(&seed, config, &transport);
    let channel_address = author.announcement_address()?.base();
    info!(appinst = %channel_address, "made an author");

    let ann_link = author
        .create_stream(config.multi_branching())
        .await
        .context("sending the announcement")?
        .address();
    info!(address = %ann_link, multi_branching = config.multi_branching(), "made an announcement");
    let ann_packet = get_transaction(&mut transport, ann_link).await?;

    info!(seed = SUBSCRIBER_SEED, "making subscriber A");
    let mut subscriber = user(SUBSCRIBER_SEED, config, &transport);
    let announcement = subscriber
        .handle_message(ann_link, ann_packet)
        .context("unwrapping the announcement")?;
    ensure!(announcement.is_announcement(), "message at {} is not an announcement", ann_link);
    ensure!(
        subscriber.stream_address().map(Address::base) == Some(channel_address),
        "subscriber A joined another channel"
    );

    let sub_link = subscriber
        .subscribe()
        .await
        .context("sending the subscription")?
        .address();
    let sub_packet = get_transaction(&mut transport, sub_link).await?;
    let subscription = author
        .handle_message(sub_link, sub_packet)
        .context("accepting the subscription")?;
    if !subscription.is_subscription() {
        bail!("message at {} is not a subscription", sub_link);
    }
    info!(address = %sub_link, "subscriber A subscribed");

    if !config.full {
        return Ok(Vec::new());
    }

    let keyload_link = author
        .send_keyload_for_all(ann_link.relative())
        .await
        .context("sending the keyload")?
        .address();
    info!(address = %keyload_link, "made a keyload");
    let tagged_link = author
        .send_tagged_packet(keyload_link.relative(), PUBLIC_PAYLOAD, MASKED_PAYLOAD)
        .await
        .context("sending the tagged packet")?
        .address();
    info!(address = %tagged_link, "made a tagged packet");
    let signed_link = author
        .send_signed_packet(tagged_link.relative(), PUBLIC_PAYLOAD, MASKED_PAYLOAD)
        .await
        .context("sending the signed packet")?
        .address();
    info!(address = %signed_link, "made a signed packet");

    let messages = subscriber
        .fetch_next_messages()
        .await
        .context("subscriber A reading the channel")?;
    ensure!(
        messages.len() == 3,
        "subscriber A read {} messages instead of 3",
        messages.len()
    );
    for packet in messages.iter().filter(|msg| msg.is_signed_packet() || msg.is_tagged_packet()) {
        ensure!(
            packet.public_payload() == Some(PUBLIC_PAYLOAD.as_bytes())
                && packet.masked_payload() == Some(MASKED_PAYLOAD.as_bytes()),
            "payloads of the packet at {} do not match",
            packet.address()
        );
    }
    info!(messages = messages.len(), "subscriber A read the keyload and both packets");
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(full: bool, single_branch: bool) -> Config {
        Config {
            seed: Some("AUTHOR9SEED".to_string()),
            payload_length: 1024,
            single_branch,
            full,
            verbose: false,
        }
    }

    #[test]
    fn seeds_are_drawn_from_the_tryte_alphabet() {
        let seed = new_seed();
        assert_eq!(seed.len(), SEED_LENGTH);
        assert!(seed.bytes().all(|c| SEED_ALPHABET.contains(&c)));
    }

    #[tokio::test]
    async fn subscription_flow_reads_nothing_else() {
        let messages = run(&config(false, false)).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn full_flow_delivers_every_packet() {
        for single_branch in [false, true] {
            let messages = run(&config(true, single_branch)).await.unwrap();
            assert!(messages[0].is_keyload());
            assert!(messages[1].is_tagged_packet());
            assert!(messages[2].is_signed_packet());
        }
    }

    #[tokio::test]
    async fn packets_over_the_payload_limit_fail_the_run() {
        let config = Config {
            payload_length: 8,
            ..config(true, false)
        };
        let error = run(&config).await.unwrap_err();
        assert!(error.to_string().contains("tagged packet"));
    }
}
