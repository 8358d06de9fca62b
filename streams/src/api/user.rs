// Rust
use alloc::{
    borrow::ToOwned,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::{Debug, Formatter, Result as FormatResult};

// 3rd-party
use futures::{future, TryStreamExt};
use hashbrown::{HashMap, HashSet};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, warn};

// Streams
use lets::{
    address::{Address, AppAddr, MsgId},
    error::Error as LetsError,
    id::{Ed25519, Identifier, Identity, Permissioned, Psk, PskId},
    message::{
        ContentSizeof, ContentUnwrap, ContentWrap, Message as LetsMessage, PreparsedMessage, TransportMessage, HDF,
        PCF,
    },
    transport::Transport,
};
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Commit, Mask, Squeeze},
        io,
        modifiers::External,
        types::{Mac, Maybe, NBytes, Size, Uint8},
    },
    error::{Error as SpongosError, Result as SpongosResult},
    KeccakF1600, Spongos, SpongosRng,
};

// Local
use crate::{
    api::{
        cursor_store::CursorStore, message::Message, messages::Messages, send_response::SendResponse,
        user_builder::UserBuilder,
    },
    error::{Error, Result},
    message::{
        announcement, keyload, message_types, packet, subscription, unsubscription,
    },
};

/// Sequence number of the first message of every publisher: the announcement of the author and
/// the subscription of each subscriber
const INIT_MESSAGE_NUM: usize = 0;
/// The author derives a single application address per identity
const CHANNEL_IDX: u64 = 0;
/// Length of the MAC that authenticates a backup
const BACKUP_MAC_SIZE: usize = 32;

/// Default limit, in bytes, of the public plus masked payloads of a packet
pub const DEFAULT_PAYLOAD_LENGTH: usize = 32_000;

#[derive(PartialEq, Eq, Default)]
struct State {
    /// Users' Identity information, contains keys and logic for signing and verification
    user_id: Option<Identity>,

    /// Address of the stream announcement message
    stream_address: Option<Address>,

    /// Identifier of the author of the stream
    author_identifier: Option<Identifier>,

    /// Whether any known message can be linked, or only the latest one
    multi_branching: bool,

    /// Maximum length of the payloads of a packet
    payload_length: usize,

    /// Latest message sent or read, the only valid link of a single-branch stream
    latest_link: Option<MsgId>,

    /// Mapping of message links to spongos states. Messages are linked to one another by joining
    /// the spongos state of the message they link to
    spongos_store: HashMap<MsgId, Spongos>,

    /// Permission and sequence number of every known publisher
    cursor_store: CursorStore,

    /// Pre-shared keys known by the user, indexed by their id
    psk_store: HashMap<PskId, Psk>,

    /// Subscribers known by the author
    subscribers: HashSet<Identifier>,
}

/// Participant of a channel: the author that creates it, or a subscriber that reads (and maybe
/// writes) it. Publishing and reading goes through the transport `T`.
pub struct User<T> {
    transport: T,
    state: State,
}

impl User<()> {
    pub fn builder() -> UserBuilder<()> {
        UserBuilder::new()
    }
}

impl<T> User<T> {
    pub(crate) fn new<Psks>(user_id: Option<Identity>, psks: Psks, transport: T, payload_length: usize) -> Self
    where
        Psks: IntoIterator<Item = (PskId, Psk)>,
    {
        Self {
            transport,
            state: State {
                user_id,
                payload_length,
                psk_store: psks.into_iter().collect(),
                ..Default::default()
            },
        }
    }

    /// Returns a reference to the [`Identifier`] of the user, if it has an identity
    pub fn identifier(&self) -> Option<&Identifier> {
        self.state.user_id.as_ref().map(Identity::identifier)
    }

    /// Address of the announcement of the stream the user is attached to
    pub fn stream_address(&self) -> Option<Address> {
        self.state.stream_address
    }

    /// Address the announcement of a stream created by this user is published at. Known before
    /// the stream is created, as it only depends on the identity of the user.
    pub fn announcement_address(&self) -> Result<Address> {
        let identifier = self.identifier().ok_or(Error::NoIdentity("derive a stream address"))?;
        let appaddr = AppAddr::gen(identifier, CHANNEL_IDX);
        Ok(Address::new(appaddr, MsgId::gen(appaddr, identifier, INIT_MESSAGE_NUM)))
    }

    pub fn author_identifier(&self) -> Option<&Identifier> {
        self.state.author_identifier.as_ref()
    }

    pub fn is_multi_branching(&self) -> bool {
        self.state.multi_branching
    }

    pub fn payload_length(&self) -> usize {
        self.state.payload_length
    }

    /// Latest message sent or read by the user
    pub fn latest_link(&self) -> Option<MsgId> {
        self.state.latest_link
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn cursors(&self) -> impl Iterator<Item = (&Permissioned<Identifier>, usize)> + Clone + '_ {
        self.state.cursor_store.cursors()
    }

    /// Returns the cursor of a publisher: the sequence number of its last known message
    pub fn cursor(&self, id: &Identifier) -> Option<usize> {
        self.state.cursor_store.get_cursor(id)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = &Identifier> + Clone + '_ {
        self.state.subscribers.iter()
    }

    /// Adds a subscriber without waiting for its subscription message. Returns false if it was
    /// already known.
    pub fn add_subscriber(&mut self, subscriber: Identifier) -> bool {
        if self.state.cursor_store.get_permission(&subscriber).is_none() {
            self.state
                .cursor_store
                .insert_cursor(Permissioned::Read(subscriber.clone()), INIT_MESSAGE_NUM);
        }
        self.state.subscribers.insert(subscriber)
    }

    /// Removes a subscriber and forgets its cursor. Returns false if it was not known.
    pub fn remove_subscriber(&mut self, id: &Identifier) -> bool {
        self.state.cursor_store.remove(id);
        self.state.subscribers.remove(id)
    }

    /// Stores a pre-shared key. Returns false if it was already known.
    pub fn add_psk(&mut self, psk: Psk) -> bool {
        self.state.psk_store.insert(psk.to_pskid(), psk).is_none()
    }

    pub fn remove_psk(&mut self, pskid: PskId) -> bool {
        self.state.psk_store.remove(&pskid).is_some()
    }

    /// Sets the permission of an identifier, keeping its cursor if it was already known
    fn store_permission(&mut self, permission: Permissioned<Identifier>) {
        let cursor = self
            .state
            .cursor_store
            .get_cursor(permission.identifier())
            .unwrap_or(INIT_MESSAGE_NUM);
        self.state.cursor_store.insert_cursor(permission, cursor);
    }

    /// Moves the cursor of `publisher` to `sequence`, registering it with `permission` if unknown
    fn advance_cursor(&mut self, publisher: &Identifier, sequence: usize, permission: fn(Identifier) -> Permissioned<Identifier>) {
        if !self.state.cursor_store.advance_cursor(publisher, sequence) {
            self.state
                .cursor_store
                .insert_cursor(permission(publisher.clone()), sequence);
        }
    }

    /// Sequence number of the next message published by `publisher`
    fn next_sequence(&self, publisher: &Identifier) -> usize {
        self.state
            .cursor_store
            .get_cursor(publisher)
            .map_or(INIT_MESSAGE_NUM + 1, |cursor| cursor + 1)
    }

    /// Spongos state of the message a new message links to
    fn linked_spongos(&self, link_to: MsgId) -> Result<Spongos> {
        if !self.state.multi_branching && self.state.latest_link != Some(link_to) {
            return Err(Error::InvalidLink(
                link_to,
                "messages of a single-branch stream must link to the latest message",
            ));
        }
        self.state
            .spongos_store
            .get(&link_to)
            .copied()
            .ok_or(Error::InvalidLink(link_to, "the message is unknown to the user"))
    }

    fn check_payload_length(&self, public_payload: &[u8], masked_payload: &[u8]) -> Result<()> {
        let length = public_payload.len() + masked_payload.len();
        if length > self.state.payload_length {
            return Err(Error::PayloadTooLarge(length, self.state.payload_length));
        }
        Ok(())
    }

    /// Routes a message to the handler of its type
    ///
    /// Messages linked to a message unknown to the user are returned as
    /// [`MessageContent::Orphan`](crate::MessageContent::Orphan), keyloads that include
    /// neither the user nor any of its PSKs as
    /// [`MessageContent::Unreadable`](crate::MessageContent::Unreadable).
    pub fn handle_message(&mut self, address: Address, msg: TransportMessage) -> Result<Message> {
        let preparsed: PreparsedMessage = msg
            .parse_header()
            .map_err(|e| Error::Unwrapping("header", address, e))?;
        let message_type = preparsed.message_type();
        debug!(
            %address,
            message_type = message_types::name(message_type),
            publisher = %preparsed.header().publisher(),
            "handling message"
        );
        if message_type != message_types::ANNOUNCEMENT && self.state.stream_address.is_none() {
            return Err(Error::NoStream("read messages"));
        }

        match message_type {
            message_types::ANNOUNCEMENT => self.handle_announcement(address, preparsed),
            message_types::SUBSCRIPTION => self.handle_subscription(address, preparsed),
            message_types::UNSUBSCRIPTION => self.handle_unsubscription(address, preparsed),
            message_types::KEYLOAD => self.handle_keyload(address, preparsed),
            message_types::SIGNED_PACKET => self.handle_packet(address, preparsed, true),
            message_types::TAGGED_PACKET => self.handle_packet(address, preparsed, false),
            unknown => Err(Error::MessageTypeUnknown(unknown)),
        }
    }

    fn handle_announcement(&mut self, address: Address, preparsed: PreparsedMessage) -> Result<Message> {
        if let Some(stream_address) = self.state.stream_address {
            if stream_address != address {
                return Err(Error::StreamAlreadyAttached(stream_address));
            }
        }

        let (message, spongos) = preparsed
            .unwrap(announcement::Unwrap::default())
            .map_err(|e| Error::Unwrapping("announcement", address, e))?;
        let message = Message::from_lets_message(address, message);
        let (author_identifier, multi_branching) = match message.as_announcement() {
            Some(announcement) => (announcement.author_identifier.clone(), announcement.multi_branching),
            None => return Err(Error::MessageTypeUnknown(message_types::ANNOUNCEMENT)),
        };
        if message.publisher() != &author_identifier {
            return Err(Error::Unauthorized("the stream author", "announce the stream"));
        }

        self.state.spongos_store.insert(address.relative(), spongos);
        self.advance_cursor(&author_identifier, INIT_MESSAGE_NUM, Permissioned::ReadWrite);
        self.state.stream_address = Some(address);
        self.state.author_identifier = Some(author_identifier);
        self.state.multi_branching = multi_branching;
        if self.state.latest_link.is_none() {
            self.state.latest_link = Some(address.relative());
        }
        Ok(message)
    }

    fn handle_subscription(&mut self, address: Address, preparsed: PreparsedMessage) -> Result<Message> {
        let user_id = self
            .state
            .user_id
            .as_ref()
            .ok_or(Error::NoIdentity("read subscriptions"))?;
        if self.state.author_identifier.as_ref() != Some(user_id.identifier()) {
            return Err(Error::Unauthorized("the stream author", "read subscriptions"));
        }
        let linked_msg_address = preparsed
            .header()
            .linked_msg_address()
            .ok_or(Error::NotLinked("subscription", address))?;
        let mut linked_spongos = match self.state.spongos_store.get(&linked_msg_address).copied() {
            Some(spongos) => spongos,
            None => return Ok(Message::orphan(address, preparsed)),
        };

        let subscription = subscription::Unwrap::new(&mut linked_spongos, user_id);
        let (message, spongos) = preparsed
            .unwrap(subscription)
            .map_err(|e| Error::Unwrapping("subscription", address, e))?;
        let message = Message::from_lets_message(address, message);
        let subscriber = match message.as_subscription() {
            Some(subscription) => subscription.subscriber_identifier().clone(),
            None => return Err(Error::MessageTypeUnknown(message_types::SUBSCRIPTION)),
        };
        if message.publisher() != &subscriber {
            return Err(Error::Unauthorized("the subscriber itself", "subscribe"));
        }

        // Unsubscriptions link to the subscription
        self.state.spongos_store.insert(address.relative(), spongos);
        debug!(%subscriber, "new subscriber");
        self.add_subscriber(subscriber);
        Ok(message)
    }

    fn handle_unsubscription(&mut self, address: Address, preparsed: PreparsedMessage) -> Result<Message> {
        let linked_msg_address = preparsed
            .header()
            .linked_msg_address()
            .ok_or(Error::NotLinked("unsubscription", address))?;
        let publisher = preparsed.header().publisher().clone();
        let sequence = preparsed.header().sequence();
        let mut linked_spongos = match self.state.spongos_store.get(&linked_msg_address).copied() {
            Some(spongos) => spongos,
            None => {
                // Only the author knows the subscription it links to
                debug!(%address, linked = %linked_msg_address, "orphan unsubscription");
                self.advance_cursor(&publisher, sequence, Permissioned::Read);
                return Ok(Message::orphan(address, preparsed));
            }
        };

        let (message, _) = preparsed
            .unwrap(unsubscription::Unwrap::new(&mut linked_spongos))
            .map_err(|e| Error::Unwrapping("unsubscription", address, e))?;
        let message = Message::from_lets_message(address, message);
        if let Some(unsubscription) = message.as_unsubscription() {
            let subscriber = unsubscription.subscriber_identifier.clone();
            if message.publisher() != &subscriber {
                return Err(Error::Unauthorized("the subscriber itself", "unsubscribe"));
            }
            debug!(%subscriber, "subscriber left");
            // Drops the cursor too, so the subscriber is no longer polled
            self.remove_subscriber(&subscriber);
        }
        Ok(message)
    }

    fn handle_keyload(&mut self, address: Address, preparsed: PreparsedMessage) -> Result<Message> {
        let author_identifier = self
            .state
            .author_identifier
            .clone()
            .ok_or(Error::NoStream("read keyloads"))?;
        if preparsed.header().publisher() != &author_identifier {
            return Err(Error::Unauthorized("the stream author", "send keyloads"));
        }
        let sequence = preparsed.header().sequence();
        let linked_msg_address = preparsed
            .header()
            .linked_msg_address()
            .ok_or(Error::NotLinked("keyload", address))?;
        let mut linked_spongos = match self.state.spongos_store.get(&linked_msg_address).copied() {
            Some(spongos) => spongos,
            None => {
                warn!(%address, linked = %linked_msg_address, "orphan keyload");
                self.advance_cursor(&author_identifier, sequence, Permissioned::ReadWrite);
                return Ok(Message::orphan(address, preparsed));
            }
        };

        let keyload = keyload::Unwrap::new(
            &mut linked_spongos,
            self.state.user_id.as_ref(),
            &author_identifier,
            &self.state.psk_store,
        );
        let (message, spongos) = preparsed
            .unwrap(keyload)
            .map_err(|e| Error::Unwrapping("keyload", address, e))?;

        if !message.payload().content().is_readable() {
            let (header, payload) = message.into_parts();
            let message = Message::unreadable(address, header, payload.into_content());
            warn!(%address, "keyload does not include the user");
            self.advance_cursor(&author_identifier, sequence, Permissioned::ReadWrite);
            return Ok(message);
        }

        let message = Message::from_lets_message(address, message);
        let permissions = message
            .as_keyload()
            .map(|keyload| keyload.subscribers.clone())
            .unwrap_or_default();
        for permission in permissions {
            if permission.identifier() != &author_identifier {
                self.store_permission(permission);
            }
        }
        self.state.spongos_store.insert(address.relative(), spongos);
        self.advance_cursor(&author_identifier, sequence, Permissioned::ReadWrite);
        self.state.latest_link = Some(address.relative());
        Ok(message)
    }

    /// Reads a signed or tagged packet. A signed packet must be signed by the publisher named in
    /// its header.
    fn handle_packet(&mut self, address: Address, preparsed: PreparsedMessage, signed: bool) -> Result<Message> {
        let kind = if signed { "signed packet" } else { "tagged packet" };
        let publisher = preparsed.header().publisher().clone();
        let sequence = preparsed.header().sequence();
        let linked_msg_address = preparsed
            .header()
            .linked_msg_address()
            .ok_or(Error::NotLinked(kind, address))?;
        let mut linked_spongos = match self.state.spongos_store.get(&linked_msg_address).copied() {
            Some(spongos) => spongos,
            None => {
                warn!(%address, linked = %linked_msg_address, "orphan {}", kind);
                self.advance_cursor(&publisher, sequence, Permissioned::ReadWrite);
                return Ok(Message::orphan(address, preparsed));
            }
        };

        let packet = if signed {
            packet::Unwrap::signed(&mut linked_spongos, &publisher)
        } else {
            packet::Unwrap::tagged(&mut linked_spongos)
        };
        let (message, spongos) = preparsed
            .unwrap(packet)
            .map_err(|e| Error::Unwrapping(kind, address, e))?;
        let message = Message::from_lets_message(address, message);

        self.state.spongos_store.insert(address.relative(), spongos);
        self.advance_cursor(&publisher, sequence, Permissioned::ReadWrite);
        self.state.latest_link = Some(address.relative());
        Ok(message)
    }

    /// Serializes the state of the user, masked with a key derived from `pwd`
    ///
    /// The transport is not part of the backup: it is given back on [`User::restore()`].
    pub fn backup<P>(&mut self, pwd: P) -> Result<Vec<u8>>
    where
        P: AsRef<[u8]>,
    {
        let mut ctx = sizeof::Context::new();
        ctx.sizeof(&self.state)?;
        let buf_size = ctx.finalize() + BACKUP_MAC_SIZE;

        let mut buf = vec![0; buf_size];
        let mut ctx = wrap::Context::<_, KeccakF1600>::new(&mut buf[..]);
        ctx.absorb(External::new(&NBytes::new(backup_key(pwd))))?
            .commit()?
            .squeeze(&Mac::new(BACKUP_MAC_SIZE))?;
        ctx.wrap(&mut self.state)?;
        debug!(size = buf_size, "user state backed up");
        Ok(buf)
    }

    /// Restores a user from a backup made with [`User::backup()`] and the same password
    ///
    /// A wrong password, or a backup with bytes left over, is reported as [`Error::Backup`].
    pub fn restore<B, P>(backup: B, pwd: P, transport: T) -> Result<Self>
    where
        B: AsRef<[u8]>,
        P: AsRef<[u8]>,
    {
        let mut ctx = unwrap::Context::<_, KeccakF1600>::new(backup.as_ref());
        ctx.absorb(External::new(&NBytes::new(backup_key(pwd))))
            .and_then(|ctx| ctx.commit())
            .and_then(|ctx| ctx.squeeze(&Mac::new(BACKUP_MAC_SIZE)))
            .map_err(Error::Backup)?;
        let mut state = State::default();
        ctx.unwrap(&mut state).map_err(Error::Backup)?;
        match ctx.stream().len() {
            0 => Ok(User { transport, state }),
            unread => Err(Error::Backup(SpongosError::InputStreamNotFullyConsumed(unread))),
        }
    }
}

impl<T, TSR> User<T>
where
    T: for<'a> Transport<'a, Msg = TransportMessage, SendResponse = TSR>,
{
    /// Fetches the message at `address` and handles it
    pub async fn receive_message(&mut self, address: Address) -> Result<Message> {
        let msg = self.transport.recv_message(address).await?;
        self.handle_message(address, msg)
    }

    /// Returns a [`Messages`] stream over the messages not yet read by the user
    pub fn messages(&mut self) -> Messages<T> {
        Messages::new(self)
    }

    /// Iteratively fetches and handles the next messages of every publisher until there is
    /// nothing new. Returns the number of messages read.
    pub async fn sync(&mut self) -> Result<usize> {
        self.messages().try_fold(0, |n, _| future::ok(n + 1)).await
    }

    /// Like [`User::sync()`], collecting the messages read
    pub async fn fetch_next_messages(&mut self) -> Result<Vec<Message>> {
        self.messages().try_collect().await
    }

    /// Fails if something was already published at `address`, or if the transport cannot tell
    async fn ensure_address_free(&mut self, address: Address) -> Result<()> {
        match self.transport.recv_messages(address).await {
            Ok(msgs) if !msgs.is_empty() => Err(Error::AddressUsed(address)),
            Ok(_) | Err(LetsError::MessageMissing(..)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates a new stream, publishing its announcement
    ///
    /// # Arguments
    /// * `multi_branching`: whether messages can link to any known message of the stream, or only
    ///   to the latest one
    pub async fn create_stream(&mut self, multi_branching: bool) -> Result<SendResponse<TSR>> {
        if let Some(stream_address) = self.state.stream_address {
            return Err(Error::StreamAlreadyAttached(stream_address));
        }
        let stream_address = self.announcement_address()?;
        self.ensure_address_free(stream_address).await?;

        let user_id = self
            .state
            .user_id
            .as_ref()
            .ok_or(Error::NoIdentity("create a stream"))?;
        let identifier = user_id.identifier().clone();
        let content = PCF::new_final_frame().with_content(announcement::Wrap::new(user_id, multi_branching));
        let header = HDF::new(message_types::ANNOUNCEMENT, INIT_MESSAGE_NUM, identifier.clone())
            .map_err(|e| Error::Wrapping("announcement", stream_address, e))?;
        let (transport_msg, spongos): (_, Spongos) = LetsMessage::new(header, content)
            .wrap()
            .map_err(|e| Error::Wrapping("announcement", stream_address, e))?;

        let send_response = self.transport.send_message(stream_address, transport_msg).await?;
        debug!(address = %stream_address, multi_branching, "stream created");

        self.state.stream_address = Some(stream_address);
        self.state.author_identifier = Some(identifier.clone());
        self.state.multi_branching = multi_branching;
        self.state.spongos_store.insert(stream_address.relative(), spongos);
        self.state
            .cursor_store
            .insert_cursor(Permissioned::ReadWrite(identifier), INIT_MESSAGE_NUM);
        self.state.latest_link = Some(stream_address.relative());
        Ok(SendResponse::new(stream_address, send_response))
    }

    /// Subscribes to the stream, linking the subscription to its announcement
    ///
    /// The subscription can only be read by the author, who has to receive it before including
    /// the subscriber in a keyload.
    pub async fn subscribe(&mut self) -> Result<SendResponse<TSR>> {
        let stream_address = self.state.stream_address.ok_or(Error::NoStream("subscribe"))?;
        let author_identifier = self
            .state
            .author_identifier
            .clone()
            .ok_or(Error::NoStream("subscribe"))?;
        let identifier = self
            .identifier()
            .cloned()
            .ok_or(Error::NoIdentity("subscribe"))?;
        let link_to = stream_address.relative();
        let mut linked_spongos = self
            .state
            .spongos_store
            .get(&link_to)
            .copied()
            .ok_or(Error::InvalidLink(link_to, "the announcement has not been read"))?;
        let rel_address = MsgId::gen(stream_address.base(), &identifier, INIT_MESSAGE_NUM);
        let address = Address::new(stream_address.base(), rel_address);
        self.ensure_address_free(address).await?;

        let unsubscribe_key: [u8; subscription::UNSUBSCRIBE_KEY_SIZE] = StdRng::from_entropy().gen();
        let user_id = self.state.user_id.as_ref().ok_or(Error::NoIdentity("subscribe"))?;
        let content = PCF::new_final_frame().with_content(subscription::Wrap::new(
            &mut linked_spongos,
            unsubscribe_key,
            user_id,
            &author_identifier,
        ));
        let header = HDF::new(message_types::SUBSCRIPTION, INIT_MESSAGE_NUM, identifier)
            .map_err(|e| Error::Wrapping("subscription", address, e))?
            .with_linked_msg_address(link_to);
        let (transport_msg, spongos): (_, Spongos) = LetsMessage::new(header, content)
            .wrap()
            .map_err(|e| Error::Wrapping("subscription", address, e))?;

        let send_response = self.transport.send_message(address, transport_msg).await?;
        debug!(%address, "subscription sent");
        self.state.spongos_store.insert(rel_address, spongos);
        Ok(SendResponse::new(address, send_response))
    }

    /// Leaves the stream, linking the unsubscription to the subscription of the user
    pub async fn unsubscribe(&mut self) -> Result<SendResponse<TSR>> {
        let stream_address = self.state.stream_address.ok_or(Error::NoStream("unsubscribe"))?;
        let identifier = self
            .identifier()
            .cloned()
            .ok_or(Error::NoIdentity("unsubscribe"))?;
        let link_to = MsgId::gen(stream_address.base(), &identifier, INIT_MESSAGE_NUM);
        let mut linked_spongos = self
            .state
            .spongos_store
            .get(&link_to)
            .copied()
            .ok_or(Error::InvalidLink(link_to, "the user has not subscribed"))?;
        let sequence = self.next_sequence(&identifier);
        let rel_address = MsgId::gen(stream_address.base(), &identifier, sequence);
        let address = Address::new(stream_address.base(), rel_address);
        self.ensure_address_free(address).await?;

        let user_id = self.state.user_id.as_ref().ok_or(Error::NoIdentity("unsubscribe"))?;
        let content =
            PCF::new_final_frame().with_content(unsubscription::Wrap::new(&mut linked_spongos, user_id));
        let header = HDF::new(message_types::UNSUBSCRIPTION, sequence, identifier.clone())
            .map_err(|e| Error::Wrapping("unsubscription", address, e))?
            .with_linked_msg_address(link_to);
        let (transport_msg, _): (_, Spongos) = LetsMessage::new(header, content)
            .wrap()
            .map_err(|e| Error::Wrapping("unsubscription", address, e))?;

        let send_response = self.transport.send_message(address, transport_msg).await?;
        debug!(%address, "unsubscription sent");
        self.state.cursor_store.advance_cursor(&identifier, sequence);
        Ok(SendResponse::new(address, send_response))
    }

    /// Publishes a keyload for the given subscribers and pre-shared keys
    ///
    /// Subscribers must be known (see [`User::add_subscriber()`]) and PSKs stored
    /// (see [`User::add_psk()`]).
    pub async fn send_keyload<Subscribers, Psks>(
        &mut self,
        link_to: MsgId,
        subscribers: Subscribers,
        psk_ids: Psks,
    ) -> Result<SendResponse<TSR>>
    where
        Subscribers: IntoIterator<Item = Permissioned<Identifier>>,
        Psks: IntoIterator<Item = PskId>,
    {
        let subscribers = subscribers
            .into_iter()
            .map(|subscriber| {
                if self.state.subscribers.contains(subscriber.identifier()) {
                    Ok(subscriber)
                } else {
                    Err(Error::UnknownSubscriber(subscriber.into_identifier()))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let psks = psk_ids
            .into_iter()
            .map(|pskid| {
                self.state
                    .psk_store
                    .get(&pskid)
                    .map(|psk| (pskid, *psk))
                    .ok_or(Error::UnknownPsk(pskid))
            })
            .collect::<Result<Vec<_>>>()?;
        self.publish_keyload(link_to, subscribers, psks).await
    }

    /// Publishes a keyload for every subscriber, with read permission, and every stored PSK
    pub async fn send_keyload_for_all(&mut self, link_to: MsgId) -> Result<SendResponse<TSR>> {
        let subscribers = self.state.subscribers.iter().cloned().map(Permissioned::Read).collect();
        let psks = self.state.psk_store.iter().map(|(pskid, psk)| (*pskid, *psk)).collect();
        self.publish_keyload(link_to, subscribers, psks).await
    }

    /// Publishes a keyload for every subscriber, with read and write permission, and every stored
    /// PSK
    pub async fn send_keyload_for_all_rw(&mut self, link_to: MsgId) -> Result<SendResponse<TSR>> {
        let subscribers = self
            .state
            .subscribers
            .iter()
            .cloned()
            .map(Permissioned::ReadWrite)
            .collect();
        let psks = self.state.psk_store.iter().map(|(pskid, psk)| (*pskid, *psk)).collect();
        self.publish_keyload(link_to, subscribers, psks).await
    }

    async fn publish_keyload(
        &mut self,
        link_to: MsgId,
        subscribers: Vec<Permissioned<Identifier>>,
        psks: Vec<(PskId, Psk)>,
    ) -> Result<SendResponse<TSR>> {
        let stream_address = self.state.stream_address.ok_or(Error::NoStream("send a keyload"))?;
        let identifier = self
            .identifier()
            .cloned()
            .ok_or(Error::NoIdentity("send a keyload"))?;
        if self.state.author_identifier.as_ref() != Some(&identifier) {
            return Err(Error::Unauthorized("the stream author", "send keyloads"));
        }
        let mut linked_spongos = self.linked_spongos(link_to)?;
        let sequence = self.next_sequence(&identifier);
        let rel_address = MsgId::gen(stream_address.base(), &identifier, sequence);
        let address = Address::new(stream_address.base(), rel_address);
        self.ensure_address_free(address).await?;

        let mut rng = StdRng::from_entropy();
        let key: [u8; keyload::KEY_SIZE] = rng.gen();
        let nonce: [u8; keyload::NONCE_SIZE] = rng.gen();
        let subscriber_ids: Vec<Permissioned<&Identifier>> = subscribers.iter().map(Permissioned::as_ref).collect();
        let user_id = self
            .state
            .user_id
            .as_ref()
            .ok_or(Error::NoIdentity("send a keyload"))?;
        let content = PCF::new_final_frame().with_content(keyload::Wrap::new(
            &mut linked_spongos,
            &subscriber_ids,
            &psks,
            key,
            nonce,
            user_id,
        ));
        let header = HDF::new(message_types::KEYLOAD, sequence, identifier.clone())
            .map_err(|e| Error::Wrapping("keyload", address, e))?
            .with_linked_msg_address(link_to);
        let (transport_msg, spongos): (_, Spongos) = LetsMessage::new(header, content)
            .wrap()
            .map_err(|e| Error::Wrapping("keyload", address, e))?;

        let send_response = self.transport.send_message(address, transport_msg).await?;
        debug!(
            %address,
            subscribers = subscribers.len(),
            psks = psks.len(),
            "keyload sent"
        );
        for subscriber in subscribers {
            if subscriber.identifier() != &identifier {
                self.store_permission(subscriber);
            }
        }
        self.state.spongos_store.insert(rel_address, spongos);
        self.state.cursor_store.advance_cursor(&identifier, sequence);
        self.state.latest_link = Some(rel_address);
        Ok(SendResponse::new(address, send_response))
    }

    /// Publishes a packet signed by the user. The masked payload can only be read by the readers
    /// of the keyload the packet descends from.
    pub async fn send_signed_packet<P, M>(
        &mut self,
        link_to: MsgId,
        public_payload: P,
        masked_payload: M,
    ) -> Result<SendResponse<TSR>>
    where
        P: AsRef<[u8]>,
        M: AsRef<[u8]>,
    {
        self.send_packet(link_to, public_payload.as_ref(), masked_payload.as_ref(), true)
            .await
    }

    /// Publishes a packet authenticated with a MAC only
    pub async fn send_tagged_packet<P, M>(
        &mut self,
        link_to: MsgId,
        public_payload: P,
        masked_payload: M,
    ) -> Result<SendResponse<TSR>>
    where
        P: AsRef<[u8]>,
        M: AsRef<[u8]>,
    {
        self.send_packet(link_to, public_payload.as_ref(), masked_payload.as_ref(), false)
            .await
    }

    async fn send_packet(
        &mut self,
        link_to: MsgId,
        public_payload: &[u8],
        masked_payload: &[u8],
        signed: bool,
    ) -> Result<SendResponse<TSR>> {
        let (kind, message_type) = if signed {
            ("signed packet", message_types::SIGNED_PACKET)
        } else {
            ("tagged packet", message_types::TAGGED_PACKET)
        };
        let stream_address = self.state.stream_address.ok_or(Error::NoStream("send a packet"))?;
        let identifier = self
            .identifier()
            .cloned()
            .ok_or(Error::NoIdentity("send a packet"))?;
        match self.state.cursor_store.get_permission(&identifier) {
            Some(permission) if !permission.is_readonly() => {}
            _ => {
                return Err(Error::Unauthorized(
                    "the author and read-write subscribers",
                    "send packets",
                ))
            }
        }
        self.check_payload_length(public_payload, masked_payload)?;
        let mut linked_spongos = self.linked_spongos(link_to)?;
        let sequence = self.next_sequence(&identifier);
        let address = Address::new(
            stream_address.base(),
            MsgId::gen(stream_address.base(), &identifier, sequence),
        );
        self.ensure_address_free(address).await?;

        let header = HDF::new(message_type, sequence, identifier.clone())
            .map_err(|e| Error::Wrapping(kind, address, e))?
            .with_linked_msg_address(link_to);
        let (transport_msg, spongos): (_, Spongos) = match (signed, self.state.user_id.as_ref()) {
            (true, Some(user_id)) => {
                let content = packet::Wrap::signed(&mut linked_spongos, user_id, public_payload, masked_payload);
                LetsMessage::new(header, PCF::new_final_frame().with_content(content)).wrap()
            }
            (true, None) => return Err(Error::NoIdentity("send a signed packet")),
            (false, _) => {
                let content = packet::Wrap::tagged(&mut linked_spongos, public_payload, masked_payload);
                LetsMessage::new(header, PCF::new_final_frame().with_content(content)).wrap()
            }
        }
        .map_err(|e| Error::Wrapping(kind, address, e))?;

        let send_response = self.transport.send_message(address, transport_msg).await?;
        debug!(%address, link = %link_to, "{} sent", kind);
        self.state.spongos_store.insert(address.relative(), spongos);
        self.state.cursor_store.advance_cursor(&identifier, sequence);
        self.state.latest_link = Some(address.relative());
        Ok(SendResponse::new(address, send_response))
    }
}

/// Key that masks a backup
fn backup_key<P: AsRef<[u8]>>(pwd: P) -> [u8; 32] {
    SpongosRng::<KeccakF1600>::new(pwd).gen()
}

impl ContentSizeof<State> for sizeof::Context {
    fn sizeof(&mut self, user_state: &State) -> SpongosResult<&mut Self> {
        self.mask(Uint8::new(user_state.user_id.is_some() as u8))?;
        if let Some(user_id) = &user_state.user_id {
            self.mask(NBytes::new(user_id.ed25519()))?;
        }
        self.mask(Maybe::new(user_state.stream_address.as_ref()))?
            .mask(Maybe::new(user_state.author_identifier.as_ref()))?
            .mask(Uint8::new(user_state.multi_branching as u8))?
            .mask(Size::new(user_state.payload_length))?
            .mask(Maybe::new(user_state.latest_link.as_ref()))?;

        self.mask(Size::new(user_state.spongos_store.len()))?;
        for (msgid, spongos) in &user_state.spongos_store {
            self.mask(msgid)?.mask(spongos)?;
        }

        self.mask(Size::new(user_state.cursor_store.len()))?;
        for (permission, cursor) in user_state.cursor_store.cursors() {
            self.mask(&permission.as_ref())?.mask(Size::new(cursor))?;
        }

        self.mask(Size::new(user_state.psk_store.len()))?;
        for (pskid, psk) in &user_state.psk_store {
            self.mask(pskid)?.mask(psk)?;
        }

        self.mask(Size::new(user_state.subscribers.len()))?;
        for subscriber in &user_state.subscribers {
            self.mask(subscriber)?;
        }
        self.commit()?.squeeze(Mac::new(BACKUP_MAC_SIZE))
    }
}

impl<OS> ContentWrap<State> for wrap::Context<OS>
where
    OS: io::OStream,
{
    fn wrap(&mut self, user_state: &mut State) -> SpongosResult<&mut Self> {
        self.mask(Uint8::new(user_state.user_id.is_some() as u8))?;
        if let Some(user_id) = &user_state.user_id {
            self.mask(NBytes::new(user_id.ed25519()))?;
        }
        self.mask(Maybe::new(user_state.stream_address.as_ref()))?
            .mask(Maybe::new(user_state.author_identifier.as_ref()))?
            .mask(Uint8::new(user_state.multi_branching as u8))?
            .mask(Size::new(user_state.payload_length))?
            .mask(Maybe::new(user_state.latest_link.as_ref()))?;

        self.mask(Size::new(user_state.spongos_store.len()))?;
        for (msgid, spongos) in &user_state.spongos_store {
            self.mask(msgid)?.mask(spongos)?;
        }

        self.mask(Size::new(user_state.cursor_store.len()))?;
        for (permission, cursor) in user_state.cursor_store.cursors() {
            self.mask(&permission.as_ref())?.mask(Size::new(cursor))?;
        }

        self.mask(Size::new(user_state.psk_store.len()))?;
        for (pskid, psk) in &user_state.psk_store {
            self.mask(pskid)?.mask(psk)?;
        }

        self.mask(Size::new(user_state.subscribers.len()))?;
        for subscriber in &user_state.subscribers {
            self.mask(subscriber)?;
        }
        self.commit()?.squeeze(&Mac::new(BACKUP_MAC_SIZE))
    }
}

impl<IS> ContentUnwrap<State> for unwrap::Context<IS>
where
    IS: io::IStream,
{
    fn unwrap(&mut self, user_state: &mut State) -> SpongosResult<&mut Self> {
        let mut has_identity = Uint8::default();
        self.mask(&mut has_identity)?;
        match has_identity.inner() {
            0 => user_state.user_id = None,
            1 => {
                let mut secret = [0u8; 32];
                self.mask(NBytes::new(&mut secret))?;
                user_state.user_id = Some(Identity::new(Ed25519::from_bytes(secret)));
            }
            o => return Err(SpongosError::InvalidOption("identity", o)),
        }
        let mut multi_branching = Uint8::default();
        let mut payload_length = Size::default();
        self.mask(Maybe::new(&mut user_state.stream_address))?
            .mask(Maybe::new(&mut user_state.author_identifier))?
            .mask(&mut multi_branching)?
            .mask(&mut payload_length)?
            .mask(Maybe::new(&mut user_state.latest_link))?;
        user_state.multi_branching = match multi_branching.inner() {
            0 => false,
            1 => true,
            o => return Err(SpongosError::InvalidOption("multi branching", o)),
        };
        user_state.payload_length = payload_length.inner();

        let mut amount_spongos = Size::default();
        self.mask(&mut amount_spongos)?;
        for _ in 0..amount_spongos.inner() {
            let mut msgid = MsgId::default();
            let mut spongos = Spongos::default();
            self.mask(&mut msgid)?.mask(&mut spongos)?;
            user_state.spongos_store.insert(msgid, spongos);
        }

        let mut amount_cursors = Size::default();
        self.mask(&mut amount_cursors)?;
        for _ in 0..amount_cursors.inner() {
            let mut permission = Permissioned::default();
            let mut cursor = Size::default();
            self.mask(&mut permission)?.mask(&mut cursor)?;
            user_state.cursor_store.insert_cursor(permission, cursor.inner());
        }

        let mut amount_psks = Size::default();
        self.mask(&mut amount_psks)?;
        for _ in 0..amount_psks.inner() {
            let mut pskid = PskId::default();
            let mut psk = Psk::default();
            self.mask(&mut pskid)?.mask(&mut psk)?;
            user_state.psk_store.insert(pskid, psk);
        }

        let mut amount_subscribers = Size::default();
        self.mask(&mut amount_subscribers)?;
        for _ in 0..amount_subscribers.inner() {
            let mut subscriber = Identifier::default();
            self.mask(&mut subscriber)?;
            user_state.subscribers.insert(subscriber);
        }
        self.commit()?.squeeze(&Mac::new(BACKUP_MAC_SIZE))
    }
}

impl<T> PartialEq for User<T> {
    /// Users are equal when their states are, regardless of their transports
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl<T> Debug for User<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(
            f,
            "\n* identifier: <{}>\n* stream address: {}\n* multi branching: {}\n{:?}\n* PSKs: \n{}\n* messages:\n{}\n",
            self.identifier().map(ToOwned::to_owned).unwrap_or_default(),
            self.state
                .stream_address
                .map(|address| address.to_string())
                .unwrap_or_default(),
            self.state.multi_branching,
            self.state.cursor_store,
            self.state
                .psk_store
                .keys()
                .map(|pskid| format!("\t<{}>\n", pskid))
                .collect::<String>(),
            self.state
                .spongos_store
                .keys()
                .map(|key| format!("\t<{}>\n", key))
                .collect::<String>()
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, vec::Vec};

    use async_trait::async_trait;

    use lets::{
        address::Address,
        error::{Error as LetsError, Result as LetsResult},
        id::Ed25519,
        message::TransportMessage,
        transport::Transport,
    };
    use spongos::{
        ddml::{
            commands::{wrap, Absorb, Commit, Mask, Squeeze},
            modifiers::External,
            types::{Mac, NBytes, Uint8},
        },
        error::Error as SpongosError,
        KeccakF1600,
    };

    use super::{backup_key, User, BACKUP_MAC_SIZE};
    use crate::error::{Error, Result};

    /// Backup whose masked state starts with `identity_flag`
    fn backup_with_identity_flag(pwd: &str, identity_flag: u8) -> Result<Vec<u8>> {
        let key = NBytes::new(backup_key(pwd));
        let mut buf = vec![0; BACKUP_MAC_SIZE + 1];
        {
            let mut ctx = wrap::Context::<_, KeccakF1600>::new(&mut buf[..]);
            ctx.absorb(External::new(&key))?
                .commit()?
                .squeeze(&Mac::new(BACKUP_MAC_SIZE))?
                .mask(Uint8::new(identity_flag))?;
        }
        Ok(buf)
    }

    #[test]
    fn unknown_identity_flag_is_rejected() -> Result<()> {
        let backup = backup_with_identity_flag("password", 2)?;
        assert!(matches!(
            User::restore(&backup, "password", ()),
            Err(Error::Backup(SpongosError::InvalidOption("identity", 2)))
        ));
        Ok(())
    }

    /// Transport that cannot be reached
    struct Unreachable;

    #[async_trait(?Send)]
    impl<'a> Transport<'a> for Unreachable {
        type Msg = TransportMessage;
        type SendResponse = TransportMessage;

        async fn send_message(&mut self, _: Address, msg: TransportMessage) -> LetsResult<TransportMessage>
        where
            'a: 'async_trait,
        {
            Ok(msg)
        }

        async fn recv_messages(&mut self, _: Address) -> LetsResult<Vec<TransportMessage>>
        where
            'a: 'async_trait,
        {
            Err(LetsError::External(anyhow::anyhow!("node unreachable")))
        }
    }

    #[tokio::test]
    async fn transport_failure_does_not_pass_for_a_free_address() {
        let mut author: User<Unreachable> = User::builder()
            .with_identity(Ed25519::from_seed("author"))
            .with_transport(Unreachable)
            .build();
        assert!(matches!(
            author.create_stream(true).await,
            Err(Error::Transport(LetsError::External(..)))
        ));
        assert_eq!(author.stream_address(), None);
    }
}
