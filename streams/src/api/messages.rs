// Rust
use alloc::{boxed::Box, collections::VecDeque, vec::Vec};
use core::{future::Future, pin::Pin};

// 3rd-party
use futures::{
    task::{Context, Poll},
    Stream, StreamExt,
};
use hashbrown::{HashMap, HashSet};
use tracing::debug;

// Streams
use lets::{
    address::{Address, AppAddr, MsgId},
    id::{Identifier, Permissioned},
    message::TransportMessage,
    transport::Transport,
};

// Local
use crate::{
    api::{
        message::{Message, MessageContent, Orphan},
        user::User,
    },
    error::Result,
};

/// A [`Stream`] over the messages of the channel pending to be fetched from the transport
///
/// Use this stream to traverse the messages of the channel in preorder. It is created with
/// [`User::messages()`]. The main method is [`Messages::next()`], which returns the next message
/// of the channel that the user has not read yet.
///
/// ```
/// use futures::TryStreamExt;
///
/// use streams::{id::Ed25519, transport::bucket, Result, User};
/// # use std::{cell::RefCell, rc::Rc};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let transport = Rc::new(RefCell::new(bucket::Client::new()));
/// let mut author = User::builder()
///     .with_identity(Ed25519::from_seed("cryptographically-secure-random-author-seed"))
///     .with_transport(transport.clone())
///     .build();
/// let mut subscriber = User::builder()
///     .with_identity(Ed25519::from_seed("cryptographically-secure-random-subscriber-seed"))
///     .with_transport(transport)
///     .build();
///
/// let announcement = author.create_stream(true).await?;
/// subscriber.receive_message(announcement.address()).await?;
/// let subscription = subscriber.subscribe().await?;
/// author.receive_message(subscription.address()).await?;
/// let keyload = author.send_keyload_for_all(announcement.link()).await?;
/// author
///     .send_signed_packet(keyload.link(), b"public payload", b"masked payload")
///     .await?;
///
/// let mut n = 0;
/// let mut messages = subscriber.messages();
/// while let Some(msg) = messages.try_next().await? {
///     if msg.is_signed_packet() {
///         assert_eq!(msg.masked_payload(), Some(&b"masked payload"[..]));
///     }
///     n += 1;
/// }
/// assert_eq!(n, 2);
/// # Ok(())
/// # }
/// ```
///
/// # Technical Details
/// Messages are yielded in topological order: a message is never yielded before the message it
/// links to. A message whose linked message has not been read yet is kept in memory until its turn,
/// so several transport calls might be needed before a message is yielded.
///
/// After the last currently available message has been returned, [`Messages::next()`] returns
/// `None`. It is safe to keep polling it afterwards to check for new messages.
///
/// A transport failure is indistinguishable from a missing message. A message that cannot be
/// handled, because of a bad MAC or signature for instance, is skipped for the lifetime of the
/// stream.
pub struct Messages<'a, T>(PinBoxFut<'a, (MessagesState<'a, T>, Option<Result<Message>>)>);

type PinBoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Fetched message not handled yet, identified within its channel
type Fetched = (MsgId, TransportMessage);

struct MessagesState<'a, T> {
    user: &'a mut User<T>,
    /// Publishers still to be polled in the current round, with their cursor
    publishers: Vec<(Permissioned<Identifier>, usize)>,
    /// Orphans, indexed by the message they link to
    orphans: HashMap<MsgId, VecDeque<Fetched>>,
    fetched: VecDeque<Fetched>,
    /// Messages that failed to be handled. Their publisher cursor stays behind them.
    skipped: HashSet<MsgId>,
    round_fetched_any: bool,
}

impl<'a, T> MessagesState<'a, T>
where
    T: for<'b> Transport<'b, Msg = TransportMessage>,
{
    fn new(user: &'a mut User<T>) -> Self {
        Self {
            user,
            publishers: Vec::new(),
            orphans: HashMap::new(),
            fetched: VecDeque::new(),
            skipped: HashSet::new(),
            round_fetched_any: false,
        }
    }

    async fn next(&mut self) -> Option<Result<Message>> {
        loop {
            let base_address = self.user.stream_address()?.base();
            match self.fetched.pop_front() {
                Some((msg_id, binary_msg)) => {
                    if let Some(message) = self.handle(Address::new(base_address, msg_id), binary_msg) {
                        return Some(Ok(message));
                    }
                }
                None => {
                    if !self.fetch(base_address).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Handles a fetched message, holding it back if it is an orphan
    fn handle(&mut self, address: Address, binary_msg: TransportMessage) -> Option<Message> {
        match self.user.handle_message(address, binary_msg) {
            Ok(Message {
                header,
                content: MessageContent::Orphan(Orphan { message, .. }),
                ..
            }) => {
                // The linked message might be fetched later in this same stream
                if let Some(linked_msg_address) = header.linked_msg_address() {
                    self.orphans
                        .entry(linked_msg_address)
                        .or_default()
                        .push_back((address.relative(), message));
                }
                None
            }
            Ok(message) => {
                if let Some(adopted) = self.orphans.remove(&address.relative()) {
                    self.fetched.extend(adopted);
                }
                Some(message)
            }
            Err(e) => {
                debug!(%address, error = %e, "skipping message that could not be handled");
                self.skipped.insert(address.relative());
                None
            }
        }
    }

    /// Fetches the message following the cursor of the next publisher of the round. Returns
    /// `false` once a whole round has found nothing new.
    async fn fetch(&mut self, base_address: AppAddr) -> bool {
        let (publisher, cursor) = match self.publishers.pop() {
            Some(publisher) => publisher,
            None => {
                self.round_fetched_any = false;
                self.publishers = self
                    .user
                    .cursors()
                    .filter(|(publisher, _)| !publisher.is_readonly())
                    .map(|(publisher, cursor)| (publisher.clone(), cursor))
                    .collect();
                match self.publishers.pop() {
                    Some(publisher) => publisher,
                    None => return false,
                }
            }
        };

        let msg_id = MsgId::gen(base_address, publisher.identifier(), cursor + 1);
        let found = if self.skipped.contains(&msg_id) {
            None
        } else {
            // A transport failure ends the polling of this publisher just like a missing message
            self.user
                .transport_mut()
                .recv_message(Address::new(base_address, msg_id))
                .await
                .ok()
        };
        match found {
            Some(binary_msg) => {
                self.fetched.push_back((msg_id, binary_msg));
                self.round_fetched_any = true;
                true
            }
            None => !self.publishers.is_empty() || self.round_fetched_any,
        }
    }
}

impl<'a, T> Messages<'a, T>
where
    T: for<'b> Transport<'b, Msg = TransportMessage>,
{
    pub(crate) fn new(user: &'a mut User<T>) -> Self {
        let mut state = MessagesState::new(user);
        Self(Box::pin(async move {
            let r = state.next().await;
            (state, r)
        }))
    }

    /// Returns the next message of the channel, or `None` if there is nothing new to read
    pub async fn next(&mut self) -> Option<Result<Message>> {
        StreamExt::next(self).await
    }
}

impl<'a, T> From<&'a mut User<T>> for Messages<'a, T>
where
    T: for<'b> Transport<'b, Msg = TransportMessage>,
{
    fn from(user: &'a mut User<T>) -> Self {
        Self::new(user)
    }
}

impl<'a, T> Stream for Messages<'a, T>
where
    T: for<'b> Transport<'b, Msg = TransportMessage>,
{
    type Item = Result<Message>;

    fn poll_next(mut self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.0.as_mut().poll(ctx) {
            Poll::Ready((mut state, result)) => {
                self.set(Messages(Box::pin(async move {
                    let r = state.next().await;
                    (state, r)
                })));
                Poll::Ready(result)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
