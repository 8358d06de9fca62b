// Rust
use alloc::vec::Vec;

// Streams
use lets::{
    address::Address,
    id::{Identifier, Permissioned, PskId},
    message::{Message as LetsMessage, PreparsedMessage, TransportMessage, HDF},
};

// Local
use crate::message::{announcement, keyload, packet, subscription, unsubscription};

/// A message read by a [`User`](crate::User): where it was found, its header and what it says
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    pub address: Address,
    pub header: HDF,
    pub content: MessageContent,
}

/// Generates an `is_*` and an `as_*` accessor per [`MessageContent`] variant
macro_rules! content_accessors {
    ($($variant:ident: $is:ident, $as:ident;)+) => {
        $(
            pub fn $is(&self) -> bool {
                matches!(self.content, MessageContent::$variant(_))
            }

            pub fn $as(&self) -> Option<&$variant> {
                match &self.content {
                    MessageContent::$variant(content) => Some(content),
                    _ => None,
                }
            }
        )+
    };
}

impl Message {
    pub(crate) fn from_lets_message<Unwrap>(address: Address, lets_message: LetsMessage<Unwrap>) -> Self
    where
        Unwrap: Into<MessageContent>,
    {
        let (header, payload) = lets_message.into_parts();
        Self {
            address,
            header,
            content: payload.into_content().into(),
        }
    }

    /// A message whose linked message is unknown. It keeps the raw message so that it can be
    /// handled again once the link is read.
    pub(crate) fn orphan(address: Address, preparsed: PreparsedMessage) -> Self {
        let (header, message, _, cursor) = preparsed.into_parts();
        Self {
            address,
            header,
            content: MessageContent::Orphan(Orphan { message, cursor }),
        }
    }

    /// A keyload that includes neither the user nor any of its PSKs
    pub(crate) fn unreadable(address: Address, header: HDF, keyload: keyload::Unwrap) -> Self {
        let (subscribers, psks) = keyload.into_parts();
        Self {
            address,
            header,
            content: MessageContent::Unreadable(Keyload { subscribers, psks }),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn header(&self) -> &HDF {
        &self.header
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// [`Identifier`] found in the header of the message
    pub fn publisher(&self) -> &Identifier {
        self.header.publisher()
    }

    content_accessors! {
        Announcement: is_announcement, as_announcement;
        Keyload: is_keyload, as_keyload;
        SignedPacket: is_signed_packet, as_signed_packet;
        TaggedPacket: is_tagged_packet, as_tagged_packet;
        Subscription: is_subscription, as_subscription;
        Unsubscription: is_unsubscription, as_unsubscription;
        Orphan: is_orphan, as_orphan;
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self.content, MessageContent::Unreadable(_))
    }

    /// Payload published in clear, if the message is a packet
    pub fn public_payload(&self) -> Option<&[u8]> {
        self.content.payloads().map(|(public, _)| public)
    }

    /// Payload only the readers of the keyload the packet descends from can read, if the message
    /// is a packet
    pub fn masked_payload(&self) -> Option<&[u8]> {
        self.content.payloads().map(|(_, masked)| masked)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageContent {
    Announcement(Announcement),
    Keyload(Keyload),
    SignedPacket(SignedPacket),
    TaggedPacket(TaggedPacket),
    Subscription(Subscription),
    Unsubscription(Unsubscription),
    /// The message linked to is not known, so the message cannot be read yet
    Orphan(Orphan),
    /// A keyload not addressed to the user. Messages linked to it stay orphans.
    Unreadable(Keyload),
}

impl MessageContent {
    /// Public and masked payloads of a packet
    pub fn payloads(&self) -> Option<(&[u8], &[u8])> {
        match self {
            Self::SignedPacket(SignedPacket {
                public_payload,
                masked_payload,
                ..
            })
            | Self::TaggedPacket(TaggedPacket {
                public_payload,
                masked_payload,
            }) => Some((public_payload.as_slice(), masked_payload.as_slice())),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Announcement {
    pub author_identifier: Identifier,
    pub multi_branching: bool,
}

/// Recipients of a keyload. Only their identifiers are readable: the session key itself stays
/// in the spongos state of the keyload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Keyload {
    pub subscribers: Vec<Permissioned<Identifier>>,
    pub psks: Vec<PskId>,
}

impl Keyload {
    pub fn includes_subscriber(&self, subscriber: &Identifier) -> bool {
        self.subscribers
            .iter()
            .any(|permission| permission.identifier() == subscriber)
    }

    pub fn includes_psk(&self, psk_id: &PskId) -> bool {
        self.psks.contains(psk_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignedPacket {
    /// Signer of the packet, which is also the publisher in its header
    pub publisher_identifier: Identifier,
    pub public_payload: Vec<u8>,
    pub masked_payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedPacket {
    pub public_payload: Vec<u8>,
    pub masked_payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub subscriber_identifier: Identifier,
}

impl Subscription {
    pub fn subscriber_identifier(&self) -> &Identifier {
        &self.subscriber_identifier
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Unsubscription {
    pub subscriber_identifier: Identifier,
}

impl Unsubscription {
    pub fn into_subscriber_identifier(self) -> Identifier {
        self.subscriber_identifier
    }
}

/// Raw message that could not be read yet
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Orphan {
    pub message: TransportMessage,
    /// Position of the content in the raw message, past the header
    pub cursor: usize,
}

impl From<announcement::Unwrap> for MessageContent {
    fn from(announcement: announcement::Unwrap) -> Self {
        let multi_branching = announcement.is_multi_branching();
        Self::Announcement(Announcement {
            author_identifier: announcement.into_author_id(),
            multi_branching,
        })
    }
}

impl<'a> From<subscription::Unwrap<'a>> for MessageContent {
    fn from(subscription: subscription::Unwrap<'a>) -> Self {
        Self::Subscription(Subscription {
            subscriber_identifier: subscription.into_subscriber_identifier(),
        })
    }
}

impl<'a> From<unsubscription::Unwrap<'a>> for MessageContent {
    fn from(unsubscription: unsubscription::Unwrap<'a>) -> Self {
        Self::Unsubscription(Unsubscription {
            subscriber_identifier: unsubscription.into_subscriber(),
        })
    }
}

impl<'a> From<keyload::Unwrap<'a>> for MessageContent {
    fn from(keyload: keyload::Unwrap<'a>) -> Self {
        let (subscribers, psks) = keyload.into_parts();
        Self::Keyload(Keyload { subscribers, psks })
    }
}

impl<'a> From<packet::Unwrap<'a>> for MessageContent {
    fn from(packet: packet::Unwrap<'a>) -> Self {
        let signer = packet.signer().cloned();
        let (public_payload, masked_payload) = packet.into_payloads();
        match signer {
            Some(publisher_identifier) => Self::SignedPacket(SignedPacket {
                publisher_identifier,
                public_payload,
                masked_payload,
            }),
            None => Self::TaggedPacket(TaggedPacket {
                public_payload,
                masked_payload,
            }),
        }
    }
}
