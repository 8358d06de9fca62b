// Rust
use alloc::vec::Vec;

// Streams
use lets::{
    address::Address,
    id::{Identity, Psk},
    message::TransportMessage,
    transport::{bucket, Transport},
};

// Local
use crate::{
    api::user::{User, DEFAULT_PAYLOAD_LENGTH},
    Result,
};

/// Collects the parameters of a [`User`]. Obtained with [`User::builder()`].
///
/// A user without identity can still read the branches it holds a PSK for, but cannot publish
/// anything.
pub struct UserBuilder<T> {
    identity: Option<Identity>,
    transport: T,
    psks: Vec<Psk>,
    payload_length: usize,
}

impl Default for UserBuilder<()> {
    fn default() -> Self {
        UserBuilder {
            identity: None,
            transport: (),
            psks: Vec::new(),
            payload_length: DEFAULT_PAYLOAD_LENGTH,
        }
    }
}

impl UserBuilder<()> {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl<T> UserBuilder<T> {
    pub fn with_identity<I>(mut self, identity: I) -> Self
    where
        I: Into<Identity>,
    {
        self.identity = Some(identity.into());
        self
    }

    /// Limits the combined length of the public and masked payloads of the packets the user
    /// sends. Defaults to [`DEFAULT_PAYLOAD_LENGTH`].
    pub fn with_payload_length(mut self, payload_length: usize) -> Self {
        self.payload_length = payload_length;
        self
    }

    /// Replaces the transport the user publishes to and reads from
    pub fn with_transport<NewTransport>(self, transport: NewTransport) -> UserBuilder<NewTransport>
    where
        NewTransport: for<'a> Transport<'a>,
    {
        UserBuilder {
            identity: self.identity,
            transport,
            psks: self.psks,
            payload_length: self.payload_length,
        }
    }

    /// Adds a key shared out of band, used to read keyloads that include it
    ///
    /// ```
    /// use streams::{id::Psk, transport::bucket, User};
    ///
    /// let user: User<bucket::Client> = User::builder()
    ///     .with_psk(Psk::from_seed(b"first psk"))
    ///     .with_psk(Psk::from_seed(b"second psk"))
    ///     .build();
    /// assert!(user.identifier().is_none());
    /// ```
    pub fn with_psk(mut self, psk: Psk) -> Self {
        self.psks.push(psk);
        self
    }

    /// Builds the [`User`]. Without a transport, the user gets an empty [`bucket::Client`].
    ///
    /// ```
    /// use streams::{id::Ed25519, transport::bucket, User};
    ///
    /// let user: User<bucket::Client> = User::builder()
    ///     .with_identity(Ed25519::from_seed("cryptographically-secure-random-user-seed"))
    ///     .build();
    /// assert!(user.identifier().is_some());
    /// ```
    pub fn build<Trans>(self) -> User<Trans>
    where
        T: IntoTransport<Trans>,
        Trans: for<'a> Transport<'a>,
    {
        let psks = self.psks.into_iter().map(|psk| (psk.to_pskid(), psk));
        User::new(self.identity, psks, self.transport.into(), self.payload_length)
    }

    /// Builds the [`User`] and rereads the stream starting at `announcement`.
    ///
    /// Only what was published to the stream comes back: subscribers and PSKs added or removed by
    /// hand must be applied again. An author does not read its own keyloads, so the branches below
    /// them are not recovered either.
    ///
    /// # Errors
    /// Fails if the announcement cannot be fetched or read.
    pub async fn recover<Trans, TSR>(self, announcement: Address) -> Result<User<Trans>>
    where
        T: IntoTransport<Trans>,
        Trans: for<'a> Transport<'a, Msg = TransportMessage, SendResponse = TSR>,
    {
        let mut user = self.build();
        user.receive_message(announcement).await?;
        user.sync().await?;
        Ok(user)
    }
}

/// Conversion into the transport of a [`User`]. The unit type stands for the default
/// [`bucket::Client`].
pub trait IntoTransport<T>
where
    T: for<'a> Transport<'a>,
{
    fn into(self) -> T;
}

impl IntoTransport<bucket::Client> for () {
    fn into(self) -> bucket::Client {
        bucket::Client::default()
    }
}

impl<T> IntoTransport<T> for T
where
    T: for<'a> Transport<'a>,
{
    fn into(self) -> T {
        self
    }
}
