use core::fmt;

use spongos::{ddml::commands::unwrap, KeccakF1600, Spongos, PRP};

use crate::{
    error::Result,
    message::{content::ContentUnwrap, hdf::HDF, message::Message, pcf::PCF, transport::TransportMessage},
};

/// Number of payload bytes shown by the `Debug` output
const DEBUG_PREVIEW: usize = 10;

/// A [`TransportMessage`] split after its header.
///
/// The header decides how the rest of the message is to be read (which content, joined to which
/// state), so it is decoded first and the payload frame waits here together with the sponge state
/// the header left behind.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PreparsedMessage<F = KeccakF1600> {
    transport_msg: TransportMessage,
    header: HDF,
    spongos: Spongos<F>,
    payload_offset: usize,
}

impl<F> PreparsedMessage<F>
where
    F: PRP + Default,
{
    pub(crate) fn parse(transport_msg: TransportMessage) -> Result<Self> {
        let mut header = HDF::default();
        let (spongos, remaining) = {
            let mut ctx = unwrap::Context::<_, F>::new(transport_msg.body());
            ctx.unwrap(&mut header)?;
            let remaining = ctx.stream().len();
            (ctx.finalize(), remaining)
        };
        let payload_offset = transport_msg.body().len() - remaining;
        Ok(Self {
            transport_msg,
            header,
            spongos,
            payload_offset,
        })
    }
}

impl<F> PreparsedMessage<F> {
    pub fn header(&self) -> &HDF {
        &self.header
    }

    pub fn message_type(&self) -> u8 {
        self.header.message_type()
    }

    pub fn transport_msg(&self) -> &TransportMessage {
        &self.transport_msg
    }

    /// Where the payload frame starts in the body
    pub fn cursor(&self) -> usize {
        self.payload_offset
    }

    pub fn into_parts(self) -> (HDF, TransportMessage, Spongos<F>, usize) {
        (self.header, self.transport_msg, self.spongos, self.payload_offset)
    }

    fn payload_bytes(&self) -> &[u8] {
        &self.transport_msg.body()[self.payload_offset..]
    }

    /// Reads the payload frame into `content`. The returned state is the one messages linked to
    /// this one join.
    pub fn unwrap<Content>(self, content: Content) -> Result<(Message<Content>, Spongos<F>)>
    where
        for<'a> unwrap::Context<&'a [u8], F>: ContentUnwrap<PCF<Content>>,
        F: PRP,
    {
        let (header, transport_msg, spongos, payload_offset) = self.into_parts();
        let mut payload = PCF::new_final_frame().with_content(content);
        let spongos = {
            let mut ctx = unwrap::Context::new_with_spongos(&transport_msg.body()[payload_offset..], spongos);
            ctx.unwrap(&mut payload)?;
            ctx.finalize()
        };
        Ok((Message::new(header, payload), spongos))
    }
}

impl<F> fmt::Debug for PreparsedMessage<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = self.payload_bytes();
        let preview = &payload[..payload.len().min(DEBUG_PREVIEW)];
        write!(f, "PreparsedMessage {{ header: {:?}, payload: {}.. }}", self.header, hex::encode(preview))
    }
}
