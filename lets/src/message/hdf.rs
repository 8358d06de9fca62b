// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Guard, Mask, Skip},
        io,
        modifiers::External,
        types::{Maybe, NBytes, Size, Uint8},
    },
    error::{Error as SpongosError, Result as SpongosResult},
    PRP,
};

// Local
use crate::{
    address::MsgId,
    error::{Error, Result},
    id::Identifier,
    message::{
        content::{ContentSizeof, ContentUnwrap, ContentWrap},
        version::{HDF_ID, STREAMS_1_VER, UTF8},
    },
};

const MESSAGE_TYPE_BITS: u8 = 4;
const PAYLOAD_LENGTH_BITS: u8 = 10;
const FRAME_COUNT_BITS: u8 = 22;

/// Header Description Frame: the part of a message every reader can parse before knowing
/// anything about its content.
///
/// ```ddml
/// hdf {
///     absorb u8 encoding;
///     absorb u8 version;
///     skip   u8 message_type_and_payload_length[2];  // 4 | 2 reserved | 10 bits
///     absorb external u8 message_type << 4;
///     absorb u8 frame_type;                         // HDF_ID
///     skip   u8 payload_frame_count[3];             // 2 reserved | 22 bits
///     absorb oneof { null; u8 linked_msgid[12]; };
///     mask   identifier publisher;
///     skip   size sequence;
/// }
/// ```
///
/// The payload length and payload frame count are reserved for applications that frame their
/// payloads themselves. They are skipped, so not authenticated, and channel messages leave them at
/// 0: every message carries a single final payload frame whose length is encoded in its content.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub struct HDF {
    encoding: u8,
    version: u8,
    message_type: u8,
    payload_length: u16,
    frame_type: u8,
    payload_frame_count: u32,
    linked_msg_address: Option<MsgId>,
    sequence: usize,
    publisher: Identifier,
}

impl Default for HDF {
    fn default() -> Self {
        Self {
            encoding: UTF8,
            version: STREAMS_1_VER,
            message_type: 0,
            payload_length: 0,
            frame_type: HDF_ID,
            payload_frame_count: 0,
            linked_msg_address: None,
            sequence: 0,
            publisher: Identifier::default(),
        }
    }
}

impl HDF {
    pub fn new(message_type: u8, sequence: usize, publisher: Identifier) -> Result<Self> {
        if message_type >> MESSAGE_TYPE_BITS != 0 {
            return Err(Error::Overflow("message type", message_type.into(), MESSAGE_TYPE_BITS));
        }
        Ok(Self {
            message_type,
            sequence,
            publisher,
            ..Self::default()
        })
    }

    pub fn with_linked_msg_address(mut self, msgid: MsgId) -> Self {
        self.linked_msg_address = Some(msgid);
        self
    }

    /// Sets the reserved payload length field, which has 10 bits
    pub fn with_payload_length(mut self, payload_length: u16) -> Result<Self> {
        if payload_length >> PAYLOAD_LENGTH_BITS != 0 {
            return Err(Error::Overflow("payload length", payload_length.into(), PAYLOAD_LENGTH_BITS));
        }
        self.payload_length = payload_length;
        Ok(self)
    }

    /// Sets the reserved payload frame count field, which has 22 bits
    pub fn with_payload_frame_count(mut self, payload_frame_count: u32) -> Result<Self> {
        if payload_frame_count >> FRAME_COUNT_BITS != 0 {
            return Err(Error::Overflow("payload frame count", payload_frame_count, FRAME_COUNT_BITS));
        }
        self.payload_frame_count = payload_frame_count;
        Ok(self)
    }

    pub fn encoding(&self) -> u8 {
        self.encoding
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn message_type(&self) -> u8 {
        self.message_type
    }

    pub fn payload_length(&self) -> u16 {
        self.payload_length
    }

    pub fn payload_frame_count(&self) -> u32 {
        self.payload_frame_count
    }

    pub fn publisher(&self) -> &Identifier {
        &self.publisher
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn linked_msg_address(&self) -> Option<MsgId> {
        self.linked_msg_address
    }

    /// `[message_type x 4][reserved x 2][payload_length x 10]`
    fn type_and_length(&self) -> [u8; 2] {
        [
            (self.message_type << 4) | ((self.payload_length >> 8) as u8 & 0b0011),
            self.payload_length as u8,
        ]
    }

    /// `[reserved x 2][payload_frame_count x 22]`
    fn frame_count(&self) -> [u8; 3] {
        let bytes = self.payload_frame_count.to_be_bytes();
        [bytes[1] & 0b0011_1111, bytes[2], bytes[3]]
    }
}

impl ContentSizeof<HDF> for sizeof::Context {
    fn sizeof(&mut self, hdf: &HDF) -> SpongosResult<&mut Self> {
        self.absorb(Uint8::new(hdf.encoding))?
            .absorb(Uint8::new(hdf.version))?
            .skip(NBytes::new(hdf.type_and_length()))?
            .absorb(External::new(Uint8::new(hdf.message_type << 4)))?
            .absorb(Uint8::new(hdf.frame_type))?
            .skip(NBytes::new(hdf.frame_count()))?
            .absorb(Maybe::new(hdf.linked_msg_address.as_ref()))?
            .mask(&hdf.publisher)?
            .skip(Size::new(hdf.sequence))
    }
}

impl<OS, F> ContentWrap<HDF> for wrap::Context<OS, F>
where
    F: PRP,
    OS: io::OStream,
{
    fn wrap(&mut self, hdf: &mut HDF) -> SpongosResult<&mut Self> {
        self.absorb(Uint8::new(hdf.encoding))?
            .absorb(Uint8::new(hdf.version))?
            .skip(NBytes::new(hdf.type_and_length()))?
            .absorb(External::new(Uint8::new(hdf.message_type << 4)))?
            .absorb(Uint8::new(hdf.frame_type))?
            .skip(NBytes::new(hdf.frame_count()))?
            .absorb(Maybe::new(hdf.linked_msg_address.as_ref()))?
            .mask(&hdf.publisher)?
            .skip(Size::new(hdf.sequence))
    }
}

impl<IS, F> ContentUnwrap<HDF> for unwrap::Context<IS, F>
where
    F: PRP,
    IS: io::IStream,
{
    fn unwrap(&mut self, hdf: &mut HDF) -> SpongosResult<&mut Self> {
        let mut encoding = Uint8::default();
        let mut version = Uint8::default();
        let mut type_and_length = [0u8; 2];
        let mut frame_type = Uint8::default();
        let mut frame_count = [0u8; 3];
        let mut sequence = Size::default();

        self.absorb(&mut encoding)?
            .absorb(&mut version)?
            .guard(
                version.inner() == STREAMS_1_VER,
                SpongosError::InvalidOption("version", version.inner()),
            )?
            .skip(NBytes::new(&mut type_and_length))?
            .guard(
                type_and_length[0] & 0b1100 == 0,
                SpongosError::InvalidOption("reserved header bits", type_and_length[0]),
            )?
            .absorb(External::new(Uint8::new(type_and_length[0] & 0b1111_0000)))?
            .absorb(&mut frame_type)?
            .guard(
                frame_type.inner() == HDF_ID,
                SpongosError::InvalidOption("header frame type", frame_type.inner()),
            )?
            .skip(NBytes::new(&mut frame_count))?
            .guard(
                frame_count[0] & 0b1100_0000 == 0,
                SpongosError::InvalidOption("reserved frame count bits", frame_count[0]),
            )?
            .absorb(Maybe::new(&mut hdf.linked_msg_address))?
            .mask(&mut hdf.publisher)?
            .skip(&mut sequence)?;

        hdf.encoding = encoding.inner();
        hdf.version = version.inner();
        hdf.message_type = type_and_length[0] >> 4;
        hdf.payload_length = (u16::from(type_and_length[0] & 0b0011) << 8) | u16::from(type_and_length[1]);
        hdf.frame_type = frame_type.inner();
        hdf.payload_frame_count = u32::from_be_bytes([0, frame_count[0], frame_count[1], frame_count[2]]);
        hdf.sequence = sequence.inner();
        Ok(self)
    }
}
