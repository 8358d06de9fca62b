// Rust
use core::convert::TryFrom;

// Streams
use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Absorb, Guard, Skip},
        io,
        types::{NBytes, Uint8},
    },
    error::{Error as SpongosError, Result as SpongosResult},
    PRP,
};

// Local
use crate::{
    error::{Error, Result},
    message::{
        content::{ContentSizeof, ContentUnwrap, ContentWrap},
        version::{FINAL_PCF_ID, INIT_PCF_ID, INTER_PCF_ID},
    },
};

/// Payload Carrying Frame: the body of a message.
///
/// ```ddml
/// pcf {
///     absorb u8 frame_type;
///     skip   u8 payload_frame_num[3];  // 2 reserved | 22 bits
///     content;
/// }
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(clippy::upper_case_acronyms)]
pub struct PCF<Content> {
    frame_type: u8,
    payload_frame_num: PayloadFrameNum,
    content: Content,
}

// Every message fits in a single frame
impl PCF<()> {
    pub fn new_init_frame() -> Self {
        Self::single_frame(INIT_PCF_ID)
    }

    pub fn new_inter_frame() -> Self {
        Self::single_frame(INTER_PCF_ID)
    }

    pub fn new_final_frame() -> Self {
        Self::single_frame(FINAL_PCF_ID)
    }

    fn single_frame(frame_type: u8) -> Self {
        Self {
            frame_type,
            payload_frame_num: PayloadFrameNum(1),
            content: (),
        }
    }
}

impl<Content> Default for PCF<Content>
where
    Content: Default,
{
    fn default() -> Self {
        PCF::new_final_frame().with_content(Content::default())
    }
}

impl<Content> PCF<Content> {
    pub fn new(frame_type: u8, payload_frame_num: u32, content: Content) -> Result<Self> {
        Ok(Self {
            frame_type,
            payload_frame_num: PayloadFrameNum::try_from(payload_frame_num)?,
            content,
        })
    }

    pub fn with_content<T>(self, content: T) -> PCF<T> {
        PCF {
            frame_type: self.frame_type,
            payload_frame_num: self.payload_frame_num,
            content,
        }
    }

    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    pub fn into_content(self) -> Content {
        self.content
    }

    pub fn payload_frame_num(&self) -> u32 {
        self.payload_frame_num.0
    }
}

impl<Content> ContentSizeof<PCF<Content>> for sizeof::Context
where
    sizeof::Context: ContentSizeof<Content>,
{
    fn sizeof(&mut self, pcf: &PCF<Content>) -> SpongosResult<&mut Self> {
        self.absorb(Uint8::new(pcf.frame_type))?
            .skip(pcf.payload_frame_num)?
            .sizeof(&pcf.content)
    }
}

impl<OS, F, Content> ContentWrap<PCF<Content>> for wrap::Context<OS, F>
where
    F: PRP,
    OS: io::OStream,
    Self: ContentWrap<Content>,
{
    fn wrap(&mut self, pcf: &mut PCF<Content>) -> SpongosResult<&mut Self> {
        self.absorb(Uint8::new(pcf.frame_type))?
            .skip(pcf.payload_frame_num)?
            .wrap(&mut pcf.content)
    }
}

impl<IS, F, Content> ContentUnwrap<PCF<Content>> for unwrap::Context<IS, F>
where
    F: PRP,
    IS: io::IStream,
    Self: ContentUnwrap<Content>,
{
    fn unwrap(&mut self, pcf: &mut PCF<Content>) -> SpongosResult<&mut Self> {
        let mut frame_type = Uint8::default();
        self.absorb(&mut frame_type)?
            .guard(
                matches!(frame_type.inner(), INIT_PCF_ID | INTER_PCF_ID | FINAL_PCF_ID),
                SpongosError::InvalidOption("payload frame type", frame_type.inner()),
            )?
            .skip(&mut pcf.payload_frame_num)?
            .unwrap(&mut pcf.content)?;
        pcf.frame_type = frame_type.inner();
        Ok(self)
    }
}

/// 22 bit frame number, encoded in 3 bytes
#[derive(Copy, Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
struct PayloadFrameNum(u32);

impl PayloadFrameNum {
    const BITS: u8 = 22;

    fn to_bytes(self) -> [u8; 3] {
        let bytes = self.0.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }
}

impl TryFrom<u32> for PayloadFrameNum {
    type Error = Error;

    fn try_from(frame_num: u32) -> Result<Self> {
        if frame_num >> Self::BITS != 0 {
            return Err(Error::Overflow("payload frame number", frame_num, Self::BITS));
        }
        Ok(Self(frame_num))
    }
}

impl Skip<PayloadFrameNum> for sizeof::Context {
    fn skip(&mut self, frame_num: PayloadFrameNum) -> SpongosResult<&mut Self> {
        self.skip(NBytes::new(frame_num.to_bytes()))
    }
}

impl<OS, F> Skip<PayloadFrameNum> for wrap::Context<OS, F>
where
    F: PRP,
    OS: io::OStream,
{
    fn skip(&mut self, frame_num: PayloadFrameNum) -> SpongosResult<&mut Self> {
        self.skip(NBytes::new(frame_num.to_bytes()))
    }
}

impl<IS, F> Skip<&mut PayloadFrameNum> for unwrap::Context<IS, F>
where
    F: PRP,
    IS: io::IStream,
{
    fn skip(&mut self, frame_num: &mut PayloadFrameNum) -> SpongosResult<&mut Self> {
        let mut bytes = [0u8; 3];
        self.skip(NBytes::new(&mut bytes))?
            .guard(
                bytes[0] & 0b1100_0000 == 0,
                SpongosError::InvalidOption("reserved frame number bits", bytes[0]),
            )?;
        *frame_num = PayloadFrameNum(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]));
        Ok(self)
    }
}
