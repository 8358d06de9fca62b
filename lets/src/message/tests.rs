use alloc::vec::Vec;

use spongos::{
    ddml::{
        commands::{sizeof, unwrap, wrap, Mask},
        io,
        types::Bytes,
    },
    error::{Error as SpongosError, Result as SpongosResult},
    KeccakF1600, Spongos, PRP,
};

use crate::{
    address::MsgId,
    error::{Error, Result},
    id::{Ed25519, Identity},
    message::{ContentSizeof, ContentUnwrap, ContentWrap, Message, TransportMessage, HDF, PCF},
};

#[derive(Default, Debug, PartialEq)]
struct Note(Vec<u8>);

impl ContentSizeof<Note> for sizeof::Context {
    fn sizeof(&mut self, note: &Note) -> SpongosResult<&mut Self> {
        self.mask(Bytes::new(&note.0))
    }
}

impl<OS: io::OStream, F: PRP> ContentWrap<Note> for wrap::Context<OS, F> {
    fn wrap(&mut self, note: &mut Note) -> SpongosResult<&mut Self> {
        self.mask(Bytes::new(&note.0))
    }
}

impl<IS: io::IStream, F: PRP> ContentUnwrap<Note> for unwrap::Context<IS, F> {
    fn unwrap(&mut self, note: &mut Note) -> SpongosResult<&mut Self> {
        self.mask(Bytes::new(&mut note.0))
    }
}

fn header() -> Result<HDF> {
    let publisher = Identity::new(Ed25519::from_seed("publisher"));
    Ok(HDF::new(3, 7, publisher.identifier().clone())?
        .with_linked_msg_address(MsgId::new([5; 12]))
        .with_payload_length(1000)?
        .with_payload_frame_count(3)?)
}

#[test]
fn header_is_parsed_before_content() -> Result<()> {
    let hdf = header()?;
    let mut message = Message::new(hdf.clone(), PCF::new_final_frame().with_content(Note(b"note".to_vec())));
    let (transport_msg, wrap_spongos) = message.wrap::<KeccakF1600>()?;

    let preparsed = transport_msg.parse_header::<KeccakF1600>()?;
    assert_eq!(preparsed.header(), &hdf);
    assert_eq!(preparsed.message_type(), 3);
    assert_eq!(preparsed.header().payload_length(), 1000);
    assert_eq!(preparsed.header().payload_frame_count(), 3);
    assert_eq!(preparsed.header().linked_msg_address(), Some(MsgId::new([5; 12])));

    let (message, unwrap_spongos) = preparsed.unwrap(Note::default())?;
    assert_eq!(message.payload().content(), &Note(b"note".to_vec()));
    assert_eq!(wrap_spongos, unwrap_spongos);
    Ok(())
}

#[test]
fn masked_content_is_not_readable_in_transport() -> Result<()> {
    let mut message = Message::new(header()?, PCF::new_final_frame().with_content(Note(b"secret note".to_vec())));
    let (transport_msg, _) = message.wrap::<KeccakF1600>()?;
    assert!(!transport_msg
        .body()
        .windows(b"secret note".len())
        .any(|window| window == b"secret note"));
    Ok(())
}

#[test]
fn header_fields_are_bounded() {
    let publisher = Identity::new(Ed25519::from_seed("publisher"));
    assert!(matches!(
        HDF::new(16, 0, publisher.identifier().clone()),
        Err(Error::Overflow("message type", 16, 4))
    ));
    assert!(matches!(
        HDF::default().with_payload_length(1024),
        Err(Error::Overflow("payload length", 1024, 10))
    ));
    assert!(matches!(
        PCF::new(0, 1 << 22, ()),
        Err(Error::Overflow("payload frame number", _, 22))
    ));
}

#[test]
fn reserved_header_fields_are_zero_unless_set() -> Result<()> {
    let publisher = Identity::new(Ed25519::from_seed("publisher"));
    let hdf = HDF::new(3, 7, publisher.identifier().clone())?;
    let mut message = Message::new(hdf, PCF::new_final_frame().with_content(Note(b"note".to_vec())));
    let (transport_msg, _) = message.wrap::<KeccakF1600>()?;

    let preparsed = transport_msg.parse_header::<KeccakF1600>()?;
    assert_eq!(preparsed.header().payload_length(), 0);
    assert_eq!(preparsed.header().payload_frame_count(), 0);
    Ok(())
}

#[test]
fn unknown_version_is_rejected() -> Result<()> {
    let mut message = Message::new(header()?, PCF::new_final_frame().with_content(Note::default()));
    let (transport_msg, _) = message.wrap::<KeccakF1600>()?;
    let mut body = transport_msg.into_body();
    body[1] = 2;

    assert!(matches!(
        TransportMessage::new(body).parse_header::<KeccakF1600>(),
        Err(Error::Spongos(SpongosError::InvalidOption("version", 2)))
    ));
    Ok(())
}

#[test]
fn tampered_content_is_not_recovered() -> Result<()> {
    let mut message = Message::new(header()?, PCF::new_final_frame().with_content(Note(b"note".to_vec())));
    let (transport_msg, wrap_spongos) = message.wrap::<KeccakF1600>()?;
    let mut body = transport_msg.into_body();
    let last = body.len() - 1;
    body[last] ^= 1;

    let (message, spongos): (Message<Note>, Spongos<KeccakF1600>) =
        TransportMessage::new(body).parse_header()?.unwrap(Note::default())?;
    assert_ne!(message.payload().content(), &Note(b"note".to_vec()));
    assert_ne!(spongos, wrap_spongos);
    Ok(())
}
