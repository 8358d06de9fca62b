//! Frame constants. The version byte is the second byte of every message; a reader rejects any
//! version it does not know, since a new version may change the DDML of the header.

/// Current message syntax version
pub const STREAMS_1_VER: u8 = 1;

/// Payload encoding
pub const UTF8: u8 = 0;

/// Frame type of the header frame
pub const HDF_ID: u8 = 4;
/// Frame types of the payload frame
pub const INIT_PCF_ID: u8 = 5;
pub const INTER_PCF_ID: u8 = 12;
pub const FINAL_PCF_ID: u8 = 14;
