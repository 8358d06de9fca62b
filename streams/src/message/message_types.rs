/// Announcement Message Type
pub(crate) const ANNOUNCEMENT: u8 = 0;
/// Keyload Message Type
pub(crate) const KEYLOAD: u8 = 2;
/// Signed Packet Message Type
pub(crate) const SIGNED_PACKET: u8 = 3;
/// Tagged Packet Message Type
pub(crate) const TAGGED_PACKET: u8 = 4;
/// Subscribe Message Type
pub(crate) const SUBSCRIPTION: u8 = 5;
/// Unsubscribe Message Type
pub(crate) const UNSUBSCRIPTION: u8 = 6;

/// Name of a message type, for logs and errors
pub(crate) fn name(message_type: u8) -> &'static str {
    match message_type {
        ANNOUNCEMENT => "announcement",
        KEYLOAD => "keyload",
        SIGNED_PACKET => "signed packet",
        TAGGED_PACKET => "tagged packet",
        SUBSCRIPTION => "subscription",
        UNSUBSCRIPTION => "unsubscription",
        _ => "unknown",
    }
}
