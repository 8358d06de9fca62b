use super::*;

pub type Subscriber = User<TransportWrap>;

/// Create a new subscriber
#[no_mangle]
pub unsafe extern "C" fn sub_new(
    c_seed: *const c_char,
    c_encoding: *const c_char,
    payload_length: size_t,
    transport: *mut TransportWrap,
) -> *mut Subscriber {
    new_user("sub_new", c_seed, c_encoding, payload_length, transport).map_or(null_mut(), safe_into_mut_ptr)
}

#[no_mangle]
pub extern "C" fn sub_drop(user: *mut Subscriber) {
    safe_drop_mut_ptr(user)
}

/// Reads the announcement of the channel to join
#[no_mangle]
pub unsafe extern "C" fn sub_unwrap_announce(user: *mut Subscriber, msg: *const Transaction) -> Err {
    user.as_mut().map_or(Err::NullArgument, |user| {
        msg.as_ref().map_or(Err::NullArgument, |msg| {
            match logged(
                "sub_unwrap_announce",
                user.handle_message(msg.address, msg.message.clone()),
            ) {
                Some(message) if message.is_announcement() => Err::Ok,
                Some(message) => {
                    warn!(address = %message.address(), "not an announcement");
                    Err::BadArgument
                }
                None => Err::OperationFailed,
            }
        })
    })
}

/// Subscribe to the channel announced at `announcement_link`. Its announcement must have been
/// unwrapped first.
#[no_mangle]
pub unsafe extern "C" fn sub_subscribe(user: *mut Subscriber, announcement_link: *const Address) -> *const Address {
    user.as_mut().map_or(null(), |user| {
        announcement_link.as_ref().map_or(null(), |announcement_link| {
            if user.stream_address() != Some(*announcement_link) {
                warn!(announcement = %announcement_link, "the announcement has not been unwrapped");
                return null();
            }
            logged("sub_subscribe", block_on(user.subscribe()))
                .map_or(null(), |response| safe_into_ptr(response.address()))
        })
    })
}

/// Leave the channel. The author forgets the subscriber once it reads the unsubscription.
#[no_mangle]
pub unsafe extern "C" fn sub_unsubscribe(user: *mut Subscriber) -> *const Address {
    user.as_mut().map_or(null(), |user| {
        logged("sub_unsubscribe", block_on(user.unsubscribe()))
            .map_or(null(), |response| safe_into_ptr(response.address()))
    })
}

/// Reads a keyload. Fails with [`Err::OperationFailed`] if the keyload is not addressed to the
/// subscriber, or links to a message it has not read.
#[no_mangle]
pub unsafe extern "C" fn sub_receive_keyload(user: *mut Subscriber, msg: *const Transaction) -> Err {
    user.as_mut().map_or(Err::NullArgument, |user| {
        msg.as_ref().map_or(Err::NullArgument, |msg| {
            match logged(
                "sub_receive_keyload",
                user.handle_message(msg.address, msg.message.clone()),
            ) {
                Some(message) if message.is_keyload() => Err::Ok,
                Some(message) if message.is_unreadable() || message.is_orphan() => {
                    warn!(address = %message.address(), "keyload cannot be read by the subscriber");
                    Err::OperationFailed
                }
                Some(message) => {
                    warn!(address = %message.address(), "not a keyload");
                    Err::BadArgument
                }
                None => Err::OperationFailed,
            }
        })
    })
}

/// Reads a signed or tagged packet. Returns null for any other message, or if the packet links to
/// a message the subscriber has not read.
#[no_mangle]
pub unsafe extern "C" fn sub_receive_packet(user: *mut Subscriber, msg: *const Transaction) -> *const UnwrappedMessage {
    user.as_mut().map_or(null(), |user| {
        msg.as_ref().map_or(null(), |msg| {
            logged(
                "sub_receive_packet",
                user.handle_message(msg.address, msg.message.clone()),
            )
            .map_or(null(), |message| {
                if message.is_signed_packet() || message.is_tagged_packet() {
                    safe_into_ptr(message)
                } else {
                    warn!(address = %message.address(), "not a readable packet");
                    null()
                }
            })
        })
    })
}
