use super::*;

/// The creator of a channel
pub struct Author {
    user: User<TransportWrap>,
    channel_address: AppAddr,
    multi_branching: bool,
}

/// Generate a new Author Instance
///
/// Returns null if an argument is null, the seed or encoding are not utf-8 or the encoding is not
/// `utf-8`.
#[no_mangle]
pub unsafe extern "C" fn auth_new(
    c_seed: *const c_char,
    c_encoding: *const c_char,
    payload_length: size_t,
    multi_branching: uint8_t,
    transport: *mut TransportWrap,
) -> *mut Author {
    new_user("auth_new", c_seed, c_encoding, payload_length, transport).map_or(null_mut(), |user| {
        logged("auth_new", user.announcement_address()).map_or(null_mut(), |address| {
            debug!(channel = %address.base(), "author created");
            safe_into_mut_ptr(Author {
                user,
                channel_address: address.base(),
                multi_branching: multi_branching != 0,
            })
        })
    })
}

#[no_mangle]
pub extern "C" fn auth_drop(user: *mut Author) {
    safe_drop_mut_ptr(user)
}

/// Channel app instance. Borrowed from the author, it is known before the channel is announced.
#[no_mangle]
pub unsafe extern "C" fn auth_channel_address(user: *const Author) -> *const AppAddr {
    user.as_ref()
        .map_or(null(), |user| &user.channel_address as *const AppAddr)
}

#[no_mangle]
pub unsafe extern "C" fn auth_is_multi_branching(user: *const Author) -> uint8_t {
    user.as_ref().map_or(0, |user| user.multi_branching as uint8_t)
}

/// Announce creation of a new Channel.
#[no_mangle]
pub unsafe extern "C" fn auth_announce(user: *mut Author) -> *const Address {
    user.as_mut().map_or(null(), |user| {
        logged("auth_announce", block_on(user.user.create_stream(user.multi_branching)))
            .map_or(null(), |response| safe_into_ptr(response.address()))
    })
}

/// unwrap and add a subscriber to the list of subscribers
#[no_mangle]
pub unsafe extern "C" fn auth_unwrap_subscribe(user: *mut Author, msg: *const Transaction) -> Err {
    user.as_mut().map_or(Err::NullArgument, |user| {
        msg.as_ref().map_or(Err::NullArgument, |msg| {
            match logged(
                "auth_unwrap_subscribe",
                user.user.handle_message(msg.address, msg.message.clone()),
            ) {
                Some(message) if message.is_subscription() => Err::Ok,
                Some(message) => {
                    warn!(address = %message.address(), "not a subscription");
                    Err::BadArgument
                }
                None => Err::OperationFailed,
            }
        })
    })
}

/// Create keyload for all subscribed subscribers.
#[no_mangle]
pub unsafe extern "C" fn auth_share_keyload_for_everyone(
    user: *mut Author,
    link_to: *const Address,
) -> *const MessageLinks {
    user.as_mut().map_or(null(), |user| {
        link_to.as_ref().map_or(null(), |link_to| {
            logged(
                "auth_share_keyload_for_everyone",
                block_on(user.user.send_keyload_for_all(link_to.relative())),
            )
            .map_or(null(), |response| safe_into_ptr(MessageLinks::from(response.address())))
        })
    })
}

/// Publish a tagged packet linked to the message of `link_to`
#[no_mangle]
pub unsafe extern "C" fn auth_tag_packet(
    user: *mut Author,
    link_to: *const MessageLinks,
    public_payload: *const c_char,
    masked_payload: *const c_char,
) -> *const MessageLinks {
    let (user, link_to) = match (user.as_mut(), link_to.as_ref().and_then(|links| links.msg_link())) {
        (Some(user), Some(link_to)) => (user, link_to),
        _ => return null(),
    };
    let (public_payload, masked_payload) = match (
        c_bytes(public_payload, "public payload"),
        c_bytes(masked_payload, "masked payload"),
    ) {
        (Some(public_payload), Some(masked_payload)) => (public_payload, masked_payload),
        _ => return null(),
    };
    logged(
        "auth_tag_packet",
        block_on(
            user.user
                .send_tagged_packet(link_to.relative(), public_payload, masked_payload),
        ),
    )
    .map_or(null(), |response| safe_into_ptr(MessageLinks::from(response.address())))
}

/// Publish a signed packet linked to the message of `link_to`
#[no_mangle]
pub unsafe extern "C" fn auth_sign_packet(
    user: *mut Author,
    link_to: *const MessageLinks,
    public_payload: *const c_char,
    masked_payload: *const c_char,
) -> *const MessageLinks {
    let (user, link_to) = match (user.as_mut(), link_to.as_ref().and_then(|links| links.msg_link())) {
        (Some(user), Some(link_to)) => (user, link_to),
        _ => return null(),
    };
    let (public_payload, masked_payload) = match (
        c_bytes(public_payload, "public payload"),
        c_bytes(masked_payload, "masked payload"),
    ) {
        (Some(public_payload), Some(masked_payload)) => (public_payload, masked_payload),
        _ => return null(),
    };
    logged(
        "auth_sign_packet",
        block_on(
            user.user
                .send_signed_packet(link_to.relative(), public_payload, masked_payload),
        ),
    )
    .map_or(null(), |response| safe_into_ptr(MessageLinks::from(response.address())))
}
