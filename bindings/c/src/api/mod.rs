use core::{
    fmt::Display,
    ptr::{null, null_mut},
};
#[cfg(not(feature = "sync-client"))]
use std::{cell::RefCell, rc::Rc};
#[cfg(feature = "sync-client")]
use std::sync::Arc;

use cstr_core::{CStr, CString};
use cty::{c_char, size_t, uint8_t};
use futures::executor::block_on;
use tracing::{debug, warn};

use streams::{
    id::Ed25519,
    transport::{bucket, Transport},
    Address, AppAddr, Error, Message, TransportMessage, User,
};

pub(crate) fn safe_into_ptr<T>(value: T) -> *const T {
    Box::into_raw(Box::new(value))
}

pub(crate) fn safe_into_mut_ptr<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

pub(crate) fn safe_drop_ptr<T>(p: *const T) {
    if !p.is_null() {
        unsafe { drop(Box::from_raw(p as *mut T)) }
    }
}

pub(crate) fn safe_drop_mut_ptr<T>(p: *mut T) {
    if !p.is_null() {
        unsafe { drop(Box::from_raw(p)) }
    }
}

/// Borrows a C string as utf-8
pub(crate) unsafe fn c_str<'a>(s: *const c_char, argument: &'static str) -> Option<&'a str> {
    c_bytes(s, argument)?;
    CStr::from_ptr(s)
        .to_str()
        .map_err(|error| warn!(argument, %error, "string argument is not utf-8"))
        .ok()
}

/// Borrows the bytes of a C string, without its nul terminator
pub(crate) unsafe fn c_bytes<'a>(s: *const c_char, argument: &'static str) -> Option<&'a [u8]> {
    if s.is_null() {
        warn!(argument, "null string argument");
        return None;
    }
    Some(CStr::from_ptr(s).to_bytes())
}

pub(crate) fn into_c_string<S: Into<Vec<u8>>>(string: S) -> *const c_char {
    CString::new(string).map_or(null(), |s| s.into_raw())
}

/// Logs the error of a failed operation and discards it
pub(crate) fn logged<T, E: Display>(operation: &'static str, result: Result<T, E>) -> Option<T> {
    result.map_err(|error| warn!(operation, %error, "operation failed")).ok()
}

/// Only utf-8 payloads are supported
pub(crate) fn check_encoding(encoding: &str) -> streams::Result<()> {
    if encoding.eq_ignore_ascii_case("utf-8") {
        Ok(())
    } else {
        Err(Error::UnsupportedEncoding(encoding.to_string()))
    }
}

/// Builds the user behind an author or subscriber handle
pub(crate) unsafe fn new_user(
    operation: &'static str,
    c_seed: *const c_char,
    c_encoding: *const c_char,
    payload_length: size_t,
    transport: *mut TransportWrap,
) -> Option<User<TransportWrap>> {
    let seed = c_str(c_seed, "seed")?;
    let encoding = c_str(c_encoding, "encoding")?;
    let transport = match transport.as_ref() {
        Some(transport) => transport.clone(),
        None => {
            warn!(operation, "null transport");
            return None;
        }
    };
    logged(operation, check_encoding(encoding))?;
    Some(
        User::builder()
            .with_identity(Ed25519::from_seed(seed))
            .with_transport(transport)
            .with_payload_length(payload_length)
            .build(),
    )
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Err {
    Ok,
    NullArgument,
    BadArgument,
    OperationFailed,
}

#[cfg(feature = "sync-client")]
pub type TransportWrap = Arc<parking_lot::Mutex<bucket::Client>>;

#[cfg(not(feature = "sync-client"))]
pub type TransportWrap = Rc<RefCell<bucket::Client>>;

/// Creates an empty in-memory transport. Users created with the same transport share its
/// messages.
#[no_mangle]
pub extern "C" fn tsp_new() -> *mut TransportWrap {
    safe_into_mut_ptr(TransportWrap::default())
}

#[no_mangle]
pub extern "C" fn tsp_drop(tsp: *mut TransportWrap) {
    safe_drop_mut_ptr(tsp)
}

/// A message fetched from the transport, along with the address it was stored at
pub struct Transaction {
    pub(crate) address: Address,
    pub(crate) message: TransportMessage,
}

/// Fetches the message stored at `link`
#[no_mangle]
pub unsafe extern "C" fn get_transaction(link: *const Address, transport: *mut TransportWrap) -> *const Transaction {
    link.as_ref().map_or(null(), |link| {
        transport.as_mut().map_or(null(), |transport| {
            logged("get_transaction", block_on(transport.recv_message(*link))).map_or(null(), |message| {
                debug!(address = %link, "transaction fetched");
                safe_into_ptr(Transaction { address: *link, message })
            })
        })
    })
}

#[no_mangle]
pub extern "C" fn drop_transaction(transaction: *const Transaction) {
    safe_drop_ptr(transaction)
}

#[no_mangle]
pub unsafe extern "C" fn address_from_string(c_addr: *const c_char) -> *const Address {
    c_str(c_addr, "address").map_or(null(), |address| {
        logged("address_from_string", address.parse::<Address>()).map_or(null(), safe_into_ptr)
    })
}

#[no_mangle]
pub extern "C" fn drop_address(address: *const Address) {
    safe_drop_ptr(address)
}

/// Hex representation of an application address
#[no_mangle]
pub unsafe extern "C" fn get_appinst_str(appinst: *const AppAddr) -> *const c_char {
    appinst
        .as_ref()
        .map_or(null(), |appinst| into_c_string(appinst.to_string()))
}

/// `appaddr:msgid` hex representation of an address, parsed back by [`address_from_string`]
#[no_mangle]
pub unsafe extern "C" fn get_address_str(address: *const Address) -> *const c_char {
    address
        .as_ref()
        .map_or(null(), |address| into_c_string(address.to_string()))
}

#[no_mangle]
pub unsafe extern "C" fn drop_str(string: *const c_char) {
    if !string.is_null() {
        drop(CString::from_raw(string as *mut c_char));
    }
}

/// Address of a message just sent
#[repr(C)]
pub struct MessageLinks {
    pub msg_link: *const Address,
}

impl From<Address> for MessageLinks {
    fn from(address: Address) -> Self {
        Self {
            msg_link: safe_into_ptr(address),
        }
    }
}

impl MessageLinks {
    pub(crate) unsafe fn msg_link<'a>(&self) -> Option<&'a Address> {
        self.msg_link.as_ref()
    }
}

impl Drop for MessageLinks {
    fn drop(&mut self) {
        safe_drop_ptr(self.msg_link)
    }
}

/// Releases the links and the address they hold
#[no_mangle]
pub extern "C" fn drop_links(links: *const MessageLinks) {
    safe_drop_ptr(links)
}

/// Borrows the address held by `msg_links`. It lives as long as the links.
#[no_mangle]
pub unsafe extern "C" fn get_msg_link(msg_links: *const MessageLinks) -> *const Address {
    msg_links.as_ref().map_or(null(), |links| links.msg_link)
}

#[repr(C)]
pub struct Buffer {
    pub(crate) ptr: *const uint8_t,
    pub(crate) size: size_t,
    pub(crate) cap: size_t,
}

impl From<Vec<u8>> for Buffer {
    fn from(vec: Vec<u8>) -> Self {
        let p = core::mem::ManuallyDrop::new(vec);
        Self {
            ptr: p.as_ptr(),
            size: p.len(),
            cap: p.capacity(),
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            ptr: null(),
            size: 0,
            cap: 0,
        }
    }
}

impl Buffer {
    pub fn drop(self) {
        if !self.ptr.is_null() {
            unsafe { drop(Vec::from_raw_parts(self.ptr as *mut u8, self.size, self.cap)) }
        }
    }
}

#[repr(C)]
#[derive(Default)]
pub struct PacketPayloads {
    pub(crate) public_payload: Buffer,
    pub(crate) masked_payload: Buffer,
}

impl From<&Message> for PacketPayloads {
    fn from(message: &Message) -> Self {
        match (message.public_payload(), message.masked_payload()) {
            (Some(public_payload), Some(masked_payload)) => Self {
                public_payload: public_payload.to_vec().into(),
                masked_payload: masked_payload.to_vec().into(),
            },
            _ => Self::default(),
        }
    }
}

impl PacketPayloads {
    pub fn drop(self) {
        self.public_payload.drop();
        self.masked_payload.drop();
    }
}

#[no_mangle]
pub extern "C" fn drop_payloads(payloads: PacketPayloads) {
    payloads.drop()
}

/// A message read by a user
pub type UnwrappedMessage = Message;

/// Copies the payloads of a packet. Other messages have empty payloads.
#[no_mangle]
pub unsafe extern "C" fn get_payload(msg: *const UnwrappedMessage) -> PacketPayloads {
    msg.as_ref().map_or(PacketPayloads::default(), PacketPayloads::from)
}

#[no_mangle]
pub extern "C" fn drop_unwrapped_message(msg: *const UnwrappedMessage) {
    safe_drop_ptr(msg)
}

mod auth;
pub use auth::*;

mod sub;
pub use sub::*;

#[cfg(test)]
mod tests;
