use core::slice;

use super::*;

fn c_string(s: &str) -> CString {
    CString::new(s).expect("test strings hold no nul byte")
}

unsafe fn payload(buffer: &Buffer) -> &[u8] {
    slice::from_raw_parts(buffer.ptr, buffer.size)
}

#[test]
fn author_and_subscriber_exchange_packets() {
    let encoding = c_string("utf-8");
    let author_seed = c_string("AUTHOR9SEED");
    let subscriber_seed = c_string("SUBSCRIBERA9SEED");
    let public_payload = c_string("A public payload");
    let masked_payload = c_string("A private payload");

    unsafe {
        let tsp = tsp_new();
        let auth = auth_new(author_seed.as_ptr(), encoding.as_ptr(), 1024, 1, tsp);
        assert!(!auth.is_null());
        assert_eq!(auth_is_multi_branching(auth), 1);

        let appinst_str = get_appinst_str(auth_channel_address(auth));
        let appinst = CStr::from_ptr(appinst_str).to_str().expect("hex is utf-8").to_string();
        let ann_link = auth_announce(auth);
        assert!(!ann_link.is_null());
        let ann_link_str = get_address_str(ann_link);
        let ann_link_string = CStr::from_ptr(ann_link_str).to_str().expect("hex is utf-8");
        assert!(ann_link_string.starts_with(&appinst));
        let parsed = address_from_string(ann_link_str);
        assert_eq!(*parsed, *ann_link);

        let ann_packet = get_transaction(ann_link, tsp);
        let sub = sub_new(subscriber_seed.as_ptr(), encoding.as_ptr(), 1024, tsp);
        assert_eq!(sub_unwrap_announce(sub, ann_packet), Err::Ok);
        let sub_link = sub_subscribe(sub, ann_link);
        assert!(!sub_link.is_null());
        let sub_packet = get_transaction(sub_link, tsp);
        assert_eq!(auth_unwrap_subscribe(auth, sub_packet), Err::Ok);

        let keyload_links = auth_share_keyload_for_everyone(auth, ann_link);
        let keyload_packet = get_transaction(get_msg_link(keyload_links), tsp);
        assert_eq!(sub_receive_keyload(sub, keyload_packet), Err::Ok);

        let tagged_links = auth_tag_packet(auth, keyload_links, public_payload.as_ptr(), masked_payload.as_ptr());
        let signed_links = auth_sign_packet(auth, tagged_links, public_payload.as_ptr(), masked_payload.as_ptr());
        assert!(!signed_links.is_null());

        let tagged_packet = get_transaction(get_msg_link(tagged_links), tsp);
        let tagged = sub_receive_packet(sub, tagged_packet);
        assert!(!tagged.is_null());
        let signed_packet = get_transaction(get_msg_link(signed_links), tsp);
        let signed = sub_receive_packet(sub, signed_packet);
        assert!(!signed.is_null());

        let payloads = get_payload(signed);
        assert_eq!(payload(&payloads.public_payload), b"A public payload");
        assert_eq!(payload(&payloads.masked_payload), b"A private payload");
        drop_payloads(payloads);

        for message in [tagged, signed] {
            drop_unwrapped_message(message);
        }
        for transaction in [ann_packet, sub_packet, keyload_packet, tagged_packet, signed_packet] {
            drop_transaction(transaction);
        }
        for links in [keyload_links, tagged_links, signed_links] {
            drop_links(links);
        }
        for address in [ann_link, sub_link, parsed] {
            drop_address(address);
        }
        drop_str(appinst_str);
        drop_str(ann_link_str);
        sub_drop(sub);
        auth_drop(auth);
        tsp_drop(tsp);
    }
}

#[test]
fn invalid_arguments_are_reported_without_panicking() {
    let encoding = c_string("utf-8");
    let seed = c_string("AUTHOR9SEED");
    let ascii = c_string("ascii");

    unsafe {
        let tsp = tsp_new();
        assert!(auth_new(null(), encoding.as_ptr(), 1024, 1, tsp).is_null());
        assert!(auth_new(seed.as_ptr(), ascii.as_ptr(), 1024, 1, tsp).is_null());
        assert!(sub_new(seed.as_ptr(), encoding.as_ptr(), 1024, null_mut()).is_null());
        assert!(auth_announce(null_mut()).is_null());
        assert_eq!(sub_unwrap_announce(null_mut(), null()), Err::NullArgument);
        assert!(get_payload(null()).public_payload.ptr.is_null());
        assert!(address_from_string(encoding.as_ptr()).is_null());

        let auth = auth_new(seed.as_ptr(), encoding.as_ptr(), 1024, 0, tsp);
        let ann_link = auth_announce(auth);
        let ann_packet = get_transaction(ann_link, tsp);
        assert_eq!(auth_unwrap_subscribe(auth, ann_packet), Err::BadArgument);
        // A second announcement at the same address is refused
        assert!(auth_announce(auth).is_null());

        let sub = sub_new(c_string("SUBSCRIBER").as_ptr(), encoding.as_ptr(), 1024, tsp);
        assert!(sub_subscribe(sub, ann_link).is_null());

        drop_transaction(ann_packet);
        drop_address(ann_link);
        sub_drop(sub);
        auth_drop(auth);
        tsp_drop(tsp);
    }
}
