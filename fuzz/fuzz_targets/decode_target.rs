#![no_main]

use libfuzzer_sys::fuzz_target;

use ofp_actions::{
    check_actions, decode_openflow10_actions, decode_openflow11_instructions,
    encode_openflow10_actions, ActionBuffer, Flow, OFPP_MAX,
};

fuzz_target!(|data: &[u8]| {
    let len = data.len() & !7;

    // Either dialect must reject or fully consume arbitrary input, and a
    // failed decode must leave the buffer empty.
    let mut actions = ActionBuffer::new();
    if decode_openflow10_actions(data, len, &mut actions).is_err() {
        assert!(actions.as_bytes().is_empty());
    } else {
        // Whatever decodes must validate, re-encode, and decode again to
        // the identical stream.
        let _ = check_actions(&actions, &Flow::default(), OFPP_MAX);
        let mut wire = Vec::new();
        encode_openflow10_actions(&actions, &mut wire).expect("re-encoding decoded actions");
        let mut again = ActionBuffer::new();
        decode_openflow10_actions(&wire, wire.len(), &mut again)
            .expect("decoding re-encoded actions");
        assert_eq!(actions, again);
    }

    let mut actions = ActionBuffer::new();
    if decode_openflow11_instructions(data, len, &mut actions).is_err() {
        assert!(actions.as_bytes().is_empty());
    }
});
