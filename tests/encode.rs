use ofp_actions::*;

mod common;
use common::hex;

fn decode10(wire: &[u8]) -> ActionBuffer {
    let mut out = ActionBuffer::new();
    decode_openflow10_actions(wire, wire.len(), &mut out).expect("decoding OF1.0 actions");
    out
}

fn encode10(actions: &ActionBuffer) -> Vec<u8> {
    let mut out = Vec::new();
    encode_openflow10_actions(actions, &mut out).expect("encoding OF1.0 actions");
    out
}

#[test]
fn test_simple_output_round_trip() {
    let wire = hex("0000 0008 0001 0000");
    let actions = decode10(&wire);
    assert_eq!(encode10(&actions), wire);
}

#[test]
fn test_native_actions_round_trip() {
    let wire = hex(
        "0001 0008 0123 0000
         0002 0008 05 000000
         0003 0008 0000 0000
         0004 0010 aabb ccdd eeff 0000 0000 0000
         0006 0008 0a00 0001
         0008 0008 b8 000000
         0009 0008 1f90 0000
         000b 0010 0002 0000 0000 0000 0000 0007
         0000 0008 0001 0000",
    );
    let actions = decode10(&wire);
    let encoded = encode10(&actions);
    assert_eq!(encoded, wire);

    // And the re-encoded bytes decode to a byte-identical stream.
    assert_eq!(decode10(&encoded), actions);
}

#[test]
fn test_vendor_actions_round_trip() {
    let wire = hex(
        "ffff 0010 0000 2320 0001 0003 0000 0000
         ffff 0010 0000 2320 0004 0000 0000 0001
         ffff 0010 0000 2320 0005 0000 0000 0000
         ffff 0018 0000 2320 0006 0010 0000 0000 0001 0004 0001 0204
         ffff 0018 0000 2320 0007 000f 0001 0004 0000 0000 0000 002a
         ffff 0010 0000 2320 0008 dead beef 0000
         ffff 0010 0000 2320 0011 0000 0000 0000
         ffff 0010 0000 2320 0012 0000 0000 0000
         ffff 0010 0000 2320 0013 000a 0000 0000
         ffff 0010 0000 2320 0014 0080 0001 0100",
    );
    let actions = decode10(&wire);
    let encoded = encode10(&actions);
    assert_eq!(encoded, wire);
    assert_eq!(decode10(&encoded), actions);
}

#[test]
fn test_tunnel_provenance() {
    // A 32-bit wire form stays 32-bit.
    let wire32 = hex("ffff 0010 0000 2320 0002 0000 0000 007b");
    assert_eq!(encode10(&decode10(&wire32)), wire32);

    // A 64-bit wire form stays 64-bit even though the id fits in 32 bits.
    let wire64 = hex("ffff 0018 0000 2320 0009 0000 0000 0000 0000 0000 0000 007b");
    assert_eq!(encode10(&decode10(&wire64)), wire64);

    // Without provenance, a small id picks the 32-bit form and a large one
    // the 64-bit form.
    let actions = ActionBuffer::from_actions(&[Ofpact::SetTunnel {
        tun_id: 0x7b,
        compat: Compat::None,
    }])
    .unwrap();
    assert_eq!(encode10(&actions), wire32);

    let actions = ActionBuffer::from_actions(&[Ofpact::SetTunnel {
        tun_id: 0x1_0000_0000,
        compat: Compat::None,
    }])
    .unwrap();
    assert_eq!(
        encode10(&actions),
        hex("ffff 0018 0000 2320 0009 0000 0000 0000 0000 0001 0000 0000")
    );
}

#[test]
fn test_resubmit_provenance() {
    // The table form with table 0xff stays in the table form.
    let wire = hex("ffff 0010 0000 2320 000e 0003 ff00 0000");
    assert_eq!(encode10(&decode10(&wire)), wire);

    // The short form stays short.
    let wire = hex("ffff 0010 0000 2320 0001 0003 0000 0000");
    assert_eq!(encode10(&decode10(&wire)), wire);

    // A programmatic resubmit with a concrete table picks the table form.
    let actions = ActionBuffer::from_actions(&[Ofpact::Resubmit {
        in_port: 3,
        table_id: 2,
        compat: Compat::None,
    }])
    .unwrap();
    assert_eq!(
        encode10(&actions),
        hex("ffff 0010 0000 2320 000e 0003 0200 0000")
    );
}

#[test]
fn test_note_padding_is_patched() {
    // A 4-byte note pads out to a 16-byte action with the length patched
    // after the payload is written.
    let actions = ActionBuffer::from_actions(&[Ofpact::Note(vec![0xde, 0xad, 0xbe, 0xef])]).unwrap();
    let wire = encode10(&actions);
    assert_eq!(wire, hex("ffff 0010 0000 2320 0008 dead beef 0000"));

    // An 11-byte note needs a 24-byte action.
    let actions =
        ActionBuffer::from_actions(&[Ofpact::Note(b"hello world".to_vec())]).unwrap();
    let wire = encode10(&actions);
    assert_eq!(wire.len(), 24);
    assert_eq!(&wire[2..4], &[0x00, 0x18]);
    assert_eq!(&wire[10..21], b"hello world");
    assert_eq!(&wire[21..24], &[0, 0, 0]);
}

#[test]
fn test_controller_forms() {
    // The default form is a plain output to the controller port.
    let actions = ActionBuffer::from_actions(&[Ofpact::Controller {
        max_len: 0x80,
        controller_id: 0,
        reason: ControllerReason::Action,
    }])
    .unwrap();
    assert_eq!(encode10(&actions), hex("0000 0008 fffd 0080"));

    // Anything else needs the vendor action.
    let actions = ActionBuffer::from_actions(&[Ofpact::Controller {
        max_len: 0x80,
        controller_id: 7,
        reason: ControllerReason::InvalidTtl,
    }])
    .unwrap();
    assert_eq!(
        encode10(&actions),
        hex("ffff 0010 0000 2320 0014 0080 0007 0200")
    );
}

#[test]
fn test_learn_round_trip() {
    let wire = hex(
        "ffff 0038 0000 2320 0010
         000a 0000 0064
         0000 0000 0000 0000
         0001 01 00 0000 0000
         000c 0000 0802 0000 0000 0802 0000
         1010 0000 0002 0000
         0000",
    );
    let actions = decode10(&wire);
    assert_eq!(encode10(&actions), wire);

    let rendered = actions.to_string();
    assert!(rendered.starts_with("actions=learn(table=1,idle_timeout=10,"));
    assert!(rendered.contains("NXM_OF_VLAN_TCI[0..11]"));
    assert!(rendered.contains("output:NXM_OF_IN_PORT[]"));
}

#[test]
fn test_bundle_round_trip() {
    let wire = hex(
        "ffff 0028 0000 2320 000c
         0001 0000 0000
         0000 0002
         0002 0000 0000 0000
         0000 0000
         0001 0002 0000 0000",
    );
    let actions = decode10(&wire);
    assert_eq!(encode10(&actions), wire);
    assert_eq!(
        actions.to_string(),
        "actions=bundle(eth_src,0,hrw,ofport,slaves:1,2)"
    );
}

#[test]
fn test_multipath_and_autopath_round_trip() {
    let wire = hex(
        "ffff 0020 0000 2320 000a
         0000 0032 0000 0001 000f 0000 0000 0000 0007 0001 0004
         ffff 0018 0000 2320 000b
         000f 0001 0204 0000 0007 0000 0000",
    );
    let actions = decode10(&wire);
    assert_eq!(encode10(&actions), wire);
}

#[test]
fn test_empty_stream_encodes_to_nothing() {
    let actions = ActionBuffer::from_actions(&[]).unwrap();
    assert!(encode10(&actions).is_empty());

    let mut wire = Vec::new();
    encode_openflow11_instructions(&actions, &mut wire, InstructionType::ApplyActions).unwrap();
    assert!(wire.is_empty());
}

#[test]
fn test_instruction_wrap_layout() {
    let actions = ActionBuffer::from_actions(&[Ofpact::Output {
        port: OFPP_LOCAL,
        max_len: 0,
    }])
    .unwrap();
    let mut wire = Vec::new();
    encode_openflow11_instructions(&actions, &mut wire, InstructionType::ApplyActions).unwrap();
    assert_eq!(
        wire,
        hex(
            "0004 0018 0000 0000
             0000 0010 ffff fffe 0000 0000 0000 0000"
        )
    );

    // Only apply-actions is supported as a wrapper.
    let mut out = Vec::new();
    assert_eq!(
        encode_openflow11_instructions(&actions, &mut out, InstructionType::WriteActions),
        Err(ActionError::UnsupInst)
    );
}

#[test]
fn test_openflow11_round_trip() {
    let actions = ActionBuffer::from_actions(&[
        Ofpact::SetVlanVid(0x123),
        Ofpact::StripVlan,
        Ofpact::SetEthDst([1, 2, 3, 4, 5, 6]),
        Ofpact::Output {
            port: 2,
            max_len: 0,
        },
        Ofpact::Resubmit {
            in_port: 1,
            table_id: 0xff,
            compat: Compat::None,
        },
    ])
    .unwrap();

    let mut wire = Vec::new();
    encode_openflow11_instructions(&actions, &mut wire, InstructionType::ApplyActions).unwrap();
    let mut back = ActionBuffer::new();
    decode_openflow11_instructions(&wire, wire.len(), &mut back).unwrap();
    assert_eq!(back, actions);
}
