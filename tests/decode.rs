use ofp_actions::*;

mod common;
use common::hex;

fn decode10(wire: &[u8]) -> Result<ActionBuffer, ActionError> {
    let mut out = ActionBuffer::new();
    decode_openflow10_actions(wire, wire.len(), &mut out)?;
    Ok(out)
}

fn decode11(wire: &[u8]) -> Result<ActionBuffer, ActionError> {
    let mut out = ActionBuffer::new();
    decode_openflow11_instructions(wire, wire.len(), &mut out)?;
    Ok(out)
}

#[test]
fn test_simple_output() {
    let wire = hex("0000 0008 0001 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::Output {
            port: 1,
            max_len: 0
        }]
    );
    assert_eq!(actions.to_string(), "actions=output:1");
}

#[test]
fn test_strip_vlan() {
    let wire = hex("0003 0008 0000 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(actions.iter().collect::<Vec<_>>(), vec![Ofpact::StripVlan]);
    assert_eq!(actions.to_string(), "actions=strip_vlan");
}

#[test]
fn test_output_to_bad_port() {
    // 0xff00 is OFPP_MAX itself: too large, and not reserved.
    let wire = hex("0000 0008 ff00 0000");
    assert_eq!(decode10(&wire), Err(ActionError::BadOutPort));

    let mut out = ActionBuffer::new();
    let _ = decode_openflow10_actions(&wire, wire.len(), &mut out);
    assert!(out.as_bytes().is_empty());
}

#[test]
fn test_output_to_reserved_ports() {
    let wire = hex("0000 0008 fffa 0000 0000 0008 fffd 0080");
    let actions = decode10(&wire).unwrap();
    assert_eq!(actions.to_string(), "actions=NORMAL,CONTROLLER:128");
    assert!(actions.outputs_to_port(OFPP_NORMAL));
    assert!(actions.outputs_to_port(OFPP_CONTROLLER));
    assert!(!actions.outputs_to_port(1));
}

#[test]
fn test_vendor_note() {
    // The trailing padding belongs to the note and is kept verbatim.
    let wire = hex("ffff 0010 0000 2320 0008 dead beef 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::Note(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x00])]
    );
    assert_eq!(actions.to_string(), "actions=note:de.ad.be.ef.00.00");
}

#[test]
fn test_resubmit_forms() {
    // NXAST_RESUBMIT: table id is implicitly 0xff.
    let wire = hex("ffff 0010 0000 2320 0001 0003 0000 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::Resubmit {
            in_port: 3,
            table_id: 0xff,
            compat: Compat::Resubmit,
        }]
    );
    assert_eq!(actions.to_string(), "actions=resubmit:3");

    // NXAST_RESUBMIT_TABLE carries the table id.
    let wire = hex("ffff 0010 0000 2320 000e 0003 0200 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(actions.to_string(), "actions=resubmit(3,2)");

    // Nonzero padding in the table form is rejected.
    let wire = hex("ffff 0010 0000 2320 000e 0003 0200 0001");
    assert_eq!(decode10(&wire), Err(ActionError::BadArgument));
}

#[test]
fn test_tunnel_forms() {
    let wire = hex("ffff 0010 0000 2320 0002 0000 0000 007b");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::SetTunnel {
            tun_id: 0x7b,
            compat: Compat::SetTunnel,
        }]
    );

    let wire = hex("ffff 0018 0000 2320 0009 0000 0000 0000 0000 0000 0000 007b");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::SetTunnel {
            tun_id: 0x7b,
            compat: Compat::SetTunnel64,
        }]
    );
    assert_eq!(actions.to_string(), "actions=set_tunnel64:0x7b");
}

#[test]
fn test_vendor_errors() {
    // Wrong vendor id.
    let wire = hex("ffff 0010 0000 1111 0008 dead beef 0000");
    assert_eq!(decode10(&wire), Err(ActionError::BadVendor));

    // Obsolete subtype (SNAT).
    let wire = hex("ffff 0010 0000 2320 0000 0000 0000 0000");
    assert_eq!(decode10(&wire), Err(ActionError::BadType));

    // Unknown subtype.
    let wire = hex("ffff 0010 0000 2320 4242 0000 0000 0000");
    assert_eq!(decode10(&wire), Err(ActionError::BadType));

    // Vendor action shorter than the Nicira header.
    let wire = hex("ffff 0008 0000 2320");
    assert_eq!(decode10(&wire), Err(ActionError::BadLen));
}

#[test]
fn test_unknown_action_type() {
    let wire = hex("00ff 0008 0000 0000");
    assert_eq!(decode10(&wire), Err(ActionError::BadType));
}

#[test]
fn test_length_fuzz() {
    let valid = hex("0003 0008 0000 0000 0000 0008 0001 0000");

    // A length that is not a multiple of 8.
    let mut wire = valid.clone();
    wire[3] = 0x0c;
    assert_eq!(decode10(&wire), Err(ActionError::BadLen));

    // A length that overruns the span.
    let mut wire = valid.clone();
    wire[11] = 0x10;
    assert_eq!(decode10(&wire), Err(ActionError::BadLen));

    // A zero length.
    let mut wire = valid.clone();
    wire[3] = 0x00;
    assert_eq!(decode10(&wire), Err(ActionError::BadLen));

    // Nothing from before the corruption leaks out.
    let mut out = ActionBuffer::new();
    let mut wire = valid;
    wire[11] = 0x10;
    let _ = decode_openflow10_actions(&wire, wire.len(), &mut out);
    assert!(out.as_bytes().is_empty());

    // An actions_len that is not positive, misaligned, or larger than the
    // span is rejected up front.
    let wire = hex("0003 0008 0000 0000");
    let mut out = ActionBuffer::new();
    assert_eq!(
        decode_openflow10_actions(&wire, 0, &mut out),
        Err(ActionError::BadLen)
    );
    assert_eq!(
        decode_openflow10_actions(&wire, 4, &mut out),
        Err(ActionError::BadLen)
    );
    assert_eq!(
        decode_openflow10_actions(&wire, 16, &mut out),
        Err(ActionError::BadLen)
    );
}

#[test]
fn test_reserved_bits_rejected() {
    // VLAN vid with bits above the 12-bit field.
    let wire = hex("0001 0008 1fff 0000");
    assert_eq!(decode10(&wire), Err(ActionError::BadArgument));

    // VLAN pcp with bits above the 3-bit field.
    let wire = hex("0002 0008 09 000000");
    assert_eq!(decode10(&wire), Err(ActionError::BadArgument));

    // nw_tos with the ECN bits set.
    let wire = hex("0008 0008 03 000000");
    assert_eq!(decode10(&wire), Err(ActionError::BadArgument));

    // A record before the offender does not leak into the output.
    let mut wire = hex("0003 0008 0000 0000");
    wire.extend_from_slice(&hex("0001 0008 1fff 0000"));
    let mut out = ActionBuffer::new();
    assert_eq!(
        decode_openflow10_actions(&wire, wire.len(), &mut out),
        Err(ActionError::BadArgument)
    );
    assert!(out.as_bytes().is_empty());
}

#[test]
fn test_enqueue() {
    let wire = hex("000b 0010 0001 0000 0000 0000 0000 0005");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::Enqueue { port: 1, queue: 5 }]
    );
    assert_eq!(actions.to_string(), "actions=enqueue:1q5");
    assert!(actions.outputs_to_port(1));

    // Only regular ports, IN_PORT, and LOCAL may be enqueued to.
    let wire = hex("000b 0010 fffa 0000 0000 0000 0000 0005");
    assert_eq!(decode10(&wire), Err(ActionError::BadOutPort));
}

#[test]
fn test_output_reg() {
    let wire = hex("ffff 0018 0000 2320 000f 001f 0001 0004 0080 0000 0000 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(actions.to_string(), "actions=output:NXM_NX_REG0[]");

    // The reserved zero field must be zero.
    let wire = hex("ffff 0018 0000 2320 000f 001f 0001 0004 0080 0000 0000 0001");
    assert_eq!(decode10(&wire), Err(ActionError::BadArgument));
}

#[test]
fn test_mixed_stream() {
    let wire = hex(
        "0004 0010 aabb ccdd eeff 0000 0000 0000
         0000 0008 0002 0000",
    );
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.to_string(),
        "actions=mod_dl_src:aa:bb:cc:dd:ee:ff,output:2"
    );

    // Two decodes of the same wire input are byte-identical streams.
    let again = decode10(&wire).unwrap();
    assert_eq!(actions, again);
}

#[test]
fn test_instructions_goto_table_unsupported() {
    let wire = hex("0001 0008 0100 0000");
    assert_eq!(decode11(&wire), Err(ActionError::UnsupInst));
}

#[test]
fn test_instructions_duplicate() {
    let wire = hex("0004 0008 0000 0000 0004 0008 0000 0000");
    assert_eq!(decode11(&wire), Err(ActionError::DupType));
}

#[test]
fn test_instructions_unknown_and_experimenter() {
    let wire = hex("0009 0008 0000 0000");
    assert_eq!(decode11(&wire), Err(ActionError::UnknownInst));

    let wire = hex("ffff 0008 0000 0000");
    assert_eq!(decode11(&wire), Err(ActionError::BadExperimenter));
}

#[test]
fn test_instructions_apply_actions() {
    // An apply-actions instruction holding an OF1.1 output to FLOOD.
    let wire = hex(
        "0004 0018 0000 0000
         0000 0010 ffff fffb 0040 0000 0000 0000",
    );
    let actions = decode11(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::Output {
            port: OFPP_FLOOD,
            max_len: 0x40
        }]
    );

    // The same span with apply-actions plus goto-table decodes the actions
    // and then throws them away.
    let mut wire = wire;
    wire.extend_from_slice(&hex("0001 0008 0100 0000"));
    let mut out = ActionBuffer::new();
    assert_eq!(
        decode_openflow11_instructions(&wire, wire.len(), &mut out),
        Err(ActionError::UnsupInst)
    );
    assert!(out.as_bytes().is_empty());
}

#[test]
fn test_instructions_bad_output_port() {
    // An OF1.1 port in the dead zone between the ranges.
    let wire = hex(
        "0004 0018 0000 0000
         0000 0010 0001 0000 0040 0000 0000 0000",
    );
    assert_eq!(decode11(&wire), Err(ActionError::BadOutPort));
}

#[test]
fn test_pop_vlan() {
    let wire = hex(
        "0004 0010 0000 0000
         0012 0008 0000 0000",
    );
    let actions = decode11(&wire).unwrap();
    assert_eq!(actions.iter().collect::<Vec<_>>(), vec![Ofpact::StripVlan]);
}

#[test]
fn test_controller_action() {
    let wire = hex("ffff 0010 0000 2320 0014 0080 0005 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.iter().collect::<Vec<_>>(),
        vec![Ofpact::Controller {
            max_len: 128,
            controller_id: 5,
            reason: ControllerReason::NoMatch,
        }]
    );
    assert!(actions.outputs_to_port(OFPP_CONTROLLER));
}

#[test]
fn test_fin_timeout() {
    let wire = hex("ffff 0010 0000 2320 0013 000a 0014 0000");
    let actions = decode10(&wire).unwrap();
    assert_eq!(
        actions.to_string(),
        "actions=fin_timeout(idle_timeout=10,hard_timeout=20)"
    );
}
