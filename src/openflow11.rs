//! The OpenFlow 1.1 action and instruction codec.
//!
//! OpenFlow 1.1 wraps actions in instructions. Only the `APPLY_ACTIONS`
//! instruction is supported: its action list decodes into the same internal
//! records as the 1.0 dialect, with 32-bit port numbers bridged down to the
//! internal 16-bit space.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};

use std::io::Cursor;
use std::net::Ipv4Addr;

use crate::nicira;
use crate::ofpact::{ActionBuffer, ControllerReason, Ofpact};
use crate::openflow10::IP_DSCP_MASK;
use crate::util::{TlvWalker, BAD_WIRE};
use crate::{
    check_output_port, port_from_ofp11, port_to_ofp11, ActionError, OFPP_CONTROLLER, OFPP_MAX,
};

const OFPAT11_OUTPUT: u16 = 0;
const OFPAT11_SET_VLAN_VID: u16 = 1;
const OFPAT11_SET_VLAN_PCP: u16 = 2;
const OFPAT11_SET_DL_SRC: u16 = 3;
const OFPAT11_SET_DL_DST: u16 = 4;
const OFPAT11_SET_NW_SRC: u16 = 5;
const OFPAT11_SET_NW_DST: u16 = 6;
const OFPAT11_SET_NW_TOS: u16 = 7;
const OFPAT11_SET_TP_SRC: u16 = 9;
const OFPAT11_SET_TP_DST: u16 = 10;
const OFPAT11_POP_VLAN: u16 = 18;

const OFPIT11_GOTO_TABLE: u16 = 1;
const OFPIT11_WRITE_METADATA: u16 = 2;
const OFPIT11_WRITE_ACTIONS: u16 = 3;
const OFPIT11_APPLY_ACTIONS: u16 = 4;
const OFPIT11_CLEAR_ACTIONS: u16 = 5;
const OFPIT11_EXPERIMENTER: u16 = 0xffff;

/// Size of the instruction header: type, len, and a pad word.
const INSTRUCTION_HEADER_LEN: usize = 8;

/// The OpenFlow 1.1 instruction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionType {
    /// Jump to a later flow table.
    GotoTable,
    /// Update the metadata register.
    WriteMetadata,
    /// Merge actions into the action set.
    WriteActions,
    /// Apply actions immediately.
    ApplyActions,
    /// Clear the action set.
    ClearActions,
}

impl InstructionType {
    fn from_wire(typ: u16) -> Result<InstructionType, ActionError> {
        match typ {
            OFPIT11_GOTO_TABLE => Ok(InstructionType::GotoTable),
            OFPIT11_WRITE_METADATA => Ok(InstructionType::WriteMetadata),
            OFPIT11_WRITE_ACTIONS => Ok(InstructionType::WriteActions),
            OFPIT11_APPLY_ACTIONS => Ok(InstructionType::ApplyActions),
            OFPIT11_CLEAR_ACTIONS => Ok(InstructionType::ClearActions),
            OFPIT11_EXPERIMENTER => Err(ActionError::BadExperimenter),
            _ => {
                if BAD_WIRE.should_log() {
                    log::warn!("unknown OpenFlow 1.1 instruction type {}", typ);
                }
                Err(ActionError::UnknownInst)
            }
        }
    }

    fn index(self) -> usize {
        match self {
            InstructionType::GotoTable => 0,
            InstructionType::WriteMetadata => 1,
            InstructionType::WriteActions => 2,
            InstructionType::ApplyActions => 3,
            InstructionType::ClearActions => 4,
        }
    }
}

/// Parses `instructions_len` bytes of OpenFlow 1.1 instructions from `data`
/// into `out`.
///
/// Exactly one instruction kind is supported, `APPLY_ACTIONS`; its action
/// list becomes the decoded stream. Any other known kind fails with
/// `UnsupInst` after the walk, duplicates fail with `DupType`, and unknown
/// or experimenter kinds fail with their own errors. On any failure `out` is
/// left empty.
pub fn decode_openflow11_instructions(
    data: &[u8],
    instructions_len: usize,
    out: &mut ActionBuffer,
) -> Result<(), ActionError> {
    decode_instructions(data, instructions_len, out).map_err(|e| {
        out.clear();
        e
    })
}

fn decode_instructions(
    data: &[u8],
    instructions_len: usize,
    out: &mut ActionBuffer,
) -> Result<(), ActionError> {
    if instructions_len == 0 {
        return Err(ActionError::BadLen);
    }

    // One slot per instruction kind, first occurrence wins, duplicates are
    // fatal.
    let mut instructions: [Option<&[u8]>; 5] = [None; 5];
    let mut walker = TlvWalker::new(data, instructions_len)?;
    while let Some((typ, record)) = walker.next()? {
        let kind = InstructionType::from_wire(typ)?;
        let slot = &mut instructions[kind.index()];
        if slot.is_some() {
            return Err(ActionError::DupType);
        }
        *slot = Some(record);
    }

    if let Some(record) = instructions[InstructionType::ApplyActions.index()] {
        let actions = &record[INSTRUCTION_HEADER_LEN..];
        decode_action_span(actions, out)?;
    }

    // Everything but APPLY_ACTIONS is rejected, discarding whatever the
    // apply decode produced.
    let unsupported = [
        InstructionType::GotoTable,
        InstructionType::WriteMetadata,
        InstructionType::WriteActions,
        InstructionType::ClearActions,
    ];
    if unsupported.iter().any(|k| instructions[k.index()].is_some()) {
        out.clear();
        return Err(ActionError::UnsupInst);
    }

    out.finish()
}

/// Decodes a raw OpenFlow 1.1 action span, without terminating or clearing
/// `out`.
fn decode_action_span(data: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let mut walker = TlvWalker::new(data, data.len())?;
    while let Some((typ, record)) = walker.next()? {
        decode_action(typ, record, out)?;
    }
    Ok(())
}

fn decode_action(typ: u16, record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    if typ == nicira::OFPAT_VENDOR {
        // OpenFlow 1.1 calls it "experimenter", but the layout matches.
        return nicira::decode_vendor(record, out);
    }

    let expected_len = match typ {
        OFPAT11_OUTPUT => 16,
        OFPAT11_SET_VLAN_VID => 8,
        OFPAT11_SET_VLAN_PCP => 8,
        OFPAT11_SET_DL_SRC | OFPAT11_SET_DL_DST => 16,
        OFPAT11_SET_NW_SRC | OFPAT11_SET_NW_DST => 8,
        OFPAT11_SET_NW_TOS => 8,
        OFPAT11_SET_TP_SRC | OFPAT11_SET_TP_DST => 8,
        OFPAT11_POP_VLAN => 8,
        _ => {
            if BAD_WIRE.should_log() {
                log::warn!("unknown OpenFlow 1.1 action type {}", typ);
            }
            return Err(ActionError::BadType);
        }
    };
    if record.len() != expected_len {
        return Err(ActionError::BadLen);
    }

    let mut cur = Cursor::new(&record[4..]);
    match typ {
        OFPAT11_OUTPUT => {
            let port = port_from_ofp11(cur.read_u32::<BigEndian>()?)?;
            let max_len = cur.read_u16::<BigEndian>()?;
            check_output_port(port, OFPP_MAX)?;
            if port == OFPP_CONTROLLER {
                out.push(&Ofpact::Controller {
                    max_len,
                    controller_id: 0,
                    reason: ControllerReason::Action,
                })
            } else {
                out.push(&Ofpact::Output { port, max_len })
            }
        }
        OFPAT11_SET_VLAN_VID => {
            let vid = cur.read_u16::<BigEndian>()?;
            if vid & !0xfff != 0 {
                return Err(ActionError::BadArgument);
            }
            out.push(&Ofpact::SetVlanVid(vid))
        }
        OFPAT11_SET_VLAN_PCP => {
            let pcp = cur.read_u8()?;
            if pcp & !7 != 0 {
                return Err(ActionError::BadArgument);
            }
            out.push(&Ofpact::SetVlanPcp(pcp))
        }
        OFPAT11_SET_DL_SRC | OFPAT11_SET_DL_DST => {
            let mut mac = [0; 6];
            std::io::Read::read_exact(&mut cur, &mut mac)?;
            if typ == OFPAT11_SET_DL_SRC {
                out.push(&Ofpact::SetEthSrc(mac))
            } else {
                out.push(&Ofpact::SetEthDst(mac))
            }
        }
        OFPAT11_SET_NW_SRC | OFPAT11_SET_NW_DST => {
            let addr = Ipv4Addr::from(cur.read_u32::<BigEndian>()?);
            if typ == OFPAT11_SET_NW_SRC {
                out.push(&Ofpact::SetIpv4Src(addr))
            } else {
                out.push(&Ofpact::SetIpv4Dst(addr))
            }
        }
        OFPAT11_SET_NW_TOS => {
            let tos = cur.read_u8()?;
            if tos & !IP_DSCP_MASK != 0 {
                return Err(ActionError::BadArgument);
            }
            out.push(&Ofpact::SetIpv4Dscp(tos))
        }
        OFPAT11_SET_TP_SRC | OFPAT11_SET_TP_DST => {
            let port = cur.read_u16::<BigEndian>()?;
            if typ == OFPAT11_SET_TP_SRC {
                out.push(&Ofpact::SetL4SrcPort(port))
            } else {
                out.push(&Ofpact::SetL4DstPort(port))
            }
        }
        OFPAT11_POP_VLAN => out.push(&Ofpact::StripVlan),
        _ => Err(ActionError::BadType),
    }
}

/// Encodes an internal action stream as one OpenFlow 1.1 `APPLY_ACTIONS`
/// instruction appended to `out`.
///
/// `kind` names the instruction to wrap the actions in; only
/// [`InstructionType::ApplyActions`] is supported, anything else fails with
/// `UnsupInst`. An empty stream emits nothing. `Enqueue` has no OpenFlow 1.1
/// encoding and fails with `BadType`.
pub fn encode_openflow11_instructions(
    actions: &ActionBuffer,
    out: &mut Vec<u8>,
    kind: InstructionType,
) -> Result<(), ActionError> {
    if kind != InstructionType::ApplyActions {
        return Err(ActionError::UnsupInst);
    }
    if actions.is_empty() {
        return Ok(());
    }

    // Reserve the instruction header, emit the actions, then patch the
    // header once the total length is known.
    let start = out.len();
    out.extend_from_slice(&[0; INSTRUCTION_HEADER_LEN]);
    for action in actions {
        encode_action(&action, out)?;
    }
    let total = out.len() - start;
    if total > usize::from(u16::max_value()) {
        return Err(ActionError::BadLen);
    }
    BigEndian::write_u16(&mut out[start..start + 2], OFPIT11_APPLY_ACTIONS);
    BigEndian::write_u16(&mut out[start + 2..start + 4], total as u16);
    Ok(())
}

fn put_header(out: &mut Vec<u8>, typ: u16, len: u16) -> Result<(), ActionError> {
    out.write_u16::<BigEndian>(typ)?;
    out.write_u16::<BigEndian>(len)?;
    Ok(())
}

fn encode_action(action: &Ofpact, out: &mut Vec<u8>) -> Result<(), ActionError> {
    match action {
        Ofpact::Output { port, max_len } => {
            put_header(out, OFPAT11_OUTPUT, 16)?;
            out.write_u32::<BigEndian>(port_to_ofp11(*port))?;
            out.write_u16::<BigEndian>(*max_len)?;
            out.extend_from_slice(&[0; 6]);
        }
        // There is no OpenFlow 1.1 equivalent of the enqueue action.
        Ofpact::Enqueue { .. } => return Err(ActionError::BadType),
        Ofpact::SetVlanVid(vid) => {
            put_header(out, OFPAT11_SET_VLAN_VID, 8)?;
            out.write_u16::<BigEndian>(*vid)?;
            out.write_u16::<BigEndian>(0)?;
        }
        Ofpact::SetVlanPcp(pcp) => {
            put_header(out, OFPAT11_SET_VLAN_PCP, 8)?;
            out.write_u8(*pcp)?;
            out.extend_from_slice(&[0; 3]);
        }
        Ofpact::StripVlan => {
            put_header(out, OFPAT11_POP_VLAN, 8)?;
            out.write_u32::<BigEndian>(0)?;
        }
        Ofpact::SetEthSrc(mac) | Ofpact::SetEthDst(mac) => {
            let typ = if let Ofpact::SetEthSrc(_) = action {
                OFPAT11_SET_DL_SRC
            } else {
                OFPAT11_SET_DL_DST
            };
            put_header(out, typ, 16)?;
            out.extend_from_slice(mac);
            out.extend_from_slice(&[0; 6]);
        }
        Ofpact::SetIpv4Src(addr) | Ofpact::SetIpv4Dst(addr) => {
            let typ = if let Ofpact::SetIpv4Src(_) = action {
                OFPAT11_SET_NW_SRC
            } else {
                OFPAT11_SET_NW_DST
            };
            put_header(out, typ, 8)?;
            out.extend_from_slice(&addr.octets());
        }
        Ofpact::SetIpv4Dscp(dscp) => {
            put_header(out, OFPAT11_SET_NW_TOS, 8)?;
            out.write_u8(*dscp)?;
            out.extend_from_slice(&[0; 3]);
        }
        Ofpact::SetL4SrcPort(port) | Ofpact::SetL4DstPort(port) => {
            let typ = if let Ofpact::SetL4SrcPort(_) = action {
                OFPAT11_SET_TP_SRC
            } else {
                OFPAT11_SET_TP_DST
            };
            put_header(out, typ, 8)?;
            out.write_u16::<BigEndian>(*port)?;
            out.write_u16::<BigEndian>(0)?;
        }
        _ => nicira::encode_vendor(action, out)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(typ: u16, body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&typ.to_be_bytes());
        data.extend_from_slice(&((body.len() + 8) as u16).to_be_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_goto_table_is_unsupported() {
        let data = instruction(OFPIT11_GOTO_TABLE, &[]);
        let mut out = ActionBuffer::new();
        assert_eq!(
            decode_openflow11_instructions(&data, data.len(), &mut out),
            Err(ActionError::UnsupInst)
        );
        assert!(out.as_bytes().is_empty());
    }

    #[test]
    fn test_duplicate_apply_actions() {
        let mut data = instruction(OFPIT11_APPLY_ACTIONS, &[]);
        data.extend_from_slice(&instruction(OFPIT11_APPLY_ACTIONS, &[]));
        let mut out = ActionBuffer::new();
        assert_eq!(
            decode_openflow11_instructions(&data, data.len(), &mut out),
            Err(ActionError::DupType)
        );
    }

    #[test]
    fn test_apply_actions_with_output() {
        // OFPAT11_OUTPUT to port 6, max_len 0.
        let action = [
            0x00, 0x00, 0x00, 0x10, //
            0x00, 0x00, 0x00, 0x06, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let data = instruction(OFPIT11_APPLY_ACTIONS, &action);
        let mut out = ActionBuffer::new();
        decode_openflow11_instructions(&data, data.len(), &mut out).unwrap();
        assert_eq!(
            out.iter().collect::<Vec<_>>(),
            vec![Ofpact::Output {
                port: 6,
                max_len: 0
            }]
        );
    }

    #[test]
    fn test_encode_round_trip() {
        let actions = ActionBuffer::from_actions(&[
            Ofpact::Output {
                port: 6,
                max_len: 0,
            },
            Ofpact::StripVlan,
        ])
        .unwrap();
        let mut wire = Vec::new();
        encode_openflow11_instructions(&actions, &mut wire, InstructionType::ApplyActions).unwrap();
        let mut back = ActionBuffer::new();
        decode_openflow11_instructions(&wire, wire.len(), &mut back).unwrap();
        assert_eq!(back, actions);
    }

    #[test]
    fn test_enqueue_has_no_encoding() {
        let actions = ActionBuffer::from_actions(&[Ofpact::Enqueue { port: 1, queue: 2 }]).unwrap();
        let mut wire = Vec::new();
        assert_eq!(
            encode_openflow11_instructions(&actions, &mut wire, InstructionType::ApplyActions),
            Err(ActionError::BadType)
        );
    }
}
