//! The OpenFlow 1.0 action codec.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::io::Cursor;
use std::net::Ipv4Addr;

use crate::nicira;
use crate::ofpact::{ActionBuffer, ControllerReason, Ofpact};
use crate::util::{TlvWalker, BAD_WIRE};
use crate::{check_output_port, ActionError, OFPP_CONTROLLER, OFPP_IN_PORT, OFPP_LOCAL, OFPP_MAX};

const OFPAT10_OUTPUT: u16 = 0;
const OFPAT10_SET_VLAN_VID: u16 = 1;
const OFPAT10_SET_VLAN_PCP: u16 = 2;
const OFPAT10_STRIP_VLAN: u16 = 3;
const OFPAT10_SET_DL_SRC: u16 = 4;
const OFPAT10_SET_DL_DST: u16 = 5;
const OFPAT10_SET_NW_SRC: u16 = 6;
const OFPAT10_SET_NW_DST: u16 = 7;
const OFPAT10_SET_NW_TOS: u16 = 8;
const OFPAT10_SET_TP_SRC: u16 = 9;
const OFPAT10_SET_TP_DST: u16 = 10;
const OFPAT10_ENQUEUE: u16 = 11;

/// The 6 DSCP bits of the IP ToS byte; the low 2 bits are ECN.
pub(crate) const IP_DSCP_MASK: u8 = 0xfc;

/// Parses `actions_len` bytes of OpenFlow 1.0 actions from `data` into
/// `out`.
///
/// `actions_len` must be a positive multiple of 8 no larger than the span.
/// On success `out` holds the decoded records and is terminated; on failure
/// `out` is empty and the first error is returned.
pub fn decode_openflow10_actions(
    data: &[u8],
    actions_len: usize,
    out: &mut ActionBuffer,
) -> Result<(), ActionError> {
    decode_all(data, actions_len, out).map_err(|e| {
        out.clear();
        e
    })
}

fn decode_all(
    data: &[u8],
    actions_len: usize,
    out: &mut ActionBuffer,
) -> Result<(), ActionError> {
    if actions_len == 0 {
        return Err(ActionError::BadLen);
    }
    let mut walker = TlvWalker::new(data, actions_len)?;
    while let Some((typ, record)) = walker.next()? {
        decode_action(typ, record, out)?;
    }
    out.finish()
}

fn decode_action(typ: u16, record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    if typ == nicira::OFPAT_VENDOR {
        return nicira::decode_vendor(record, out);
    }

    let expected_len = match typ {
        OFPAT10_OUTPUT => 8,
        OFPAT10_SET_VLAN_VID => 8,
        OFPAT10_SET_VLAN_PCP => 8,
        OFPAT10_STRIP_VLAN => 8,
        OFPAT10_SET_DL_SRC | OFPAT10_SET_DL_DST => 16,
        OFPAT10_SET_NW_SRC | OFPAT10_SET_NW_DST => 8,
        OFPAT10_SET_NW_TOS => 8,
        OFPAT10_SET_TP_SRC | OFPAT10_SET_TP_DST => 8,
        OFPAT10_ENQUEUE => 16,
        _ => {
            if BAD_WIRE.should_log() {
                log::warn!("unknown OpenFlow 1.0 action type {}", typ);
            }
            return Err(ActionError::BadType);
        }
    };
    if record.len() != expected_len {
        return Err(ActionError::BadLen);
    }

    let mut cur = Cursor::new(&record[4..]);
    match typ {
        OFPAT10_OUTPUT => {
            let port = cur.read_u16::<BigEndian>()?;
            let max_len = cur.read_u16::<BigEndian>()?;
            check_output_port(port, OFPP_MAX)?;
            // An output to the controller port is the controller record's
            // plain spelling; folding it here keeps re-encoding closed.
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
        OFPAT10_SET_VLAN_VID => {
            let vid = cur.read_u16::<BigEndian>()?;
            if vid & !0xfff != 0 {
                return Err(ActionError::BadArgument);
            }
            out.push(&Ofpact::SetVlanVid(vid))
        }
        OFPAT10_SET_VLAN_PCP => {
            let pcp = cur.read_u8()?;
            if pcp & !7 != 0 {
                return Err(ActionError::BadArgument);
            }
            out.push(&Ofpact::SetVlanPcp(pcp))
        }
        OFPAT10_STRIP_VLAN => out.push(&Ofpact::StripVlan),
        OFPAT10_SET_DL_SRC | OFPAT10_SET_DL_DST => {
            let mut mac = [0; 6];
            std::io::Read::read_exact(&mut cur, &mut mac)?;
            if typ == OFPAT10_SET_DL_SRC {
                out.push(&Ofpact::SetEthSrc(mac))
            } else {
                out.push(&Ofpact::SetEthDst(mac))
            }
        }
        OFPAT10_SET_NW_SRC | OFPAT10_SET_NW_DST => {
            let addr = Ipv4Addr::from(cur.read_u32::<BigEndian>()?);
            if typ == OFPAT10_SET_NW_SRC {
                out.push(&Ofpact::SetIpv4Src(addr))
            } else {
                out.push(&Ofpact::SetIpv4Dst(addr))
            }
        }
        OFPAT10_SET_NW_TOS => {
            let tos = cur.read_u8()?;
            if tos & !IP_DSCP_MASK != 0 {
                return Err(ActionError::BadArgument);
            }
            out.push(&Ofpact::SetIpv4Dscp(tos))
        }
        OFPAT10_SET_TP_SRC | OFPAT10_SET_TP_DST => {
            let port = cur.read_u16::<BigEndian>()?;
            if typ == OFPAT10_SET_TP_SRC {
                out.push(&Ofpact::SetL4SrcPort(port))
            } else {
                out.push(&Ofpact::SetL4DstPort(port))
            }
        }
        OFPAT10_ENQUEUE => {
            let port = cur.read_u16::<BigEndian>()?;
            let mut pad = [0; 6];
            std::io::Read::read_exact(&mut cur, &mut pad)?;
            let queue = cur.read_u32::<BigEndian>()?;
            if port >= OFPP_MAX && port != OFPP_IN_PORT && port != OFPP_LOCAL {
                return Err(ActionError::BadOutPort);
            }
            out.push(&Ofpact::Enqueue { port, queue })
        }
        _ => Err(ActionError::BadType),
    }
}

/// Encodes an internal action stream as OpenFlow 1.0 actions appended to
/// `out`.
///
/// Records without a native 1.0 encoding are emitted as Nicira extension
/// actions.
pub fn encode_openflow10_actions(
    actions: &ActionBuffer,
    out: &mut Vec<u8>,
) -> Result<(), ActionError> {
    for action in actions {
        encode_action(&action, out)?;
    }
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
            put_header(out, OFPAT10_OUTPUT, 8)?;
            out.write_u16::<BigEndian>(*port)?;
            out.write_u16::<BigEndian>(*max_len)?;
        }
        Ofpact::Controller {
            max_len,
            controller_id,
            reason,
        } => {
            // The plain form is just an output to the controller port; the
            // extended form needs the Nicira action.
            if *reason == ControllerReason::Action && *controller_id == 0 {
                put_header(out, OFPAT10_OUTPUT, 8)?;
                out.write_u16::<BigEndian>(OFPP_CONTROLLER)?;
                out.write_u16::<BigEndian>(*max_len)?;
            } else {
                nicira::encode_vendor(action, out)?;
            }
        }
        Ofpact::Enqueue { port, queue } => {
            put_header(out, OFPAT10_ENQUEUE, 16)?;
            out.write_u16::<BigEndian>(*port)?;
            out.extend_from_slice(&[0; 6]);
            out.write_u32::<BigEndian>(*queue)?;
        }
        Ofpact::SetVlanVid(vid) => {
            put_header(out, OFPAT10_SET_VLAN_VID, 8)?;
            out.write_u16::<BigEndian>(*vid)?;
            out.write_u16::<BigEndian>(0)?;
        }
        Ofpact::SetVlanPcp(pcp) => {
            put_header(out, OFPAT10_SET_VLAN_PCP, 8)?;
            out.write_u8(*pcp)?;
            out.extend_from_slice(&[0; 3]);
        }
        Ofpact::StripVlan => {
            put_header(out, OFPAT10_STRIP_VLAN, 8)?;
            out.write_u32::<BigEndian>(0)?;
        }
        Ofpact::SetEthSrc(mac) | Ofpact::SetEthDst(mac) => {
            let typ = if let Ofpact::SetEthSrc(_) = action {
                OFPAT10_SET_DL_SRC
            } else {
                OFPAT10_SET_DL_DST
            };
            put_header(out, typ, 16)?;
            out.extend_from_slice(mac);
            out.extend_from_slice(&[0; 6]);
        }
        Ofpact::SetIpv4Src(addr) | Ofpact::SetIpv4Dst(addr) => {
            let typ = if let Ofpact::SetIpv4Src(_) = action {
                OFPAT10_SET_NW_SRC
            } else {
                OFPAT10_SET_NW_DST
            };
            put_header(out, typ, 8)?;
            out.extend_from_slice(&addr.octets());
        }
        Ofpact::SetIpv4Dscp(dscp) => {
            put_header(out, OFPAT10_SET_NW_TOS, 8)?;
            out.write_u8(*dscp)?;
            out.extend_from_slice(&[0; 3]);
        }
        Ofpact::SetL4SrcPort(port) | Ofpact::SetL4DstPort(port) => {
            let typ = if let Ofpact::SetL4SrcPort(_) = action {
                OFPAT10_SET_TP_SRC
            } else {
                OFPAT10_SET_TP_DST
            };
            put_header(out, typ, 8)?;
            out.write_u16::<BigEndian>(*port)?;
            out.write_u16::<BigEndian>(0)?;
        }
        _ => nicira::encode_vendor(action, out)?,
    }
    Ok(())
}
