//! The Nicira vendor-extension action codec.
//!
//! Nicira extension actions ride inside the generic OpenFlow vendor (1.0) or
//! experimenter (1.1) action: `{type=0xffff, len, vendor, subtype}` followed
//! by a subtype-specific body. Decoding dispatches through a static table of
//! subtypes; each row names the required wire length and whether the subtype
//! may carry a tail beyond its fixed struct.

/// Contains the autopath sub-codec.
pub mod autopath;

/// Contains the bundle sub-codec.
pub mod bundle;

/// Contains the learn sub-codec.
pub mod learn;

/// Contains the multipath sub-codec.
pub mod multipath;

/// Contains the register move/load sub-codecs.
pub mod reg;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};

use std::io::Cursor;

use crate::ofpact::{ActionBuffer, Compat, ControllerReason, Ofpact};
use crate::subfield::Subfield;
use crate::util::BAD_WIRE;
use crate::ActionError;

use self::autopath::Autopath;
use self::bundle::Bundle;
use self::learn::Learn;
use self::multipath::Multipath;
use self::reg::{RegLoad, RegMove};

/// The Nicira vendor id.
pub const NX_VENDOR_ID: u32 = 0x0000_2320;

/// Wire type of the OpenFlow 1.0 vendor / 1.1 experimenter action.
pub(crate) const OFPAT_VENDOR: u16 = 0xffff;

/// Size of the Nicira action header, padding included.
const NXAST_HEADER_LEN: usize = 16;

/// Offset of the subtype body within a Nicira action.
const NXAST_BODY_OFS: usize = 10;

pub(crate) const NXAST_SNAT: u16 = 0; // obsolete
pub(crate) const NXAST_RESUBMIT: u16 = 1;
pub(crate) const NXAST_SET_TUNNEL: u16 = 2;
pub(crate) const NXAST_DROP_SPOOFED_ARP: u16 = 3; // obsolete
pub(crate) const NXAST_SET_QUEUE: u16 = 4;
pub(crate) const NXAST_POP_QUEUE: u16 = 5;
pub(crate) const NXAST_REG_MOVE: u16 = 6;
pub(crate) const NXAST_REG_LOAD: u16 = 7;
pub(crate) const NXAST_NOTE: u16 = 8;
pub(crate) const NXAST_SET_TUNNEL64: u16 = 9;
pub(crate) const NXAST_MULTIPATH: u16 = 10;
pub(crate) const NXAST_AUTOPATH: u16 = 11;
pub(crate) const NXAST_BUNDLE: u16 = 12;
pub(crate) const NXAST_BUNDLE_LOAD: u16 = 13;
pub(crate) const NXAST_RESUBMIT_TABLE: u16 = 14;
pub(crate) const NXAST_OUTPUT_REG: u16 = 15;
pub(crate) const NXAST_LEARN: u16 = 16;
pub(crate) const NXAST_EXIT: u16 = 17;
pub(crate) const NXAST_DEC_TTL: u16 = 18;
pub(crate) const NXAST_FIN_TIMEOUT: u16 = 19;
pub(crate) const NXAST_CONTROLLER: u16 = 20;

/// One row of the subtype dispatch table.
struct SubtypeSpec {
    subtype: u16,
    /// Required wire length; a minimum for extensible subtypes.
    len: usize,
    /// Whether the wire length may exceed `len` (trailing payload).
    extensible: bool,
    decode: fn(&[u8], &mut ActionBuffer) -> Result<(), ActionError>,
}

static SUBTYPES: &[SubtypeSpec] = &[
    SubtypeSpec {
        subtype: NXAST_RESUBMIT,
        len: 16,
        extensible: false,
        decode: decode_resubmit,
    },
    SubtypeSpec {
        subtype: NXAST_SET_TUNNEL,
        len: 16,
        extensible: false,
        decode: decode_set_tunnel,
    },
    SubtypeSpec {
        subtype: NXAST_SET_QUEUE,
        len: 16,
        extensible: false,
        decode: decode_set_queue,
    },
    SubtypeSpec {
        subtype: NXAST_POP_QUEUE,
        len: 16,
        extensible: false,
        decode: decode_pop_queue,
    },
    SubtypeSpec {
        subtype: NXAST_REG_MOVE,
        len: 24,
        extensible: false,
        decode: decode_reg_move,
    },
    SubtypeSpec {
        subtype: NXAST_REG_LOAD,
        len: 24,
        extensible: false,
        decode: decode_reg_load,
    },
    SubtypeSpec {
        subtype: NXAST_NOTE,
        len: 16,
        extensible: true,
        decode: decode_note,
    },
    SubtypeSpec {
        subtype: NXAST_SET_TUNNEL64,
        len: 24,
        extensible: false,
        decode: decode_set_tunnel64,
    },
    SubtypeSpec {
        subtype: NXAST_MULTIPATH,
        len: 32,
        extensible: false,
        decode: decode_multipath,
    },
    SubtypeSpec {
        subtype: NXAST_AUTOPATH,
        len: 24,
        extensible: false,
        decode: decode_autopath,
    },
    SubtypeSpec {
        subtype: NXAST_BUNDLE,
        len: 32,
        extensible: true,
        decode: decode_bundle,
    },
    SubtypeSpec {
        subtype: NXAST_BUNDLE_LOAD,
        len: 32,
        extensible: true,
        decode: decode_bundle_load,
    },
    SubtypeSpec {
        subtype: NXAST_RESUBMIT_TABLE,
        len: 16,
        extensible: false,
        decode: decode_resubmit_table,
    },
    SubtypeSpec {
        subtype: NXAST_OUTPUT_REG,
        len: 24,
        extensible: false,
        decode: decode_output_reg,
    },
    SubtypeSpec {
        subtype: NXAST_LEARN,
        len: 32,
        extensible: true,
        decode: decode_learn,
    },
    SubtypeSpec {
        subtype: NXAST_EXIT,
        len: 16,
        extensible: false,
        decode: decode_exit,
    },
    SubtypeSpec {
        subtype: NXAST_DEC_TTL,
        len: 16,
        extensible: false,
        decode: decode_dec_ttl,
    },
    SubtypeSpec {
        subtype: NXAST_FIN_TIMEOUT,
        len: 16,
        extensible: false,
        decode: decode_fin_timeout,
    },
    SubtypeSpec {
        subtype: NXAST_CONTROLLER,
        len: 16,
        extensible: false,
        decode: decode_controller,
    },
];

/// Decodes one vendor action record into `out`.
///
/// The caller's TLV walk has already established that `record` is at least 8
/// bytes and a multiple of 8.
pub(crate) fn decode_vendor(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let vendor = BigEndian::read_u32(&record[4..8]);
    if vendor != NX_VENDOR_ID {
        if BAD_WIRE.should_log() {
            log::warn!("vendor action with unknown vendor id {:#010x}", vendor);
        }
        return Err(ActionError::BadVendor);
    }
    if record.len() < NXAST_HEADER_LEN {
        return Err(ActionError::BadLen);
    }
    let subtype = BigEndian::read_u16(&record[8..10]);
    if subtype == NXAST_SNAT || subtype == NXAST_DROP_SPOOFED_ARP {
        if BAD_WIRE.should_log() {
            log::warn!("obsolete Nicira action subtype {}", subtype);
        }
        return Err(ActionError::BadType);
    }
    let spec = match SUBTYPES.iter().find(|spec| spec.subtype == subtype) {
        Some(spec) => spec,
        None => {
            if BAD_WIRE.should_log() {
                log::warn!("unknown Nicira action subtype {}", subtype);
            }
            return Err(ActionError::BadType);
        }
    };
    if record.len() != spec.len && !(spec.extensible && record.len() > spec.len) {
        return Err(ActionError::BadLen);
    }
    (spec.decode)(record, out)
}

fn decode_resubmit(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let mut cur = Cursor::new(&record[NXAST_BODY_OFS..]);
    let in_port = cur.read_u16::<BigEndian>()?;
    out.push(&Ofpact::Resubmit {
        in_port,
        table_id: 0xff,
        compat: Compat::Resubmit,
    })
}

fn decode_resubmit_table(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let mut cur = Cursor::new(&record[NXAST_BODY_OFS..]);
    let in_port = cur.read_u16::<BigEndian>()?;
    let table_id = cur.read_u8()?;
    if record[13..16] != [0; 3] {
        return Err(ActionError::BadArgument);
    }
    out.push(&Ofpact::Resubmit {
        in_port,
        table_id,
        compat: Compat::ResubmitTable,
    })
}

fn decode_set_tunnel(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let tun_id = BigEndian::read_u32(&record[12..16]);
    out.push(&Ofpact::SetTunnel {
        tun_id: u64::from(tun_id),
        compat: Compat::SetTunnel,
    })
}

fn decode_set_tunnel64(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let tun_id = BigEndian::read_u64(&record[16..24]);
    out.push(&Ofpact::SetTunnel {
        tun_id,
        compat: Compat::SetTunnel64,
    })
}

fn decode_set_queue(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let queue = BigEndian::read_u32(&record[12..16]);
    out.push(&Ofpact::SetQueue(queue))
}

fn decode_pop_queue(_record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    out.push(&Ofpact::PopQueue)
}

fn decode_reg_move(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let reg_move = RegMove::from_wire(&record[NXAST_BODY_OFS..])?;
    out.push(&Ofpact::RegMove(reg_move))
}

fn decode_reg_load(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let reg_load = RegLoad::from_wire(&record[NXAST_BODY_OFS..])?;
    out.push(&Ofpact::RegLoad(reg_load))
}

fn decode_note(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    // Everything after the header is the note, alignment padding included.
    out.push(&Ofpact::Note(record[NXAST_BODY_OFS..].to_vec()))
}

fn decode_multipath(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let multipath = Multipath::from_wire(&record[NXAST_BODY_OFS..])?;
    out.push(&Ofpact::Multipath(multipath))
}

fn decode_autopath(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let autopath = Autopath::from_wire(&record[NXAST_BODY_OFS..])?;
    out.push(&Ofpact::Autopath(autopath))
}

fn decode_bundle(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let bundle = Bundle::from_wire(&record[NXAST_BODY_OFS..], false)?;
    out.push(&Ofpact::Bundle(bundle))
}

fn decode_bundle_load(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let bundle = Bundle::from_wire(&record[NXAST_BODY_OFS..], true)?;
    out.push(&Ofpact::Bundle(bundle))
}

fn decode_output_reg(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let mut cur = Cursor::new(&record[NXAST_BODY_OFS..]);
    let ofs_nbits = cur.read_u16::<BigEndian>()?;
    let src = cur.read_u32::<BigEndian>()?;
    let max_len = cur.read_u16::<BigEndian>()?;
    if record[18..24] != [0; 6] {
        return Err(ActionError::BadArgument);
    }
    let src = Subfield::decode(src, ofs_nbits)?;
    src.check_src(None)?;
    out.push(&Ofpact::OutputReg { src, max_len })
}

fn decode_learn(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let learn = Learn::from_wire(&record[NXAST_BODY_OFS..])?;
    out.push(&Ofpact::Learn(learn))
}

fn decode_exit(_record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    out.push(&Ofpact::Exit)
}

fn decode_dec_ttl(_record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    out.push(&Ofpact::DecTtl)
}

fn decode_fin_timeout(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let mut cur = Cursor::new(&record[NXAST_BODY_OFS..]);
    let idle_timeout = cur.read_u16::<BigEndian>()?;
    let hard_timeout = cur.read_u16::<BigEndian>()?;
    out.push(&Ofpact::FinTimeout {
        idle_timeout,
        hard_timeout,
    })
}

fn decode_controller(record: &[u8], out: &mut ActionBuffer) -> Result<(), ActionError> {
    let mut cur = Cursor::new(&record[NXAST_BODY_OFS..]);
    let max_len = cur.read_u16::<BigEndian>()?;
    let controller_id = cur.read_u16::<BigEndian>()?;
    let reason = ControllerReason::from_u8(cur.read_u8()?)?;
    out.push(&Ofpact::Controller {
        max_len,
        controller_id,
        reason,
    })
}

/// Writes the Nicira action header with a known total length.
pub(crate) fn put_nxast_header(
    out: &mut Vec<u8>,
    subtype: u16,
    len: u16,
) -> Result<(), ActionError> {
    out.write_u16::<BigEndian>(OFPAT_VENDOR)?;
    out.write_u16::<BigEndian>(len)?;
    out.write_u32::<BigEndian>(NX_VENDOR_ID)?;
    out.write_u16::<BigEndian>(subtype)?;
    Ok(())
}

/// Writes the Nicira action header for a variable-length action. The length
/// field is filled in by [`finish_nxast`].
pub(crate) fn start_nxast(out: &mut Vec<u8>, subtype: u16) -> Result<usize, ActionError> {
    let start = out.len();
    put_nxast_header(out, subtype, 0)?;
    Ok(start)
}

/// Pads the action that started at `start` to the wire alignment and patches
/// its length field.
pub(crate) fn finish_nxast(out: &mut Vec<u8>, start: usize) -> Result<(), ActionError> {
    while (out.len() - start) % 8 != 0 {
        out.push(0);
    }
    let len = out.len() - start;
    if len > usize::from(u16::max_value()) {
        return Err(ActionError::BadLen);
    }
    BigEndian::write_u16(&mut out[start + 2..start + 4], len as u16);
    Ok(())
}

/// Encodes an internal record that has no native OpenFlow representation as
/// a Nicira extension action.
pub(crate) fn encode_vendor(action: &Ofpact, out: &mut Vec<u8>) -> Result<(), ActionError> {
    match action {
        Ofpact::Controller {
            max_len,
            controller_id,
            reason,
        } => {
            put_nxast_header(out, NXAST_CONTROLLER, 16)?;
            out.write_u16::<BigEndian>(*max_len)?;
            out.write_u16::<BigEndian>(*controller_id)?;
            out.write_u8(reason.to_u8())?;
            out.write_u8(0)?;
        }
        Ofpact::OutputReg { src, max_len } => {
            put_nxast_header(out, NXAST_OUTPUT_REG, 24)?;
            out.write_u16::<BigEndian>(src.ofs_nbits())?;
            out.write_u32::<BigEndian>(src.field.header)?;
            out.write_u16::<BigEndian>(*max_len)?;
            out.extend_from_slice(&[0; 6]);
        }
        Ofpact::Bundle(bundle) => bundle.to_wire(out)?,
        Ofpact::SetTunnel { tun_id, compat } => {
            // Keep the wire form the record came from; only widen when the
            // id no longer fits.
            if *tun_id <= u64::from(u32::max_value()) && *compat != Compat::SetTunnel64 {
                put_nxast_header(out, NXAST_SET_TUNNEL, 16)?;
                out.write_u16::<BigEndian>(0)?;
                out.write_u32::<BigEndian>(*tun_id as u32)?;
            } else {
                put_nxast_header(out, NXAST_SET_TUNNEL64, 24)?;
                out.extend_from_slice(&[0; 6]);
                out.write_u64::<BigEndian>(*tun_id)?;
            }
        }
        Ofpact::SetQueue(queue) => {
            put_nxast_header(out, NXAST_SET_QUEUE, 16)?;
            out.write_u16::<BigEndian>(0)?;
            out.write_u32::<BigEndian>(*queue)?;
        }
        Ofpact::PopQueue => {
            put_nxast_header(out, NXAST_POP_QUEUE, 16)?;
            out.extend_from_slice(&[0; 6]);
        }
        Ofpact::RegMove(reg_move) => reg_move.to_wire(out)?,
        Ofpact::RegLoad(reg_load) => reg_load.to_wire(out)?,
        Ofpact::DecTtl => {
            put_nxast_header(out, NXAST_DEC_TTL, 16)?;
            out.extend_from_slice(&[0; 6]);
        }
        Ofpact::FinTimeout {
            idle_timeout,
            hard_timeout,
        } => {
            put_nxast_header(out, NXAST_FIN_TIMEOUT, 16)?;
            out.write_u16::<BigEndian>(*idle_timeout)?;
            out.write_u16::<BigEndian>(*hard_timeout)?;
            out.write_u16::<BigEndian>(0)?;
        }
        Ofpact::Resubmit {
            in_port,
            table_id,
            compat,
        } => {
            if *table_id != 0xff || *compat == Compat::ResubmitTable {
                put_nxast_header(out, NXAST_RESUBMIT_TABLE, 16)?;
                out.write_u16::<BigEndian>(*in_port)?;
                out.write_u8(*table_id)?;
            } else {
                put_nxast_header(out, NXAST_RESUBMIT, 16)?;
                out.write_u16::<BigEndian>(*in_port)?;
                out.write_u8(0)?;
            }
            out.extend_from_slice(&[0; 3]);
        }
        Ofpact::Learn(learn) => learn.to_wire(out)?,
        Ofpact::Multipath(multipath) => multipath.to_wire(out)?,
        Ofpact::Autopath(autopath) => autopath.to_wire(out)?,
        Ofpact::Note(data) => {
            let start = start_nxast(out, NXAST_NOTE)?;
            out.extend_from_slice(data);
            finish_nxast(out, start)?;
        }
        Ofpact::Exit => {
            put_nxast_header(out, NXAST_EXIT, 16)?;
            out.extend_from_slice(&[0; 6]);
        }
        // Everything else has a native encoding and never lands here.
        _ => return Err(ActionError::BadType),
    }
    Ok(())
}
