//! The learn sub-codec.
//!
//! A learn action installs a new flow derived from the packet being
//! processed. Its wire body is a fixed header followed by a list of flow-mod
//! specs, each a 16-bit spec header and a source/destination pair. The spec
//! list ends at a zero header or at the end of the action; everything after
//! the terminator must be zero.

use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};

use std::fmt;
use std::io::Cursor;

use crate::nicira::{finish_nxast, start_nxast, NXAST_LEARN};
use crate::subfield::Subfield;
use crate::{ActionError, Flow};

bitflags! {
    /// Flags of a learned flow.
    pub struct LearnFlags: u16 {
        /// Send a flow-removed message when the learned flow expires.
        const SEND_FLOW_REM = 1 << 0;
    }
}

const SRC_IMMEDIATE: u16 = 1 << 13;
const DST_SHIFT: u16 = 11;
const N_BITS_MASK: u16 = 0x7ff;

/// Where a flow-mod spec takes its bits from.
#[derive(Debug, Clone, PartialEq)]
pub enum LearnSrc {
    /// Read from a sub-field of the packet being processed.
    Field(Subfield),
    /// An immediate value, stored exactly as carried on the wire.
    Immediate(Vec<u8>),
}

/// Where a flow-mod spec puts its bits in the learned flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearnDst {
    /// Add a match criterion on a sub-field.
    Match(Subfield),
    /// Prepend a load action to the learned flow's actions.
    Load(Subfield),
    /// Append an output action; the source names the port.
    Output,
}

/// One flow-mod spec of a learn action.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnSpec {
    /// Number of bits the spec copies.
    pub n_bits: u16,
    /// Bit source.
    pub src: LearnSrc,
    /// Bit destination.
    pub dst: LearnDst,
}

/// Sets up a learned flow from the current packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Learn {
    /// Idle timeout of the learned flow, zero for none.
    pub idle_timeout: u16,
    /// Hard timeout of the learned flow, zero for none.
    pub hard_timeout: u16,
    /// Priority of the learned flow.
    pub priority: u16,
    /// Cookie of the learned flow.
    pub cookie: u64,
    /// Flags of the learned flow.
    pub flags: LearnFlags,
    /// Table to install the learned flow into. Must not be 0xff.
    pub table_id: u8,
    /// Idle timeout after a FIN or RST, zero for unchanged.
    pub fin_idle_timeout: u16,
    /// Hard timeout after a FIN or RST, zero for unchanged.
    pub fin_hard_timeout: u16,
    /// The flow-mod specs.
    pub specs: Vec<LearnSpec>,
}

/// Fixed part of the wire body, after the Nicira action header.
const LEARN_BODY_FIXED: usize = 22;

impl Learn {
    /// Parses the body of an `NXAST_LEARN` action.
    pub fn from_wire(body: &[u8]) -> Result<Learn, ActionError> {
        let learn = Learn::parse_fixed(body, true)?;
        if learn.table_id == 0xff {
            return Err(ActionError::BadArgument);
        }
        Ok(learn)
    }

    /// Appends this record as an `NXAST_LEARN` action.
    ///
    /// The zero padding that aligns the record doubles as the spec-list
    /// terminator.
    pub fn to_wire(&self, out: &mut Vec<u8>) -> Result<(), ActionError> {
        let start = start_nxast(out, NXAST_LEARN)?;
        self.write_fixed(out)?;
        for spec in &self.specs {
            write_spec(spec, out)?;
        }
        finish_nxast(out, start)
    }

    /// Checks every spec's sub-fields against the flow's prerequisites.
    pub fn check(&self, flow: &Flow) -> Result<(), ActionError> {
        for spec in &self.specs {
            if let LearnSrc::Field(src) = &spec.src {
                src.check_src(Some(flow))?;
            }
            match &spec.dst {
                LearnDst::Match(dst) => dst.check_src(Some(flow))?,
                LearnDst::Load(dst) => dst.check_dst(Some(flow))?,
                LearnDst::Output => {}
            }
        }
        Ok(())
    }

    pub(crate) fn read_payload(body: &[u8]) -> Result<Learn, ActionError> {
        Learn::parse_fixed(body, false)
    }

    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        self.write_fixed(buf)?;
        for spec in &self.specs {
            write_spec(spec, buf)?;
        }
        Ok(())
    }

    /// Parses the fixed fields and the spec list. With `wire` set, the flag
    /// word is strict and the bytes after the spec terminator must be zero.
    fn parse_fixed(body: &[u8], wire: bool) -> Result<Learn, ActionError> {
        let mut cur = Cursor::new(body);
        let idle_timeout = cur.read_u16::<BigEndian>()?;
        let hard_timeout = cur.read_u16::<BigEndian>()?;
        let priority = cur.read_u16::<BigEndian>()?;
        let cookie = cur.read_u64::<BigEndian>()?;
        let raw_flags = cur.read_u16::<BigEndian>()?;
        let table_id = cur.read_u8()?;
        cur.read_u8()?;
        let fin_idle_timeout = cur.read_u16::<BigEndian>()?;
        let fin_hard_timeout = cur.read_u16::<BigEndian>()?;

        let flags = if wire {
            LearnFlags::from_bits(raw_flags).ok_or(ActionError::BadArgument)?
        } else {
            LearnFlags::from_bits_truncate(raw_flags)
        };

        let rest = &body[LEARN_BODY_FIXED..];
        let (specs, used) = parse_specs(rest)?;
        if wire && rest[used..].iter().any(|&b| b != 0) {
            return Err(ActionError::BadArgument);
        }

        Ok(Learn {
            idle_timeout,
            hard_timeout,
            priority,
            cookie,
            flags,
            table_id,
            fin_idle_timeout,
            fin_hard_timeout,
            specs,
        })
    }

    fn write_fixed(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        buf.write_u16::<BigEndian>(self.idle_timeout)?;
        buf.write_u16::<BigEndian>(self.hard_timeout)?;
        buf.write_u16::<BigEndian>(self.priority)?;
        buf.write_u64::<BigEndian>(self.cookie)?;
        buf.write_u16::<BigEndian>(self.flags.bits())?;
        buf.write_u8(self.table_id)?;
        buf.write_u8(0)?;
        buf.write_u16::<BigEndian>(self.fin_idle_timeout)?;
        buf.write_u16::<BigEndian>(self.fin_hard_timeout)?;
        Ok(())
    }
}

/// Parses flow-mod specs until a zero header, the end of `buf`, or an error.
/// Returns the specs and the number of bytes consumed.
fn parse_specs(buf: &[u8]) -> Result<(Vec<LearnSpec>, usize), ActionError> {
    let mut specs = Vec::new();
    let mut ofs = 0;
    while buf.len() - ofs >= 2 {
        let header = BigEndian::read_u16(&buf[ofs..]);
        if header == 0 {
            break;
        }
        // Bits 14 and 15 of the spec header are reserved.
        if header & !(N_BITS_MASK | SRC_IMMEDIATE | (3 << DST_SHIFT)) != 0 {
            return Err(ActionError::BadArgument);
        }
        let n_bits = header & N_BITS_MASK;
        if n_bits == 0 {
            return Err(ActionError::BadArgument);
        }
        ofs += 2;

        let src = if header & SRC_IMMEDIATE != 0 {
            // Immediates are stored in units of 16 bits.
            let len = 2 * ((usize::from(n_bits) + 15) / 16);
            if buf.len() - ofs < len {
                return Err(ActionError::BadLen);
            }
            let value = buf[ofs..ofs + len].to_vec();
            ofs += len;
            LearnSrc::Immediate(value)
        } else {
            let (subfield, used) = read_subfield(&buf[ofs..], n_bits)?;
            subfield.check_src(None)?;
            ofs += used;
            LearnSrc::Field(subfield)
        };

        let dst = match (header >> DST_SHIFT) & 3 {
            0 => {
                let (subfield, used) = read_subfield(&buf[ofs..], n_bits)?;
                subfield.check_src(None)?;
                ofs += used;
                LearnDst::Match(subfield)
            }
            1 => {
                let (subfield, used) = read_subfield(&buf[ofs..], n_bits)?;
                subfield.check_dst(None)?;
                ofs += used;
                LearnDst::Load(subfield)
            }
            2 => LearnDst::Output,
            _ => return Err(ActionError::BadArgument),
        };

        specs.push(LearnSpec { n_bits, src, dst });
    }
    Ok((specs, ofs))
}

fn read_subfield(buf: &[u8], n_bits: u16) -> Result<(Subfield, usize), ActionError> {
    if buf.len() < 6 {
        return Err(ActionError::BadLen);
    }
    let header = BigEndian::read_u32(&buf[0..4]);
    let ofs = BigEndian::read_u16(&buf[4..6]);
    Ok((Subfield::from_header(header, ofs, n_bits)?, 6))
}

fn write_spec(spec: &LearnSpec, buf: &mut Vec<u8>) -> Result<(), ActionError> {
    let mut header = spec.n_bits & N_BITS_MASK;
    if let LearnSrc::Immediate(_) = spec.src {
        header |= SRC_IMMEDIATE;
    }
    header |= match spec.dst {
        LearnDst::Match(_) => 0,
        LearnDst::Load(_) => 1 << DST_SHIFT,
        LearnDst::Output => 2 << DST_SHIFT,
    };
    buf.write_u16::<BigEndian>(header)?;

    match &spec.src {
        LearnSrc::Field(src) => {
            buf.write_u32::<BigEndian>(src.field.header)?;
            buf.write_u16::<BigEndian>(src.ofs)?;
        }
        LearnSrc::Immediate(value) => buf.extend_from_slice(value),
    }
    match &spec.dst {
        LearnDst::Match(dst) | LearnDst::Load(dst) => {
            buf.write_u32::<BigEndian>(dst.field.header)?;
            buf.write_u16::<BigEndian>(dst.ofs)?;
        }
        LearnDst::Output => {}
    }
    Ok(())
}

impl fmt::Display for LearnSrc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LearnSrc::Field(src) => write!(f, "{}", src),
            LearnSrc::Immediate(value) => {
                // Big-endian immediate, leading zeros trimmed.
                let mut bytes = value.as_slice();
                while bytes.len() > 1 && bytes[0] == 0 {
                    bytes = &bytes[1..];
                }
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for LearnSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.src, &self.dst) {
            (LearnSrc::Field(src), LearnDst::Match(dst)) if src == dst => {
                write!(f, "{}", dst)
            }
            (src, LearnDst::Match(dst)) => write!(f, "{}={}", dst, src),
            (src, LearnDst::Load(dst)) => write!(f, "load:{}->{}", src, dst),
            (src, LearnDst::Output) => write!(f, "output:{}", src),
        }
    }
}

impl fmt::Display for Learn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "learn(table={}", self.table_id)?;
        if self.idle_timeout != 0 {
            write!(f, ",idle_timeout={}", self.idle_timeout)?;
        }
        if self.hard_timeout != 0 {
            write!(f, ",hard_timeout={}", self.hard_timeout)?;
        }
        if self.fin_idle_timeout != 0 {
            write!(f, ",fin_idle_timeout={}", self.fin_idle_timeout)?;
        }
        if self.fin_hard_timeout != 0 {
            write!(f, ",fin_hard_timeout={}", self.fin_hard_timeout)?;
        }
        if self.priority != 0 {
            write!(f, ",priority={}", self.priority)?;
        }
        if self.flags.contains(LearnFlags::SEND_FLOW_REM) {
            f.write_str(",send_flow_rem")?;
        }
        if self.cookie != 0 {
            write!(f, ",cookie={:#x}", self.cookie)?;
        }
        for spec in &self.specs {
            write!(f, ",{}", spec)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subfield::Subfield;

    fn learn_fixed(flags: u16, table_id: u8) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&10u16.to_be_bytes()); // idle_timeout
        body.extend_from_slice(&0u16.to_be_bytes()); // hard_timeout
        body.extend_from_slice(&100u16.to_be_bytes()); // priority
        body.extend_from_slice(&0u64.to_be_bytes()); // cookie
        body.extend_from_slice(&flags.to_be_bytes());
        body.push(table_id);
        body.push(0);
        body.extend_from_slice(&0u16.to_be_bytes()); // fin_idle_timeout
        body.extend_from_slice(&0u16.to_be_bytes()); // fin_hard_timeout
        body
    }

    #[test]
    fn test_learn_from_wire() {
        let mut body = learn_fixed(0, 1);
        // Match VLAN_TCI[0..11] against itself.
        body.extend_from_slice(&12u16.to_be_bytes());
        body.extend_from_slice(&0x0000_0802u32.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&0x0000_0802u32.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        // Output to the packet's input port.
        body.extend_from_slice(&(16u16 | (2 << 11)).to_be_bytes());
        body.extend_from_slice(&0x0000_0002u32.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        // Terminator plus padding.
        body.extend_from_slice(&[0; 4]);

        let learn = Learn::from_wire(&body).unwrap();
        assert_eq!(learn.idle_timeout, 10);
        assert_eq!(learn.table_id, 1);
        assert_eq!(learn.specs.len(), 2);
        assert_eq!(
            learn.to_string(),
            "learn(table=1,idle_timeout=10,priority=100,\
             NXM_OF_VLAN_TCI[0..11],output:NXM_OF_IN_PORT[])"
        );

        // Re-encoding and re-decoding is lossless.
        let mut wire = Vec::new();
        learn.to_wire(&mut wire).unwrap();
        let again = Learn::from_wire(&wire[10..]).unwrap();
        assert_eq!(again, learn);
    }

    #[test]
    fn test_learn_immediate_spec() {
        let mut body = learn_fixed(0, 2);
        // Load the immediate value 5 into REG0[0..15].
        body.extend_from_slice(&(16u16 | SRC_IMMEDIATE | (1 << 11)).to_be_bytes());
        body.extend_from_slice(&5u16.to_be_bytes());
        body.extend_from_slice(&0x0001_0004u32.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&[0; 6]);

        let learn = Learn::from_wire(&body).unwrap();
        assert_eq!(
            learn.specs[0],
            LearnSpec {
                n_bits: 16,
                src: LearnSrc::Immediate(vec![0, 5]),
                dst: LearnDst::Load(
                    Subfield::from_header(0x0001_0004, 0, 16).unwrap()
                ),
            }
        );
        assert!(learn.to_string().contains("load:0x05->NXM_NX_REG0[0..15]"));
    }

    #[test]
    fn test_learn_rejects_garbage_tail() {
        let mut body = learn_fixed(0, 1);
        body.extend_from_slice(&[0, 0, 0, 1]); // nonzero after terminator
        assert_eq!(Learn::from_wire(&body), Err(ActionError::BadArgument));
    }

    #[test]
    fn test_learn_rejects_bad_flags_and_table() {
        let body = learn_fixed(0x8000, 1);
        assert_eq!(Learn::from_wire(&body), Err(ActionError::BadArgument));
        let body = learn_fixed(0, 0xff);
        assert_eq!(Learn::from_wire(&body), Err(ActionError::BadArgument));
    }
}
