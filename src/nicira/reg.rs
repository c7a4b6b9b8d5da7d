//! The register move and load sub-codecs.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::fmt;
use std::io::Cursor;

use crate::nicira::{put_nxast_header, NXAST_REG_LOAD, NXAST_REG_MOVE};
use crate::subfield::Subfield;
use crate::{ActionError, Flow};

/// Copies a source sub-field onto a destination sub-field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegMove {
    /// Bits to read.
    pub src: Subfield,
    /// Bits to overwrite. Same width as `src`.
    pub dst: Subfield,
}

impl RegMove {
    /// Parses the body of an `NXAST_REG_MOVE` action.
    pub fn from_wire(body: &[u8]) -> Result<RegMove, ActionError> {
        let reg_move = RegMove::read_payload(body)?;
        reg_move.src.check_src(None)?;
        reg_move.dst.check_dst(None)?;
        Ok(reg_move)
    }

    /// Appends this record as an `NXAST_REG_MOVE` action.
    pub fn to_wire(&self, out: &mut Vec<u8>) -> Result<(), ActionError> {
        put_nxast_header(out, NXAST_REG_MOVE, 24)?;
        self.write_payload(out)
    }

    /// Checks both sub-fields against the flow's match prerequisites.
    pub fn check(&self, flow: &Flow) -> Result<(), ActionError> {
        self.src.check_src(Some(flow))?;
        self.dst.check_dst(Some(flow))
    }

    pub(crate) fn read_payload(body: &[u8]) -> Result<RegMove, ActionError> {
        let mut cur = Cursor::new(body);
        let n_bits = cur.read_u16::<BigEndian>()?;
        let src_ofs = cur.read_u16::<BigEndian>()?;
        let dst_ofs = cur.read_u16::<BigEndian>()?;
        let src = cur.read_u32::<BigEndian>()?;
        let dst = cur.read_u32::<BigEndian>()?;
        Ok(RegMove {
            src: Subfield::from_header(src, src_ofs, n_bits)?,
            dst: Subfield::from_header(dst, dst_ofs, n_bits)?,
        })
    }

    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        buf.write_u16::<BigEndian>(self.n_bits())?;
        buf.write_u16::<BigEndian>(self.src.ofs)?;
        buf.write_u16::<BigEndian>(self.dst.ofs)?;
        buf.write_u32::<BigEndian>(self.src.field.header)?;
        buf.write_u32::<BigEndian>(self.dst.field.header)?;
        Ok(())
    }

    fn n_bits(&self) -> u16 {
        self.src.n_bits
    }
}

impl fmt::Display for RegMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "move:{}->{}", self.src, self.dst)
    }
}

/// Loads an immediate value into a destination sub-field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegLoad {
    /// Bits to overwrite.
    pub dst: Subfield,
    /// Value to load; must fit in `dst.n_bits`.
    pub value: u64,
}

impl RegLoad {
    /// Parses the body of an `NXAST_REG_LOAD` action.
    pub fn from_wire(body: &[u8]) -> Result<RegLoad, ActionError> {
        let reg_load = RegLoad::read_payload(body)?;
        reg_load.dst.check_dst(None)?;
        // Reject a value the destination cannot hold.
        if reg_load.dst.n_bits < 64 && reg_load.value >> reg_load.dst.n_bits != 0 {
            return Err(ActionError::BadArgument);
        }
        Ok(reg_load)
    }

    /// Appends this record as an `NXAST_REG_LOAD` action.
    pub fn to_wire(&self, out: &mut Vec<u8>) -> Result<(), ActionError> {
        put_nxast_header(out, NXAST_REG_LOAD, 24)?;
        self.write_payload(out)
    }

    /// Checks the destination against the flow's match prerequisites.
    pub fn check(&self, flow: &Flow) -> Result<(), ActionError> {
        self.dst.check_dst(Some(flow))
    }

    pub(crate) fn read_payload(body: &[u8]) -> Result<RegLoad, ActionError> {
        let mut cur = Cursor::new(body);
        let ofs_nbits = cur.read_u16::<BigEndian>()?;
        let dst = cur.read_u32::<BigEndian>()?;
        let value = cur.read_u64::<BigEndian>()?;
        Ok(RegLoad {
            dst: Subfield::decode(dst, ofs_nbits)?,
            value,
        })
    }

    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        buf.write_u16::<BigEndian>(self.dst.ofs_nbits())?;
        buf.write_u32::<BigEndian>(self.dst.field.header)?;
        buf.write_u64::<BigEndian>(self.value)?;
        Ok(())
    }
}

impl fmt::Display for RegLoad {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "load:{:#x}->{}", self.value, self.dst)
    }
}
