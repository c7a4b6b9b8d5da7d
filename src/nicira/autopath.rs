//! The autopath link-selection sub-codec.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::fmt;
use std::io::Cursor;

use crate::nicira::{put_nxast_header, NXAST_AUTOPATH};
use crate::subfield::Subfield;
use crate::{ActionError, Flow};

/// Writes the port of a live link of a bond into a sub-field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Autopath {
    /// Where the chosen port number lands. At least 16 bits wide.
    pub dst: Subfield,
    /// Id of the bond to select from.
    pub id: u32,
}

impl Autopath {
    /// Parses the body of an `NXAST_AUTOPATH` action.
    pub fn from_wire(body: &[u8]) -> Result<Autopath, ActionError> {
        let autopath = Autopath::read_payload(body)?;
        autopath.dst.check_dst(None)?;
        // The destination receives a 16-bit port number.
        if autopath.dst.n_bits < 16 {
            return Err(ActionError::BadArgument);
        }
        Ok(autopath)
    }

    /// Appends this record as an `NXAST_AUTOPATH` action.
    pub fn to_wire(&self, out: &mut Vec<u8>) -> Result<(), ActionError> {
        put_nxast_header(out, NXAST_AUTOPATH, 24)?;
        self.write_payload(out)
    }

    /// Checks the destination against the flow's match prerequisites.
    pub fn check(&self, flow: &Flow) -> Result<(), ActionError> {
        self.dst.check_dst(Some(flow))
    }

    pub(crate) fn read_payload(body: &[u8]) -> Result<Autopath, ActionError> {
        let mut cur = Cursor::new(body);
        let ofs_nbits = cur.read_u16::<BigEndian>()?;
        let dst = cur.read_u32::<BigEndian>()?;
        let id = cur.read_u32::<BigEndian>()?;
        Ok(Autopath {
            dst: Subfield::decode(dst, ofs_nbits)?,
            id,
        })
    }

    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        buf.write_u16::<BigEndian>(self.dst.ofs_nbits())?;
        buf.write_u32::<BigEndian>(self.dst.field.header)?;
        buf.write_u32::<BigEndian>(self.id)?;
        buf.write_u32::<BigEndian>(0)?;
        Ok(())
    }
}

impl fmt::Display for Autopath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "autopath({},{})", self.id, self.dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autopath_narrow_dst() {
        let body = [
            0x00, 0x07, // ofs 0, n_bits 8: too narrow for a port number
            0x00, 0x01, 0x00, 0x04, // NXM_NX_REG0
            0x00, 0x00, 0x00, 0x05, // id 5
            0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(Autopath::from_wire(&body), Err(ActionError::BadArgument));

        let mut ok = body;
        ok[1] = 0x0f; // n_bits 16
        let autopath = Autopath::from_wire(&ok).unwrap();
        assert_eq!(autopath.id, 5);
        assert_eq!(autopath.to_string(), "autopath(5,NXM_NX_REG0[0..15])");
    }
}
