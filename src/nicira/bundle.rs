//! The bundle (bonding) sub-codec.
//!
//! `bundle` picks one slave port from a list and outputs to it; the
//! `bundle_load` spelling writes the chosen port into a sub-field instead.
//! Both share one wire struct, a fixed header followed by a 16-bit slave
//! array padded out to the 8-byte action alignment.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::fmt;
use std::io::Cursor;

use crate::nicira::multipath::HashFields;
use crate::nicira::{finish_nxast, start_nxast, NXAST_BUNDLE, NXAST_BUNDLE_LOAD};
use crate::subfield::{Subfield, NXM_OF_IN_PORT};
use crate::{ActionError, Flow};

/// How a bundle picks among its live slaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleAlgorithm {
    /// Use the first live slave.
    ActiveBackup,
    /// Highest random weight over the hashed flow.
    Hrw,
}

impl BundleAlgorithm {
    fn from_u16(value: u16) -> Result<BundleAlgorithm, ActionError> {
        match value {
            0 => Ok(BundleAlgorithm::ActiveBackup),
            1 => Ok(BundleAlgorithm::Hrw),
            _ => Err(ActionError::BadArgument),
        }
    }

    fn to_u16(self) -> u16 {
        match self {
            BundleAlgorithm::ActiveBackup => 0,
            BundleAlgorithm::Hrw => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            BundleAlgorithm::ActiveBackup => "active_backup",
            BundleAlgorithm::Hrw => "hrw",
        }
    }
}

/// Distributes flows across a set of slave ports.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// Slave selection algorithm.
    pub algorithm: BundleAlgorithm,
    /// What to hash when the algorithm hashes.
    pub fields: HashFields,
    /// Universal hash parameter.
    pub basis: u16,
    /// The slave ports to choose from.
    pub slaves: Vec<u16>,
    /// `Some` for the `bundle_load` form: where the chosen port lands.
    pub dst: Option<Subfield>,
}

/// Fixed part of the wire body, after the Nicira action header.
const BUNDLE_BODY_FIXED: usize = 22;

impl Bundle {
    /// Parses the body of an `NXAST_BUNDLE` or `NXAST_BUNDLE_LOAD` action.
    ///
    /// `body` must include the slave array and its padding; the overall
    /// record length is validated against the slave count.
    pub fn from_wire(body: &[u8], load: bool) -> Result<Bundle, ActionError> {
        let mut cur = Cursor::new(body);
        let algorithm = BundleAlgorithm::from_u16(cur.read_u16::<BigEndian>()?)?;
        let fields = HashFields::from_u16(cur.read_u16::<BigEndian>()?)?;
        let basis = cur.read_u16::<BigEndian>()?;
        let slave_type = cur.read_u32::<BigEndian>()?;
        let n_slaves = cur.read_u16::<BigEndian>()? as usize;
        let ofs_nbits = cur.read_u16::<BigEndian>()?;
        let dst = cur.read_u32::<BigEndian>()?;
        let mut zero = [0; 4];
        std::io::Read::read_exact(&mut cur, &mut zero)?;

        if slave_type != NXM_OF_IN_PORT {
            return Err(ActionError::BadArgument);
        }
        if zero != [0; 4] {
            return Err(ActionError::BadArgument);
        }

        // The record length must cover exactly the slave array, rounded up
        // to the action alignment. The Nicira action header is 10 bytes.
        let unpadded = 10 + BUNDLE_BODY_FIXED + 2 * n_slaves;
        let padded = (unpadded + 7) / 8 * 8;
        if body.len() + 10 != padded {
            return Err(ActionError::BadLen);
        }

        let mut slaves = Vec::with_capacity(n_slaves);
        for _ in 0..n_slaves {
            slaves.push(cur.read_u16::<BigEndian>()?);
        }

        let dst = if load {
            let dst = Subfield::decode(dst, ofs_nbits)?;
            dst.check_dst(None)?;
            Some(dst)
        } else {
            // The plain form must leave the load-only fields zero.
            if ofs_nbits != 0 || dst != 0 {
                return Err(ActionError::BadArgument);
            }
            None
        };

        Ok(Bundle {
            algorithm,
            fields,
            basis,
            slaves,
            dst,
        })
    }

    /// Appends this record as an `NXAST_BUNDLE` or `NXAST_BUNDLE_LOAD`
    /// action, padding the slave array to the action alignment.
    pub fn to_wire(&self, out: &mut Vec<u8>) -> Result<(), ActionError> {
        let subtype = if self.dst.is_some() {
            NXAST_BUNDLE_LOAD
        } else {
            NXAST_BUNDLE
        };
        let start = start_nxast(out, subtype)?;
        out.write_u16::<BigEndian>(self.algorithm.to_u16())?;
        out.write_u16::<BigEndian>(self.fields.to_u16())?;
        out.write_u16::<BigEndian>(self.basis)?;
        out.write_u32::<BigEndian>(NXM_OF_IN_PORT)?;
        out.write_u16::<BigEndian>(self.slaves.len() as u16)?;
        match &self.dst {
            Some(dst) => {
                out.write_u16::<BigEndian>(dst.ofs_nbits())?;
                out.write_u32::<BigEndian>(dst.field.header)?;
            }
            None => {
                out.write_u16::<BigEndian>(0)?;
                out.write_u32::<BigEndian>(0)?;
            }
        }
        out.write_u32::<BigEndian>(0)?;
        for slave in &self.slaves {
            out.write_u16::<BigEndian>(*slave)?;
        }
        finish_nxast(out, start)
    }

    /// Checks the destination, if any, against the flow's prerequisites.
    pub fn check(&self, flow: &Flow) -> Result<(), ActionError> {
        match &self.dst {
            Some(dst) => dst.check_dst(Some(flow)),
            None => Ok(()),
        }
    }

    pub(crate) fn read_payload(body: &[u8]) -> Result<Bundle, ActionError> {
        let mut cur = Cursor::new(body);
        let algorithm = BundleAlgorithm::from_u16(cur.read_u16::<BigEndian>()?)?;
        let fields = HashFields::from_u16(cur.read_u16::<BigEndian>()?)?;
        let basis = cur.read_u16::<BigEndian>()?;
        let n_slaves = cur.read_u16::<BigEndian>()? as usize;
        let ofs_nbits = cur.read_u16::<BigEndian>()?;
        let dst_header = cur.read_u32::<BigEndian>()?;
        let dst = if dst_header != 0 {
            Some(Subfield::decode(dst_header, ofs_nbits)?)
        } else {
            None
        };
        let mut slaves = Vec::with_capacity(n_slaves);
        for _ in 0..n_slaves {
            slaves.push(cur.read_u16::<BigEndian>()?);
        }
        Ok(Bundle {
            algorithm,
            fields,
            basis,
            slaves,
            dst,
        })
    }

    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        buf.write_u16::<BigEndian>(self.algorithm.to_u16())?;
        buf.write_u16::<BigEndian>(self.fields.to_u16())?;
        buf.write_u16::<BigEndian>(self.basis)?;
        buf.write_u16::<BigEndian>(self.slaves.len() as u16)?;
        match &self.dst {
            Some(dst) => {
                buf.write_u16::<BigEndian>(dst.ofs_nbits())?;
                buf.write_u32::<BigEndian>(dst.field.header)?;
            }
            None => {
                buf.write_u16::<BigEndian>(0)?;
                buf.write_u32::<BigEndian>(0)?;
            }
        }
        for slave in &self.slaves {
            buf.write_u16::<BigEndian>(*slave)?;
        }
        Ok(())
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.dst {
            Some(dst) => write!(
                f,
                "bundle_load({},{},{},ofport,{}",
                self.fields.name(),
                self.basis,
                self.algorithm.name(),
                dst
            )?,
            None => write!(
                f,
                "bundle({},{},{},ofport",
                self.fields.name(),
                self.basis,
                self.algorithm.name()
            )?,
        }
        f.write_str(",slaves:")?;
        for (i, slave) in self.slaves.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", slave)?;
        }
        f.write_str(")")
    }
}
