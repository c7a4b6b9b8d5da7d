//! The multipath link-selection sub-codec.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::fmt;
use std::io::Cursor;

use crate::nicira::{put_nxast_header, NXAST_MULTIPATH};
use crate::subfield::Subfield;
use crate::{ActionError, Flow};

/// Which packet fields feed a link-selection hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFields {
    /// Hash the Ethernet source address only.
    EthSrc,
    /// Hash the canonicalized 5-tuple.
    SymmetricL4,
}

impl HashFields {
    pub(crate) fn from_u16(value: u16) -> Result<HashFields, ActionError> {
        match value {
            0 => Ok(HashFields::EthSrc),
            1 => Ok(HashFields::SymmetricL4),
            _ => Err(ActionError::BadArgument),
        }
    }

    pub(crate) fn to_u16(self) -> u16 {
        match self {
            HashFields::EthSrc => 0,
            HashFields::SymmetricL4 => 1,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            HashFields::EthSrc => "eth_src",
            HashFields::SymmetricL4 => "symmetric_l4",
        }
    }
}

/// How a multipath hash is mapped onto a link number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipathAlgorithm {
    /// `hash % n_links`.
    ModuloN,
    /// Split the hash space into consecutive per-link bands.
    HashThreshold,
    /// Highest random weight.
    Hrw,
    /// Iterated hashing, for large numbers of links.
    IterHash,
}

impl MultipathAlgorithm {
    fn from_u16(value: u16) -> Result<MultipathAlgorithm, ActionError> {
        match value {
            0 => Ok(MultipathAlgorithm::ModuloN),
            1 => Ok(MultipathAlgorithm::HashThreshold),
            2 => Ok(MultipathAlgorithm::Hrw),
            3 => Ok(MultipathAlgorithm::IterHash),
            _ => Err(ActionError::BadArgument),
        }
    }

    fn to_u16(self) -> u16 {
        match self {
            MultipathAlgorithm::ModuloN => 0,
            MultipathAlgorithm::HashThreshold => 1,
            MultipathAlgorithm::Hrw => 2,
            MultipathAlgorithm::IterHash => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            MultipathAlgorithm::ModuloN => "modulo_n",
            MultipathAlgorithm::HashThreshold => "hash_threshold",
            MultipathAlgorithm::Hrw => "hrw",
            MultipathAlgorithm::IterHash => "iter_hash",
        }
    }
}

/// Hashes the flow onto one of `max_link + 1` links and writes the link
/// number into a sub-field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multipath {
    /// What to hash.
    pub fields: HashFields,
    /// Universal hash parameter.
    pub basis: u16,
    /// Link selection algorithm.
    pub algorithm: MultipathAlgorithm,
    /// Number of links, minus one.
    pub max_link: u16,
    /// Algorithm-specific argument.
    pub arg: u32,
    /// Where the chosen link number lands.
    pub dst: Subfield,
}

impl Multipath {
    /// Parses the body of an `NXAST_MULTIPATH` action.
    pub fn from_wire(body: &[u8]) -> Result<Multipath, ActionError> {
        let multipath = Multipath::read_payload(body)?;
        multipath.dst.check_dst(None)?;
        Ok(multipath)
    }

    /// Appends this record as an `NXAST_MULTIPATH` action.
    pub fn to_wire(&self, out: &mut Vec<u8>) -> Result<(), ActionError> {
        put_nxast_header(out, NXAST_MULTIPATH, 32)?;
        self.write_payload(out)
    }

    /// Checks the destination against the flow's match prerequisites.
    pub fn check(&self, flow: &Flow) -> Result<(), ActionError> {
        self.dst.check_dst(Some(flow))
    }

    pub(crate) fn read_payload(body: &[u8]) -> Result<Multipath, ActionError> {
        let mut cur = Cursor::new(body);
        let fields = HashFields::from_u16(cur.read_u16::<BigEndian>()?)?;
        let basis = cur.read_u16::<BigEndian>()?;
        cur.read_u16::<BigEndian>()?;
        let algorithm = MultipathAlgorithm::from_u16(cur.read_u16::<BigEndian>()?)?;
        let max_link = cur.read_u16::<BigEndian>()?;
        let arg = cur.read_u32::<BigEndian>()?;
        cur.read_u16::<BigEndian>()?;
        let ofs_nbits = cur.read_u16::<BigEndian>()?;
        let dst = cur.read_u32::<BigEndian>()?;
        Ok(Multipath {
            fields,
            basis,
            algorithm,
            max_link,
            arg,
            dst: Subfield::decode(dst, ofs_nbits)?,
        })
    }

    pub(crate) fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        buf.write_u16::<BigEndian>(self.fields.to_u16())?;
        buf.write_u16::<BigEndian>(self.basis)?;
        buf.write_u16::<BigEndian>(0)?;
        buf.write_u16::<BigEndian>(self.algorithm.to_u16())?;
        buf.write_u16::<BigEndian>(self.max_link)?;
        buf.write_u32::<BigEndian>(self.arg)?;
        buf.write_u16::<BigEndian>(0)?;
        buf.write_u16::<BigEndian>(self.dst.ofs_nbits())?;
        buf.write_u32::<BigEndian>(self.dst.field.header)?;
        Ok(())
    }
}

impl fmt::Display for Multipath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "multipath({},{},{},{},{},{})",
            self.fields.name(),
            self.basis,
            self.algorithm.name(),
            self.max_link,
            self.arg,
            self.dst
        )
    }
}
