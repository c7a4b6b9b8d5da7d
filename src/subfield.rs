//! NXM match fields and sub-field references.
//!
//! Several Nicira extension actions name a contiguous bit range inside a
//! match field: register loads and moves, `output_reg`, `bundle_load`,
//! `multipath`, `autopath`, and the learn action's flow-mod specs. This
//! module carries the registry of addressable fields and the [`Subfield`]
//! type those actions share.

use std::fmt;

use crate::{ActionError, Flow, ETH_TYPE_ARP, ETH_TYPE_IP, IPPROTO_TCP, IPPROTO_UDP};

/// What a flow must already match for a field to be meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    /// Always meaningful.
    None,
    /// Requires `dl_type == 0x0800`.
    Ipv4,
    /// Requires `dl_type == 0x0806`.
    Arp,
    /// Requires IPv4 and `nw_proto == 6`.
    Tcp,
    /// Requires IPv4 and `nw_proto == 17`.
    Udp,
}

/// A match field addressable through an NXM header.
#[derive(Debug, PartialEq, Eq)]
pub struct MfField {
    /// Canonical NXM name, as used in the text rendering.
    pub name: &'static str,
    /// NXM header with the has-mask bit clear.
    pub header: u32,
    /// Width of the field in bits.
    pub n_bits: u16,
    /// Whether actions may write the field.
    pub writable: bool,
    /// Match prerequisite.
    pub prereq: Prerequisite,
}

static FIELDS: &[MfField] = &[
    MfField {
        name: "NXM_OF_IN_PORT",
        header: 0x0000_0002,
        n_bits: 16,
        writable: false,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_OF_ETH_DST",
        header: 0x0000_0206,
        n_bits: 48,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_OF_ETH_SRC",
        header: 0x0000_0406,
        n_bits: 48,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_OF_ETH_TYPE",
        header: 0x0000_0602,
        n_bits: 16,
        writable: false,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_OF_VLAN_TCI",
        header: 0x0000_0802,
        n_bits: 16,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_OF_IP_TOS",
        header: 0x0000_0a01,
        n_bits: 8,
        writable: true,
        prereq: Prerequisite::Ipv4,
    },
    MfField {
        name: "NXM_OF_IP_PROTO",
        header: 0x0000_0c01,
        n_bits: 8,
        writable: false,
        prereq: Prerequisite::Ipv4,
    },
    MfField {
        name: "NXM_OF_IP_SRC",
        header: 0x0000_0e04,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::Ipv4,
    },
    MfField {
        name: "NXM_OF_IP_DST",
        header: 0x0000_1004,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::Ipv4,
    },
    MfField {
        name: "NXM_OF_TCP_SRC",
        header: 0x0000_1202,
        n_bits: 16,
        writable: true,
        prereq: Prerequisite::Tcp,
    },
    MfField {
        name: "NXM_OF_TCP_DST",
        header: 0x0000_1402,
        n_bits: 16,
        writable: true,
        prereq: Prerequisite::Tcp,
    },
    MfField {
        name: "NXM_OF_UDP_SRC",
        header: 0x0000_1602,
        n_bits: 16,
        writable: true,
        prereq: Prerequisite::Udp,
    },
    MfField {
        name: "NXM_OF_UDP_DST",
        header: 0x0000_1802,
        n_bits: 16,
        writable: true,
        prereq: Prerequisite::Udp,
    },
    MfField {
        name: "NXM_OF_ARP_OP",
        header: 0x0000_1e02,
        n_bits: 16,
        writable: false,
        prereq: Prerequisite::Arp,
    },
    MfField {
        name: "NXM_OF_ARP_SPA",
        header: 0x0000_2004,
        n_bits: 32,
        writable: false,
        prereq: Prerequisite::Arp,
    },
    MfField {
        name: "NXM_OF_ARP_TPA",
        header: 0x0000_2204,
        n_bits: 32,
        writable: false,
        prereq: Prerequisite::Arp,
    },
    MfField {
        name: "NXM_NX_REG0",
        header: 0x0001_0004,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG1",
        header: 0x0001_0204,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG2",
        header: 0x0001_0404,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG3",
        header: 0x0001_0604,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG4",
        header: 0x0001_0804,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG5",
        header: 0x0001_0a04,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG6",
        header: 0x0001_0c04,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_REG7",
        header: 0x0001_0e04,
        n_bits: 32,
        writable: true,
        prereq: Prerequisite::None,
    },
    MfField {
        name: "NXM_NX_TUN_ID",
        header: 0x0001_2008,
        n_bits: 64,
        writable: true,
        prereq: Prerequisite::None,
    },
];

/// NXM header of `NXM_OF_IN_PORT`, the only legal bundle slave type.
pub const NXM_OF_IN_PORT: u32 = 0x0000_0002;

/// Looks up a match field by its NXM header.
pub fn mf_from_header(header: u32) -> Option<&'static MfField> {
    FIELDS.iter().find(|f| f.header == header)
}

impl MfField {
    fn prereq_ok(&self, flow: &Flow) -> bool {
        match self.prereq {
            Prerequisite::None => true,
            Prerequisite::Ipv4 => flow.dl_type == ETH_TYPE_IP,
            Prerequisite::Arp => flow.dl_type == ETH_TYPE_ARP,
            Prerequisite::Tcp => flow.dl_type == ETH_TYPE_IP && flow.nw_proto == IPPROTO_TCP,
            Prerequisite::Udp => flow.dl_type == ETH_TYPE_IP && flow.nw_proto == IPPROTO_UDP,
        }
    }
}

/// A contiguous bit range `[ofs, ofs + n_bits)` inside a match field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subfield {
    /// The containing match field.
    pub field: &'static MfField,
    /// First bit of the range, counting from the least significant bit.
    pub ofs: u16,
    /// Number of bits in the range.
    pub n_bits: u16,
}

impl Subfield {
    /// Builds a sub-field from an NXM header plus an explicit bit range.
    pub fn from_header(header: u32, ofs: u16, n_bits: u16) -> Result<Subfield, ActionError> {
        let field = match mf_from_header(header) {
            Some(field) => field,
            None => {
                if crate::util::BAD_WIRE.should_log() {
                    log::warn!("unknown NXM field header {:#010x}", header);
                }
                return Err(ActionError::BadArgument);
            }
        };
        Ok(Subfield {
            field,
            ofs,
            n_bits,
        })
    }

    /// Builds a sub-field from an NXM header and the packed
    /// `(ofs << 6) | (n_bits - 1)` wire descriptor.
    pub fn decode(header: u32, ofs_nbits: u16) -> Result<Subfield, ActionError> {
        Subfield::from_header(header, ofs_nbits >> 6, (ofs_nbits & 0x3f) + 1)
    }

    /// Returns the packed `(ofs << 6) | (n_bits - 1)` wire descriptor.
    ///
    /// Only meaningful for ranges of at most 64 bits, which is all the packed
    /// form can express.
    pub fn ofs_nbits(&self) -> u16 {
        (self.ofs << 6) | (self.n_bits - 1)
    }

    fn check_range(&self) -> Result<(), ActionError> {
        let end = u32::from(self.ofs) + u32::from(self.n_bits);
        if self.n_bits == 0 || end > u32::from(self.field.n_bits) {
            return Err(ActionError::BadArgument);
        }
        Ok(())
    }

    /// Checks that this sub-field may be read, and, if a flow is supplied,
    /// that the flow satisfies the field's match prerequisite.
    pub fn check_src(&self, flow: Option<&Flow>) -> Result<(), ActionError> {
        self.check_range()?;
        if let Some(flow) = flow {
            if !self.field.prereq_ok(flow) {
                return Err(ActionError::BadArgument);
            }
        }
        Ok(())
    }

    /// Like [`Subfield::check_src`], but additionally requires the field to
    /// be writable.
    pub fn check_dst(&self, flow: Option<&Flow>) -> Result<(), ActionError> {
        if !self.field.writable {
            return Err(ActionError::BadArgument);
        }
        self.check_src(flow)
    }
}

impl fmt::Display for Subfield {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.ofs == 0 && self.n_bits == self.field.n_bits {
            write!(f, "{}[]", self.field.name)
        } else if self.n_bits == 1 {
            write!(f, "{}[{}]", self.field.name, self.ofs)
        } else {
            write!(
                f,
                "{}[{}..{}]",
                self.field.name,
                self.ofs,
                self.ofs + self.n_bits - 1
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg0(ofs: u16, n_bits: u16) -> Subfield {
        Subfield::from_header(0x0001_0004, ofs, n_bits).unwrap()
    }

    #[test]
    fn test_ofs_nbits_round_trip() {
        let sf = reg0(5, 10);
        assert_eq!(sf.ofs_nbits(), (5 << 6) | 9);
        let back = Subfield::decode(0x0001_0004, sf.ofs_nbits()).unwrap();
        assert_eq!(back, sf);
    }

    #[test]
    fn test_unknown_header() {
        assert_eq!(
            Subfield::from_header(0xdead_beef, 0, 1),
            Err(ActionError::BadArgument)
        );
    }

    #[test]
    fn test_range_checks() {
        assert!(reg0(0, 32).check_src(None).is_ok());
        assert_eq!(reg0(16, 17).check_src(None), Err(ActionError::BadArgument));
        assert_eq!(reg0(3, 0).check_src(None), Err(ActionError::BadArgument));
    }

    #[test]
    fn test_writability() {
        let in_port = Subfield::from_header(0x0000_0002, 0, 16).unwrap();
        assert!(in_port.check_src(None).is_ok());
        assert_eq!(in_port.check_dst(None), Err(ActionError::BadArgument));
    }

    #[test]
    fn test_prerequisites() {
        let tcp_src = Subfield::from_header(0x0000_1202, 0, 16).unwrap();
        let mut flow = Flow::default();
        assert_eq!(
            tcp_src.check_src(Some(&flow)),
            Err(ActionError::BadArgument)
        );
        flow.dl_type = ETH_TYPE_IP;
        flow.nw_proto = IPPROTO_TCP;
        assert!(tcp_src.check_src(Some(&flow)).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(reg0(0, 32).to_string(), "NXM_NX_REG0[]");
        assert_eq!(reg0(3, 1).to_string(), "NXM_NX_REG0[3]");
        assert_eq!(reg0(0, 6).to_string(), "NXM_NX_REG0[0..5]");
    }
}
