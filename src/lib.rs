#![deny(missing_docs)]

//! The `ofp-actions` crate translates between the OpenFlow 1.0 and 1.1 wire
//! encodings of actions (plus the Nicira vendor-extension action family) and a
//! flat internal action stream, the [`ActionBuffer`].
//!
//! The internal stream is what the rest of a switch works with: a packed,
//! aligned sequence of typed records that can be validated against a flow,
//! re-encoded to either wire dialect, and rendered as the familiar
//! `actions=...` text.
//!
//! # Examples
//!
//! ## Decoding and re-encoding an OpenFlow 1.0 action list
//! ```
//! use ofp_actions::{decode_openflow10_actions, encode_openflow10_actions, ActionBuffer, Ofpact};
//!
//! // A single OFPAT_OUTPUT action: output to port 1, max_len 0.
//! let wire = [0x00, 0x00, 0x00, 0x08, 0x00, 0x01, 0x00, 0x00];
//!
//! let mut actions = ActionBuffer::new();
//! decode_openflow10_actions(&wire, wire.len(), &mut actions).unwrap();
//!
//! let decoded: Vec<Ofpact> = actions.iter().collect();
//! assert_eq!(decoded, vec![Ofpact::Output { port: 1, max_len: 0 }]);
//! assert_eq!(actions.to_string(), "actions=output:1");
//!
//! // Re-encoding yields the identical bytes.
//! let mut out = Vec::new();
//! encode_openflow10_actions(&actions, &mut out).unwrap();
//! assert_eq!(out, wire);
//! ```

/// Contains the internal action record model and its packed buffer.
pub mod ofpact;

/// Contains the OpenFlow 1.0 action codec.
pub mod openflow10;

/// Contains the OpenFlow 1.1 action and instruction codec.
pub mod openflow11;

/// Contains the Nicira vendor-extension action codec.
pub mod nicira;

/// Contains NXM match-field and sub-field handling.
pub mod subfield;

mod format;
mod util;

use std::fmt;
use std::io::Error as IoError;
use std::net::Ipv4Addr;

pub use crate::nicira::autopath::Autopath;
pub use crate::nicira::bundle::{Bundle, BundleAlgorithm};
pub use crate::nicira::learn::{Learn, LearnDst, LearnFlags, LearnSpec, LearnSrc};
pub use crate::nicira::multipath::{HashFields, Multipath, MultipathAlgorithm};
pub use crate::nicira::reg::{RegLoad, RegMove};
pub use crate::ofpact::*;
pub use crate::openflow10::{decode_openflow10_actions, encode_openflow10_actions};
pub use crate::openflow11::{
    decode_openflow11_instructions, encode_openflow11_instructions, InstructionType,
};
pub use crate::subfield::*;

/// Largest regular OpenFlow 1.0 port number. Everything above is reserved.
pub const OFPP_MAX: u16 = 0xff00;
/// Send the packet back out its input port.
pub const OFPP_IN_PORT: u16 = 0xfff8;
/// Submit the packet to the flow table.
pub const OFPP_TABLE: u16 = 0xfff9;
/// Process with normal L2/L3 switching.
pub const OFPP_NORMAL: u16 = 0xfffa;
/// All physical ports except input port and those disabled by STP.
pub const OFPP_FLOOD: u16 = 0xfffb;
/// All physical ports except input port.
pub const OFPP_ALL: u16 = 0xfffc;
/// Send to controller.
pub const OFPP_CONTROLLER: u16 = 0xfffd;
/// Local openflow "port".
pub const OFPP_LOCAL: u16 = 0xfffe;
/// Not associated with any port.
pub const OFPP_NONE: u16 = 0xffff;

/// Largest regular OpenFlow 1.1 port number.
pub const OFPP11_MAX: u32 = 0xffff_ff00;
/// Offset between the OpenFlow 1.1 and 1.0 reserved port ranges.
pub const OFPP11_OFFSET: u32 = 0xffff_0000;

/// Returns the well-known name of a reserved port, if `port` is reserved.
pub fn port_name(port: u16) -> Option<&'static str> {
    match port {
        OFPP_IN_PORT => Some("IN_PORT"),
        OFPP_TABLE => Some("TABLE"),
        OFPP_NORMAL => Some("NORMAL"),
        OFPP_FLOOD => Some("FLOOD"),
        OFPP_ALL => Some("ALL"),
        OFPP_CONTROLLER => Some("CONTROLLER"),
        OFPP_LOCAL => Some("LOCAL"),
        OFPP_NONE => Some("NONE"),
        _ => None,
    }
}

/// Checks that `port` is a valid output port: either below `max_ports` or one
/// of the reserved ports.
pub fn check_output_port(port: u16, max_ports: u16) -> Result<(), ActionError> {
    if port < max_ports || port_name(port).is_some() {
        Ok(())
    } else {
        Err(ActionError::BadOutPort)
    }
}

/// Translates an OpenFlow 1.1 32-bit port number into the internal 16-bit
/// representation.
///
/// Reserved ports sit at `OFPP11_OFFSET` above their 16-bit counterparts; the
/// dead zone between the regular and reserved ranges has no 16-bit
/// representation and is rejected.
pub fn port_from_ofp11(port: u32) -> Result<u16, ActionError> {
    if port < u32::from(OFPP_MAX) {
        Ok(port as u16)
    } else if port >= OFPP11_OFFSET {
        Ok((port - OFPP11_OFFSET) as u16)
    } else {
        if util::BAD_WIRE.should_log() {
            log::warn!("port {:#x} has no OpenFlow 1.0 equivalent", port);
        }
        Err(ActionError::BadOutPort)
    }
}

/// Translates an internal 16-bit port number into the OpenFlow 1.1 32-bit
/// representation.
pub fn port_to_ofp11(port: u16) -> u32 {
    if port < OFPP_MAX {
        u32::from(port)
    } else {
        u32::from(port) + OFPP11_OFFSET
    }
}

/// The closed set of errors the codec can signal.
///
/// The first error aborts a decode or check; a failed decode leaves the
/// output [`ActionBuffer`] empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// A wire length field is inconsistent, misaligned, or exceeds the
    /// remaining span.
    BadLen,
    /// An unknown or obsolete action type.
    BadType,
    /// A vendor action carried a vendor id other than the Nicira id.
    BadVendor,
    /// A reserved field was non-zero, or a value was outside its permitted
    /// range.
    BadArgument,
    /// A port number out of range and not a recognized reserved port.
    BadOutPort,
    /// An unknown OpenFlow 1.1 instruction type.
    UnknownInst,
    /// A known but unsupported OpenFlow 1.1 instruction type.
    UnsupInst,
    /// The same instruction type appeared twice in one instruction block.
    DupType,
    /// An experimenter instruction, which is not supported.
    BadExperimenter,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            ActionError::BadLen => "bad wire length",
            ActionError::BadType => "unknown or obsolete action type",
            ActionError::BadVendor => "unknown vendor id",
            ActionError::BadArgument => "bad action argument",
            ActionError::BadOutPort => "bad output port",
            ActionError::UnknownInst => "unknown instruction type",
            ActionError::UnsupInst => "unsupported instruction type",
            ActionError::DupType => "duplicate instruction type",
            ActionError::BadExperimenter => "unsupported experimenter instruction",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ActionError {}

impl From<IoError> for ActionError {
    /// A short read while parsing a wire struct is always a length problem:
    /// the record's length field promised more bytes than it carried.
    fn from(_: IoError) -> ActionError {
        ActionError::BadLen
    }
}

/// The flow context a decoded action stream is validated against.
///
/// Only the fields that feed match prerequisites (`dl_type`, `nw_proto`) are
/// consulted by this crate; the rest ride along so one struct can describe a
/// full flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    /// Input switch port.
    pub in_port: u16,
    /// Ethernet source address.
    pub dl_src: [u8; 6],
    /// Ethernet destination address.
    pub dl_dst: [u8; 6],
    /// Ethernet frame type.
    pub dl_type: u16,
    /// VLAN TCI, zero if no 802.1Q header present.
    pub vlan_tci: u16,
    /// IPv4 source address.
    pub nw_src: Ipv4Addr,
    /// IPv4 destination address.
    pub nw_dst: Ipv4Addr,
    /// IP protocol or low 8 bits of ARP opcode.
    pub nw_proto: u8,
    /// IP ToS byte.
    pub nw_tos: u8,
    /// TCP/UDP source port.
    pub tp_src: u16,
    /// TCP/UDP destination port.
    pub tp_dst: u16,
    /// Encapsulating tunnel id, zero if none.
    pub tun_id: u64,
    /// Nicira extension registers.
    pub regs: [u32; 8],
}

impl Default for Flow {
    fn default() -> Flow {
        Flow {
            in_port: 0,
            dl_src: [0; 6],
            dl_dst: [0; 6],
            dl_type: 0,
            vlan_tci: 0,
            nw_src: Ipv4Addr::UNSPECIFIED,
            nw_dst: Ipv4Addr::UNSPECIFIED,
            nw_proto: 0,
            nw_tos: 0,
            tp_src: 0,
            tp_dst: 0,
            tun_id: 0,
            regs: [0; 8],
        }
    }
}

/// Ethernet frame type for IPv4.
pub const ETH_TYPE_IP: u16 = 0x0800;
/// Ethernet frame type for ARP.
pub const ETH_TYPE_ARP: u16 = 0x0806;
/// IP protocol number for TCP.
pub const IPPROTO_TCP: u8 = 6;
/// IP protocol number for UDP.
pub const IPPROTO_UDP: u8 = 17;
