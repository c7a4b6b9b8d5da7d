//! The internal action representation.
//!
//! Wire actions from every supported dialect decode into one closed set of
//! records, packed back-to-back into an [`ActionBuffer`]. Each record is a
//! `{type, compat, len}` header followed by a type-specific payload, starts
//! on an [`OFPACT_ALIGN`] boundary, and the stream ends with a single
//! sentinel record. The packed layout is canonical: two streams are equal
//! exactly when their bytes are equal.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};

use std::fmt;
use std::io::Cursor;
use std::net::Ipv4Addr;

use crate::nicira::autopath::Autopath;
use crate::nicira::bundle::Bundle;
use crate::nicira::learn::Learn;
use crate::nicira::multipath::Multipath;
use crate::nicira::reg::{RegLoad, RegMove};
use crate::subfield::Subfield;
use crate::{check_output_port, ActionError, Flow, OFPP_CONTROLLER, OFPP_IN_PORT, OFPP_LOCAL, OFPP_MAX};

/// Alignment of records inside an [`ActionBuffer`].
pub const OFPACT_ALIGN: usize = 8;

/// Size of the record header: type, compat, len, and a pad word.
const HEADER_LEN: usize = 8;

/// Internal record type numbers. These never appear on the wire; they only
/// index the packed buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub(crate) enum OfpactType {
    End = 0,
    Output = 1,
    Controller = 2,
    Enqueue = 3,
    OutputReg = 4,
    Bundle = 5,
    SetVlanVid = 6,
    SetVlanPcp = 7,
    StripVlan = 8,
    SetEthSrc = 9,
    SetEthDst = 10,
    SetIpv4Src = 11,
    SetIpv4Dst = 12,
    SetIpv4Dscp = 13,
    SetL4SrcPort = 14,
    SetL4DstPort = 15,
    SetTunnel = 16,
    SetQueue = 17,
    PopQueue = 18,
    RegMove = 19,
    RegLoad = 20,
    DecTtl = 21,
    FinTimeout = 22,
    Resubmit = 23,
    Learn = 24,
    Multipath = 25,
    Autopath = 26,
    Note = 27,
    Exit = 28,
}

impl OfpactType {
    fn from_u16(value: u16) -> Option<OfpactType> {
        use self::OfpactType::*;
        Some(match value {
            0 => End,
            1 => Output,
            2 => Controller,
            3 => Enqueue,
            4 => OutputReg,
            5 => Bundle,
            6 => SetVlanVid,
            7 => SetVlanPcp,
            8 => StripVlan,
            9 => SetEthSrc,
            10 => SetEthDst,
            11 => SetIpv4Src,
            12 => SetIpv4Dst,
            13 => SetIpv4Dscp,
            14 => SetL4SrcPort,
            15 => SetL4DstPort,
            16 => SetTunnel,
            17 => SetQueue,
            18 => PopQueue,
            19 => RegMove,
            20 => RegLoad,
            21 => DecTtl,
            22 => FinTimeout,
            23 => Resubmit,
            24 => Learn,
            25 => Multipath,
            26 => Autopath,
            27 => Note,
            28 => Exit,
            _ => return None,
        })
    }
}

/// Remembers which wire subtype produced a record, so re-encoding can pick
/// the same spelling among equivalent wire forms.
///
/// The raw values are the producing Nicira subtype numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compat {
    /// Not produced by an ambiguous wire form.
    None,
    /// Produced by `NXAST_RESUBMIT`.
    Resubmit,
    /// Produced by `NXAST_RESUBMIT_TABLE`.
    ResubmitTable,
    /// Produced by `NXAST_SET_TUNNEL`, the 32-bit tunnel id form.
    SetTunnel,
    /// Produced by `NXAST_SET_TUNNEL64`, the 64-bit tunnel id form.
    SetTunnel64,
}

impl Compat {
    fn to_u16(self) -> u16 {
        match self {
            Compat::None => 0,
            Compat::Resubmit => crate::nicira::NXAST_RESUBMIT,
            Compat::ResubmitTable => crate::nicira::NXAST_RESUBMIT_TABLE,
            Compat::SetTunnel => crate::nicira::NXAST_SET_TUNNEL,
            Compat::SetTunnel64 => crate::nicira::NXAST_SET_TUNNEL64,
        }
    }

    fn from_u16(value: u16) -> Compat {
        match value {
            v if v == crate::nicira::NXAST_RESUBMIT => Compat::Resubmit,
            v if v == crate::nicira::NXAST_RESUBMIT_TABLE => Compat::ResubmitTable,
            v if v == crate::nicira::NXAST_SET_TUNNEL => Compat::SetTunnel,
            v if v == crate::nicira::NXAST_SET_TUNNEL64 => Compat::SetTunnel64,
            _ => Compat::None,
        }
    }
}

/// Why a packet is being sent to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerReason {
    /// No matching flow.
    NoMatch,
    /// An action explicitly asked for it.
    Action,
    /// The packet had an invalid TTL.
    InvalidTtl,
}

impl ControllerReason {
    pub(crate) fn from_u8(value: u8) -> Result<ControllerReason, ActionError> {
        match value {
            0 => Ok(ControllerReason::NoMatch),
            1 => Ok(ControllerReason::Action),
            2 => Ok(ControllerReason::InvalidTtl),
            _ => Err(ActionError::BadArgument),
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            ControllerReason::NoMatch => 0,
            ControllerReason::Action => 1,
            ControllerReason::InvalidTtl => 2,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            ControllerReason::NoMatch => "no_match",
            ControllerReason::Action => "action",
            ControllerReason::InvalidTtl => "invalid_ttl",
        }
    }
}

/// One internal action record.
#[derive(Debug, Clone, PartialEq)]
pub enum Ofpact {
    /// Send the packet out a port.
    Output {
        /// Output port.
        port: u16,
        /// Bytes to send when the port is `OFPP_CONTROLLER`.
        max_len: u16,
    },
    /// Send the packet to an OpenFlow controller.
    Controller {
        /// Maximum number of bytes to send.
        max_len: u16,
        /// Which controller connection to use.
        controller_id: u16,
        /// Reported reason.
        reason: ControllerReason,
    },
    /// Send the packet out a port's queue.
    Enqueue {
        /// Output port.
        port: u16,
        /// Queue id on that port.
        queue: u32,
    },
    /// Send the packet out the port read from a register sub-field.
    OutputReg {
        /// Where the port number is read from.
        src: Subfield,
        /// Bytes to send when the port resolves to `OFPP_CONTROLLER`.
        max_len: u16,
    },
    /// Bond-style output distribution over a set of slave ports.
    Bundle(Bundle),
    /// Set the 802.1Q VLAN id.
    SetVlanVid(u16),
    /// Set the 802.1Q priority.
    SetVlanPcp(u8),
    /// Strip any 802.1Q header.
    StripVlan,
    /// Set the Ethernet source address.
    SetEthSrc([u8; 6]),
    /// Set the Ethernet destination address.
    SetEthDst([u8; 6]),
    /// Set the IPv4 source address.
    SetIpv4Src(Ipv4Addr),
    /// Set the IPv4 destination address.
    SetIpv4Dst(Ipv4Addr),
    /// Set the IPv4 DSCP bits.
    SetIpv4Dscp(u8),
    /// Set the TCP/UDP source port.
    SetL4SrcPort(u16),
    /// Set the TCP/UDP destination port.
    SetL4DstPort(u16),
    /// Set the encapsulating tunnel id.
    SetTunnel {
        /// Tunnel id to set.
        tun_id: u64,
        /// Which wire form produced this record.
        compat: Compat,
    },
    /// Set the output queue without outputting.
    SetQueue(u32),
    /// Restore the queue to the one the packet arrived with.
    PopQueue,
    /// Copy a sub-field onto another sub-field.
    RegMove(RegMove),
    /// Load an immediate value into a sub-field.
    RegLoad(RegLoad),
    /// Decrement the IP TTL.
    DecTtl,
    /// Change flow timeouts when a TCP FIN or RST is seen.
    FinTimeout {
        /// New idle timeout, zero to leave unchanged.
        idle_timeout: u16,
        /// New hard timeout, zero to leave unchanged.
        hard_timeout: u16,
    },
    /// Re-run the flow table with a different input port or table.
    Resubmit {
        /// Input port to pretend the packet arrived on.
        in_port: u16,
        /// Table to search, 0xff for the current table.
        table_id: u8,
        /// Which wire form produced this record.
        compat: Compat,
    },
    /// Set up a learned flow from the current packet.
    Learn(Learn),
    /// Hash the flow onto one of several links.
    Multipath(Multipath),
    /// Pick a live link from a bond.
    Autopath(Autopath),
    /// Free-form annotation carried in the flow table.
    Note(Vec<u8>),
    /// Stop processing further actions.
    Exit,
}

impl Ofpact {
    fn typ(&self) -> OfpactType {
        match self {
            Ofpact::Output { .. } => OfpactType::Output,
            Ofpact::Controller { .. } => OfpactType::Controller,
            Ofpact::Enqueue { .. } => OfpactType::Enqueue,
            Ofpact::OutputReg { .. } => OfpactType::OutputReg,
            Ofpact::Bundle(_) => OfpactType::Bundle,
            Ofpact::SetVlanVid(_) => OfpactType::SetVlanVid,
            Ofpact::SetVlanPcp(_) => OfpactType::SetVlanPcp,
            Ofpact::StripVlan => OfpactType::StripVlan,
            Ofpact::SetEthSrc(_) => OfpactType::SetEthSrc,
            Ofpact::SetEthDst(_) => OfpactType::SetEthDst,
            Ofpact::SetIpv4Src(_) => OfpactType::SetIpv4Src,
            Ofpact::SetIpv4Dst(_) => OfpactType::SetIpv4Dst,
            Ofpact::SetIpv4Dscp(_) => OfpactType::SetIpv4Dscp,
            Ofpact::SetL4SrcPort(_) => OfpactType::SetL4SrcPort,
            Ofpact::SetL4DstPort(_) => OfpactType::SetL4DstPort,
            Ofpact::SetTunnel { .. } => OfpactType::SetTunnel,
            Ofpact::SetQueue(_) => OfpactType::SetQueue,
            Ofpact::PopQueue => OfpactType::PopQueue,
            Ofpact::RegMove(_) => OfpactType::RegMove,
            Ofpact::RegLoad(_) => OfpactType::RegLoad,
            Ofpact::DecTtl => OfpactType::DecTtl,
            Ofpact::FinTimeout { .. } => OfpactType::FinTimeout,
            Ofpact::Resubmit { .. } => OfpactType::Resubmit,
            Ofpact::Learn(_) => OfpactType::Learn,
            Ofpact::Multipath(_) => OfpactType::Multipath,
            Ofpact::Autopath(_) => OfpactType::Autopath,
            Ofpact::Note(_) => OfpactType::Note,
            Ofpact::Exit => OfpactType::Exit,
        }
    }

    fn compat(&self) -> Compat {
        match self {
            Ofpact::SetTunnel { compat, .. } => *compat,
            Ofpact::Resubmit { compat, .. } => *compat,
            _ => Compat::None,
        }
    }

    fn write_payload(&self, buf: &mut Vec<u8>) -> Result<(), ActionError> {
        match self {
            Ofpact::Output { port, max_len } => {
                buf.write_u16::<BigEndian>(*port)?;
                buf.write_u16::<BigEndian>(*max_len)?;
            }
            Ofpact::Controller {
                max_len,
                controller_id,
                reason,
            } => {
                buf.write_u16::<BigEndian>(*max_len)?;
                buf.write_u16::<BigEndian>(*controller_id)?;
                buf.write_u8(reason.to_u8())?;
            }
            Ofpact::Enqueue { port, queue } => {
                buf.write_u16::<BigEndian>(*port)?;
                buf.write_u32::<BigEndian>(*queue)?;
            }
            Ofpact::OutputReg { src, max_len } => {
                buf.write_u32::<BigEndian>(src.field.header)?;
                buf.write_u16::<BigEndian>(src.ofs)?;
                buf.write_u16::<BigEndian>(src.n_bits)?;
                buf.write_u16::<BigEndian>(*max_len)?;
            }
            Ofpact::Bundle(bundle) => bundle.write_payload(buf)?,
            Ofpact::SetVlanVid(vid) => buf.write_u16::<BigEndian>(*vid)?,
            Ofpact::SetVlanPcp(pcp) => buf.write_u8(*pcp)?,
            Ofpact::StripVlan => {}
            Ofpact::SetEthSrc(mac) | Ofpact::SetEthDst(mac) => buf.extend_from_slice(mac),
            Ofpact::SetIpv4Src(addr) | Ofpact::SetIpv4Dst(addr) => {
                buf.extend_from_slice(&addr.octets())
            }
            Ofpact::SetIpv4Dscp(dscp) => buf.write_u8(*dscp)?,
            Ofpact::SetL4SrcPort(port) | Ofpact::SetL4DstPort(port) => {
                buf.write_u16::<BigEndian>(*port)?
            }
            Ofpact::SetTunnel { tun_id, .. } => buf.write_u64::<BigEndian>(*tun_id)?,
            Ofpact::SetQueue(queue) => buf.write_u32::<BigEndian>(*queue)?,
            Ofpact::PopQueue => {}
            Ofpact::RegMove(reg_move) => reg_move.write_payload(buf)?,
            Ofpact::RegLoad(reg_load) => reg_load.write_payload(buf)?,
            Ofpact::DecTtl => {}
            Ofpact::FinTimeout {
                idle_timeout,
                hard_timeout,
            } => {
                buf.write_u16::<BigEndian>(*idle_timeout)?;
                buf.write_u16::<BigEndian>(*hard_timeout)?;
            }
            Ofpact::Resubmit {
                in_port, table_id, ..
            } => {
                buf.write_u16::<BigEndian>(*in_port)?;
                buf.write_u8(*table_id)?;
            }
            Ofpact::Learn(learn) => learn.write_payload(buf)?,
            Ofpact::Multipath(multipath) => multipath.write_payload(buf)?,
            Ofpact::Autopath(autopath) => autopath.write_payload(buf)?,
            Ofpact::Note(data) => buf.extend_from_slice(data),
            Ofpact::Exit => {}
        }
        Ok(())
    }

    fn parse_payload(
        typ: OfpactType,
        compat: Compat,
        body: &[u8],
    ) -> Result<Ofpact, ActionError> {
        let mut cur = Cursor::new(body);
        let act = match typ {
            // The sentinel is handled by the iterator, never parsed here.
            OfpactType::End => return Err(ActionError::BadType),
            OfpactType::Output => Ofpact::Output {
                port: cur.read_u16::<BigEndian>()?,
                max_len: cur.read_u16::<BigEndian>()?,
            },
            OfpactType::Controller => Ofpact::Controller {
                max_len: cur.read_u16::<BigEndian>()?,
                controller_id: cur.read_u16::<BigEndian>()?,
                reason: ControllerReason::from_u8(cur.read_u8()?)?,
            },
            OfpactType::Enqueue => Ofpact::Enqueue {
                port: cur.read_u16::<BigEndian>()?,
                queue: cur.read_u32::<BigEndian>()?,
            },
            OfpactType::OutputReg => {
                let header = cur.read_u32::<BigEndian>()?;
                let ofs = cur.read_u16::<BigEndian>()?;
                let n_bits = cur.read_u16::<BigEndian>()?;
                Ofpact::OutputReg {
                    src: Subfield::from_header(header, ofs, n_bits)?,
                    max_len: cur.read_u16::<BigEndian>()?,
                }
            }
            OfpactType::Bundle => Ofpact::Bundle(Bundle::read_payload(body)?),
            OfpactType::SetVlanVid => Ofpact::SetVlanVid(cur.read_u16::<BigEndian>()?),
            OfpactType::SetVlanPcp => Ofpact::SetVlanPcp(cur.read_u8()?),
            OfpactType::StripVlan => Ofpact::StripVlan,
            OfpactType::SetEthSrc | OfpactType::SetEthDst => {
                let mut mac = [0; 6];
                std::io::Read::read_exact(&mut cur, &mut mac)?;
                if typ == OfpactType::SetEthSrc {
                    Ofpact::SetEthSrc(mac)
                } else {
                    Ofpact::SetEthDst(mac)
                }
            }
            OfpactType::SetIpv4Src => {
                Ofpact::SetIpv4Src(Ipv4Addr::from(cur.read_u32::<BigEndian>()?))
            }
            OfpactType::SetIpv4Dst => {
                Ofpact::SetIpv4Dst(Ipv4Addr::from(cur.read_u32::<BigEndian>()?))
            }
            OfpactType::SetIpv4Dscp => Ofpact::SetIpv4Dscp(cur.read_u8()?),
            OfpactType::SetL4SrcPort => Ofpact::SetL4SrcPort(cur.read_u16::<BigEndian>()?),
            OfpactType::SetL4DstPort => Ofpact::SetL4DstPort(cur.read_u16::<BigEndian>()?),
            OfpactType::SetTunnel => Ofpact::SetTunnel {
                tun_id: cur.read_u64::<BigEndian>()?,
                compat,
            },
            OfpactType::SetQueue => Ofpact::SetQueue(cur.read_u32::<BigEndian>()?),
            OfpactType::PopQueue => Ofpact::PopQueue,
            OfpactType::RegMove => Ofpact::RegMove(RegMove::read_payload(body)?),
            OfpactType::RegLoad => Ofpact::RegLoad(RegLoad::read_payload(body)?),
            OfpactType::DecTtl => Ofpact::DecTtl,
            OfpactType::FinTimeout => Ofpact::FinTimeout {
                idle_timeout: cur.read_u16::<BigEndian>()?,
                hard_timeout: cur.read_u16::<BigEndian>()?,
            },
            OfpactType::Resubmit => Ofpact::Resubmit {
                in_port: cur.read_u16::<BigEndian>()?,
                table_id: cur.read_u8()?,
                compat,
            },
            OfpactType::Learn => Ofpact::Learn(Learn::read_payload(body)?),
            OfpactType::Multipath => Ofpact::Multipath(Multipath::read_payload(body)?),
            OfpactType::Autopath => Ofpact::Autopath(Autopath::read_payload(body)?),
            OfpactType::Note => Ofpact::Note(body.to_vec()),
            OfpactType::Exit => Ofpact::Exit,
        };
        Ok(act)
    }
}

/// A packed stream of internal action records.
///
/// The buffer is caller-owned and reused: decoders append records and
/// terminate the stream with a sentinel on success, or clear the buffer to
/// empty on failure. Two buffers are equal exactly when their bytes are
/// equal, so `==` is stream equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionBuffer {
    data: Vec<u8>,
}

impl ActionBuffer {
    /// Creates an empty buffer.
    pub fn new() -> ActionBuffer {
        ActionBuffer { data: Vec::new() }
    }

    /// Builds a terminated buffer from a slice of actions.
    pub fn from_actions(actions: &[Ofpact]) -> Result<ActionBuffer, ActionError> {
        let mut buffer = ActionBuffer::new();
        for action in actions {
            buffer.push(action)?;
        }
        buffer.finish()?;
        Ok(buffer)
    }

    /// Discards all records.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// The packed bytes, padding and sentinel included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// True if the stream holds no records (a bare sentinel still counts as
    /// empty).
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Appends one record, padding to [`OFPACT_ALIGN`] first.
    ///
    /// Variable-payload records are written header first; the payload is
    /// appended and the header's length field patched afterwards.
    pub fn push(&mut self, action: &Ofpact) -> Result<(), ActionError> {
        let start = self.put_header(action.typ(), action.compat())?;
        action.write_payload(&mut self.data)?;
        self.update_len(start)
    }

    /// Terminates the stream with the sentinel record.
    pub fn finish(&mut self) -> Result<(), ActionError> {
        let start = self.put_header(OfpactType::End, Compat::None)?;
        self.update_len(start)
    }

    /// Pads to alignment and writes a header whose length is patched later.
    fn put_header(&mut self, typ: OfpactType, compat: Compat) -> Result<usize, ActionError> {
        while self.data.len() % OFPACT_ALIGN != 0 {
            self.data.push(0);
        }
        let start = self.data.len();
        self.data.write_u16::<BigEndian>(typ as u16)?;
        self.data.write_u16::<BigEndian>(compat.to_u16())?;
        self.data.write_u16::<BigEndian>(0)?; // len, patched by update_len
        self.data.write_u16::<BigEndian>(0)?;
        Ok(start)
    }

    /// Patches the length field of the record that starts at `start`.
    fn update_len(&mut self, start: usize) -> Result<(), ActionError> {
        let len = self.data.len() - start;
        if len > usize::from(u16::max_value()) {
            return Err(ActionError::BadLen);
        }
        BigEndian::write_u16(&mut self.data[start + 4..start + 6], len as u16);
        Ok(())
    }

    /// Iterates over the records, stopping at the sentinel.
    pub fn iter(&self) -> ActionIter {
        ActionIter {
            data: &self.data,
            offset: 0,
        }
    }

    /// True iff some record sends the packet to `port`: an `Output` or
    /// `Enqueue` naming it, or any `Controller` record when `port` is
    /// `OFPP_CONTROLLER`.
    pub fn outputs_to_port(&self, port: u16) -> bool {
        self.iter().any(|action| match action {
            Ofpact::Output { port: p, .. } => p == port,
            Ofpact::Enqueue { port: p, .. } => p == port,
            Ofpact::Controller { .. } => port == OFPP_CONTROLLER,
            _ => false,
        })
    }
}

impl<'a> IntoIterator for &'a ActionBuffer {
    type Item = Ofpact;
    type IntoIter = ActionIter<'a>;

    fn into_iter(self) -> ActionIter<'a> {
        self.iter()
    }
}

/// Iterator over the records of an [`ActionBuffer`].
///
/// Iteration ends at the sentinel record, at the end of the data, or at the
/// first malformed record. The buffers this crate produces are canonical, so
/// the last case only arises for hand-built byte streams.
pub struct ActionIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for ActionIter<'a> {
    type Item = Ofpact;

    fn next(&mut self) -> Option<Ofpact> {
        if self.offset + HEADER_LEN > self.data.len() {
            return None;
        }
        let record = &self.data[self.offset..];
        let typ = OfpactType::from_u16(BigEndian::read_u16(&record[0..2]))?;
        if typ == OfpactType::End {
            return None;
        }
        let compat = Compat::from_u16(BigEndian::read_u16(&record[2..4]));
        let len = BigEndian::read_u16(&record[4..6]) as usize;
        if len < HEADER_LEN || self.offset + len > self.data.len() {
            return None;
        }
        let body = &record[HEADER_LEN..len];
        let action = Ofpact::parse_payload(typ, compat, body).ok()?;
        let mut next = self.offset + len;
        while next % OFPACT_ALIGN != 0 {
            next += 1;
        }
        self.offset = next;
        Some(action)
    }
}

/// Checks a decoded action stream against a flow context and a port count.
///
/// Wire-level constraints were already enforced by the decoders; this pass
/// applies the checks that need the flow (sub-field prerequisites) or the
/// switch's port count. The first failure wins.
pub fn check_actions(
    actions: &ActionBuffer,
    flow: &Flow,
    max_ports: u16,
) -> Result<(), ActionError> {
    for action in actions {
        check_action(&action, flow, max_ports)?;
    }
    Ok(())
}

fn check_action(action: &Ofpact, flow: &Flow, max_ports: u16) -> Result<(), ActionError> {
    match action {
        Ofpact::Output { port, .. } => check_output_port(*port, max_ports),
        Ofpact::Enqueue { port, .. } => {
            if *port < OFPP_MAX || *port == OFPP_IN_PORT || *port == OFPP_LOCAL {
                Ok(())
            } else {
                Err(ActionError::BadOutPort)
            }
        }
        Ofpact::OutputReg { src, .. } => src.check_src(Some(flow)),
        Ofpact::Bundle(bundle) => bundle.check(flow),
        Ofpact::RegMove(reg_move) => reg_move.check(flow),
        Ofpact::RegLoad(reg_load) => reg_load.check(flow),
        Ofpact::Learn(learn) => learn.check(flow),
        Ofpact::Multipath(multipath) => multipath.check(flow),
        Ofpact::Autopath(autopath) => autopath.check(flow),
        _ => Ok(()),
    }
}

impl fmt::Display for ActionBuffer {
    /// Renders the stream as `actions=...`, or `actions=drop` when empty.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("actions=")?;
        let mut first = true;
        for action in self {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{}", action)?;
        }
        if first {
            f.write_str("drop")?;
        }
        Ok(())
    }
}
