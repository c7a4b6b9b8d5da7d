//! The canonical text rendering of action streams.
//!
//! The rendering is stable but lossy: it is meant for humans and CLI
//! tooling, and nothing in this crate parses it back.

use std::fmt;

use crate::ofpact::{Compat, ControllerReason, Ofpact};
use crate::{port_name, OFPP_CONTROLLER, OFPP_IN_PORT};

struct Port(u16);

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match port_name(self.0) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

struct Mac<'a>(&'a [u8; 6]);

impl<'a> fmt::Display for Mac<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for Ofpact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ofpact::Output { port, max_len } => {
                if *port == OFPP_CONTROLLER {
                    write!(f, "CONTROLLER:{}", max_len)
                } else if let Some(name) = port_name(*port) {
                    f.write_str(name)
                } else {
                    write!(f, "output:{}", port)
                }
            }
            Ofpact::Controller {
                max_len,
                controller_id,
                reason,
            } => {
                if *reason == ControllerReason::Action && *controller_id == 0 {
                    write!(f, "CONTROLLER:{}", max_len)
                } else {
                    write!(
                        f,
                        "controller(reason={},max_len={},id={})",
                        reason.name(),
                        max_len,
                        controller_id
                    )
                }
            }
            Ofpact::Enqueue { port, queue } => write!(f, "enqueue:{}q{}", Port(*port), queue),
            Ofpact::OutputReg { src, .. } => write!(f, "output:{}", src),
            Ofpact::Bundle(bundle) => write!(f, "{}", bundle),
            Ofpact::SetVlanVid(vid) => write!(f, "mod_vlan_vid:{}", vid),
            Ofpact::SetVlanPcp(pcp) => write!(f, "mod_vlan_pcp:{}", pcp),
            Ofpact::StripVlan => f.write_str("strip_vlan"),
            Ofpact::SetEthSrc(mac) => write!(f, "mod_dl_src:{}", Mac(mac)),
            Ofpact::SetEthDst(mac) => write!(f, "mod_dl_dst:{}", Mac(mac)),
            Ofpact::SetIpv4Src(addr) => write!(f, "mod_nw_src:{}", addr),
            Ofpact::SetIpv4Dst(addr) => write!(f, "mod_nw_dst:{}", addr),
            Ofpact::SetIpv4Dscp(dscp) => write!(f, "mod_nw_tos:{}", dscp),
            Ofpact::SetL4SrcPort(port) => write!(f, "mod_tp_src:{}", port),
            Ofpact::SetL4DstPort(port) => write!(f, "mod_tp_dst:{}", port),
            Ofpact::SetTunnel { tun_id, compat } => {
                let wide = *compat == Compat::SetTunnel64
                    || *tun_id > u64::from(u32::max_value());
                write!(
                    f,
                    "set_tunnel{}:{:#x}",
                    if wide { "64" } else { "" },
                    tun_id
                )
            }
            Ofpact::SetQueue(queue) => write!(f, "set_queue:{}", queue),
            Ofpact::PopQueue => f.write_str("pop_queue"),
            Ofpact::RegMove(reg_move) => write!(f, "{}", reg_move),
            Ofpact::RegLoad(reg_load) => write!(f, "{}", reg_load),
            Ofpact::DecTtl => f.write_str("dec_ttl"),
            Ofpact::FinTimeout {
                idle_timeout,
                hard_timeout,
            } => {
                f.write_str("fin_timeout(")?;
                let mut first = true;
                if *idle_timeout != 0 {
                    write!(f, "idle_timeout={}", idle_timeout)?;
                    first = false;
                }
                if *hard_timeout != 0 {
                    if !first {
                        f.write_str(",")?;
                    }
                    write!(f, "hard_timeout={}", hard_timeout)?;
                }
                f.write_str(")")
            }
            Ofpact::Resubmit {
                in_port,
                table_id,
                compat,
            } => {
                if *table_id == 0xff && *compat != Compat::ResubmitTable {
                    write!(f, "resubmit:{}", Port(*in_port))
                } else {
                    f.write_str("resubmit(")?;
                    if *in_port != OFPP_IN_PORT {
                        write!(f, "{}", Port(*in_port))?;
                    }
                    f.write_str(",")?;
                    if *table_id != 0xff {
                        write!(f, "{}", table_id)?;
                    }
                    f.write_str(")")
                }
            }
            Ofpact::Learn(learn) => write!(f, "{}", learn),
            Ofpact::Multipath(multipath) => write!(f, "{}", multipath),
            Ofpact::Autopath(autopath) => write!(f, "{}", autopath),
            Ofpact::Note(data) => {
                f.write_str("note:")?;
                for (i, b) in data.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Ofpact::Exit => f.write_str("exit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ofpact::{Compat, ControllerReason, Ofpact};

    #[test]
    fn test_output_forms() {
        let act = Ofpact::Output {
            port: 3,
            max_len: 0,
        };
        assert_eq!(act.to_string(), "output:3");
        let act = Ofpact::Output {
            port: crate::OFPP_NORMAL,
            max_len: 0,
        };
        assert_eq!(act.to_string(), "NORMAL");
        let act = Ofpact::Output {
            port: crate::OFPP_CONTROLLER,
            max_len: 123,
        };
        assert_eq!(act.to_string(), "CONTROLLER:123");
    }

    #[test]
    fn test_controller_forms() {
        let act = Ofpact::Controller {
            max_len: 65535,
            controller_id: 0,
            reason: ControllerReason::Action,
        };
        assert_eq!(act.to_string(), "CONTROLLER:65535");
        let act = Ofpact::Controller {
            max_len: 128,
            controller_id: 5,
            reason: ControllerReason::NoMatch,
        };
        assert_eq!(
            act.to_string(),
            "controller(reason=no_match,max_len=128,id=5)"
        );
    }

    #[test]
    fn test_tunnel_forms() {
        let act = Ofpact::SetTunnel {
            tun_id: 0x7b,
            compat: Compat::SetTunnel,
        };
        assert_eq!(act.to_string(), "set_tunnel:0x7b");
        let act = Ofpact::SetTunnel {
            tun_id: 0x7b,
            compat: Compat::SetTunnel64,
        };
        assert_eq!(act.to_string(), "set_tunnel64:0x7b");
        let act = Ofpact::SetTunnel {
            tun_id: 0x1_0000_0000,
            compat: Compat::None,
        };
        assert_eq!(act.to_string(), "set_tunnel64:0x100000000");
    }

    #[test]
    fn test_resubmit_forms() {
        let act = Ofpact::Resubmit {
            in_port: 2,
            table_id: 0xff,
            compat: Compat::Resubmit,
        };
        assert_eq!(act.to_string(), "resubmit:2");
        let act = Ofpact::Resubmit {
            in_port: crate::OFPP_IN_PORT,
            table_id: 1,
            compat: Compat::ResubmitTable,
        };
        assert_eq!(act.to_string(), "resubmit(,1)");
        let act = Ofpact::Resubmit {
            in_port: 2,
            table_id: 1,
            compat: Compat::ResubmitTable,
        };
        assert_eq!(act.to_string(), "resubmit(2,1)");
    }

    #[test]
    fn test_misc_keywords() {
        assert_eq!(Ofpact::StripVlan.to_string(), "strip_vlan");
        assert_eq!(Ofpact::DecTtl.to_string(), "dec_ttl");
        assert_eq!(Ofpact::PopQueue.to_string(), "pop_queue");
        assert_eq!(Ofpact::Exit.to_string(), "exit");
        assert_eq!(
            Ofpact::SetEthSrc([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]).to_string(),
            "mod_dl_src:aa:bb:cc:dd:ee:ff"
        );
        assert_eq!(
            Ofpact::Note(vec![0xde, 0xad, 0xbe, 0xef]).to_string(),
            "note:de.ad.be.ef"
        );
        assert_eq!(
            Ofpact::FinTimeout {
                idle_timeout: 10,
                hard_timeout: 0
            }
            .to_string(),
            "fin_timeout(idle_timeout=10)"
        );
        assert_eq!(
            Ofpact::FinTimeout {
                idle_timeout: 0,
                hard_timeout: 0
            }
            .to_string(),
            "fin_timeout()"
        );
    }
}
