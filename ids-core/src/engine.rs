//! Ties rule compilation and packet-time matching into one entry point:
//! address expressions are parsed, folded into disjoint per-signature
//! ranges, decomposed into CIDR blocks and built into the IP-only radix
//! trees; app-layer patterns are registered and finalized into the
//! multi-pattern detector. At packet time, `match_packet` intersects the
//! source/destination bitmaps and filters by each hit's protocol mask.

use std::net::IpAddr;

use tracing::debug;

use crate::addr::{AddrRange, Family, SigNumArray};
use crate::appproto::{register_defaults, AppProto, ProtoDetector};
use crate::config::DetectionConfig;
use crate::error::RuleResult;
use crate::ipmatch::{range_to_cidr_items, IpMatcher};
use crate::packet::{Direction, IpProto, Packet};
use crate::ruleaddr::{build_address_group, parse_address_expr, parse_port_expr, PortRange, VarResolver};
use crate::signature::{ProtoMask, SignatureTable};
use crate::streamqueue::MinChunkLen;

/// One rule's worth of address-expression input, ahead of compilation.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub name: String,
    pub proto_mask: ProtoMask,
    pub src: String,
    pub dst: String,
    /// Port expression restricting the source side; `None` means
    /// unrestricted ("any"), same as omitting the keyword entirely.
    pub src_port: Option<String>,
    pub dst_port: Option<String>,
}

/// The compiled detection core: signature metadata, the four-tree
/// IP-only matcher, and the finalized app-layer protocol detector.
pub struct Engine {
    signatures: SignatureTable,
    ip_matcher: IpMatcher,
    proto_detector: ProtoDetector,
    min_chunk_len: MinChunkLen,
}

impl Engine {
    /// Compiles `rules` against `resolver` (for `$VAR` address
    /// expansion) and builds the app-layer detector per `detection`.
    pub fn build(
        rules: &[RuleSpec],
        resolver: &dyn VarResolver,
        detection: &DetectionConfig,
    ) -> RuleResult<Self> {
        let mut signatures = SignatureTable::new();
        let mut ip_matcher = IpMatcher::new(rules.len());

        for rule in rules {
            let sig_id = signatures.register(rule.name.clone(), rule.proto_mask);

            let src_atoms = parse_address_expr(&rule.src, resolver)?;
            let dst_atoms = parse_address_expr(&rule.dst, resolver)?;
            let (mut src_v4, mut src_v6) = build_address_group(&src_atoms, sig_id)?;
            let (mut dst_v4, mut dst_v6) = build_address_group(&dst_atoms, sig_id)?;

            if let Some(expr) = &rule.src_port {
                let ports = parse_port_expr(expr)?;
                attach_ports(&mut src_v4, &ports);
                attach_ports(&mut src_v6, &ports);
                ip_matcher.set_source_ports(sig_id, ports);
            }
            if let Some(expr) = &rule.dst_port {
                let ports = parse_port_expr(expr)?;
                attach_ports(&mut dst_v4, &ports);
                attach_ports(&mut dst_v6, &ports);
                ip_matcher.set_dest_ports(sig_id, ports);
            }

            install(&mut ip_matcher, Side::Src, Family::V4, &src_v4, sig_id);
            install(&mut ip_matcher, Side::Src, Family::V6, &src_v6, sig_id);
            install(&mut ip_matcher, Side::Dst, Family::V4, &dst_v4, sig_id);
            install(&mut ip_matcher, Side::Dst, Family::V6, &dst_v6, sig_id);
        }

        let mut proto_detector = ProtoDetector::with_inspect_bytes(detection.inspect_bytes);
        if detection.register_default_patterns {
            register_defaults(&mut proto_detector);
        }
        let (toserver_min, toclient_min) = proto_detector.finalize();

        let mut min_chunk_len = MinChunkLen::default();
        min_chunk_len.set_min_chunk_len(Direction::ToServer, toserver_min);
        min_chunk_len.set_min_chunk_len(Direction::ToClient, toclient_min);

        debug!(rules = rules.len(), "engine build complete");

        Ok(Self { signatures, ip_matcher, proto_detector, min_chunk_len })
    }

    /// The IP-only signature bitmap for `packet`, filtered to signatures
    /// whose protocol mask permits `packet.ip_proto`.
    pub fn match_packet(&self, packet: &Packet) -> SigNumArray {
        let Some((family, src_ip)) = addr_to_u128(packet.src_ip) else {
            return SigNumArray::with_capacity(self.signatures.len());
        };
        let Some((dst_family, dst_ip)) = addr_to_u128(packet.dst_ip) else {
            return SigNumArray::with_capacity(self.signatures.len());
        };
        if family != dst_family {
            return SigNumArray::with_capacity(self.signatures.len());
        }

        let hits = self.ip_matcher.match_packet(family, src_ip, dst_ip, packet.src_port, packet.dst_port);
        let mut filtered = SigNumArray::with_capacity(self.signatures.len());
        for sig_id in hits.iter_set() {
            if self.signatures.permits(sig_id, packet.ip_proto) {
                filtered.set(sig_id);
            }
        }
        filtered
    }

    pub fn classify_app_proto(&self, buf: &[u8], direction: Direction, ip_proto: IpProto) -> AppProto {
        self.proto_detector.get_proto(buf, direction, ip_proto)
    }

    pub fn min_chunk_len(&self) -> &MinChunkLen {
        &self.min_chunk_len
    }

    pub fn signatures(&self) -> &SignatureTable {
        &self.signatures
    }
}

enum Side {
    Src,
    Dst,
}

fn attach_ports(ranges: &mut [AddrRange], ports: &[PortRange]) {
    for range in ranges {
        range.ports = Some(ports.to_vec());
    }
}

fn install(matcher: &mut IpMatcher, side: Side, family: Family, ranges: &[AddrRange], sig_id: u32) {
    for range in ranges {
        let negated = !range.sigs.get(sig_id);
        for item in range_to_cidr_items(family, range.ip1, range.ip2, negated) {
            match side {
                Side::Src => matcher.add_source(&item, sig_id),
                Side::Dst => matcher.add_dest(&item, sig_id),
            }
        }
    }
}

fn addr_to_u128(ip: IpAddr) -> Option<(Family, u128)> {
    match ip {
        IpAddr::V4(v4) => Some((Family::V4, u32::from(v4) as u128)),
        IpAddr::V6(v6) => Some((Family::V6, u128::from(v6))),
    }
}
