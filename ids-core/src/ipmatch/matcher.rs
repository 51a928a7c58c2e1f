//! Four-tree IP-only matcher: `{src,dst} x {v4,v6}`, read-only from
//! match time onward.

use ahash::AHashMap;

use crate::addr::{Family, SigNumArray};
use crate::ruleaddr::PortRange;

use super::builder::insert_item;
use super::cidr::IpOnlyCidrItem;
use super::radix::RadixTree;

pub struct IpMatcher {
    src_v4: RadixTree,
    src_v6: RadixTree,
    dst_v4: RadixTree,
    dst_v6: RadixTree,
    max_signum: usize,
    /// Per-signature port lists, parsed once at rule-load and checked
    /// against the packet's ports at match time. A signature with no
    /// entry here is unrestricted on that side.
    src_ports: AHashMap<u32, Vec<PortRange>>,
    dst_ports: AHashMap<u32, Vec<PortRange>>,
}

impl IpMatcher {
    pub fn new(max_signum: usize) -> Self {
        Self {
            src_v4: RadixTree::new(32),
            src_v6: RadixTree::new(128),
            dst_v4: RadixTree::new(32),
            dst_v6: RadixTree::new(128),
            max_signum,
            src_ports: AHashMap::default(),
            dst_ports: AHashMap::default(),
        }
    }

    pub fn add_source(&mut self, item: &IpOnlyCidrItem, sig_id: u32) {
        let tree = match item.family {
            Family::V4 => &mut self.src_v4,
            Family::V6 => &mut self.src_v6,
        };
        insert_item(tree, item, sig_id, self.max_signum);
    }

    pub fn add_dest(&mut self, item: &IpOnlyCidrItem, sig_id: u32) {
        let tree = match item.family {
            Family::V4 => &mut self.dst_v4,
            Family::V6 => &mut self.dst_v6,
        };
        insert_item(tree, item, sig_id, self.max_signum);
    }

    /// Restricts `sig_id` to source ports in `ports`; an empty list
    /// would match nothing, so callers should simply not call this for
    /// an unrestricted ("any") source port list.
    pub fn set_source_ports(&mut self, sig_id: u32, ports: Vec<PortRange>) {
        self.src_ports.insert(sig_id, ports);
    }

    pub fn set_dest_ports(&mut self, sig_id: u32, ports: Vec<PortRange>) {
        self.dst_ports.insert(sig_id, ports);
    }

    /// AND of the source and destination best-match bitmaps, further
    /// filtered by each hit's registered port lists (if any) against
    /// `src_port`/`dst_port`. A signature with a port list set on a side
    /// whose packet port is `None` (e.g. ICMP) never matches on that
    /// side. Returns an empty bitmap (not an error) if either address
    /// lookup misses entirely.
    pub fn match_packet(
        &self,
        family: Family,
        src_ip: u128,
        dst_ip: u128,
        src_port: Option<u16>,
        dst_port: Option<u16>,
    ) -> SigNumArray {
        let (src_tree, dst_tree, width) = match family {
            Family::V4 => (&self.src_v4, &self.dst_v4, 32u32),
            Family::V6 => (&self.src_v6, &self.dst_v6, 128u32),
        };

        let src_bits = src_tree.best_match(src_ip, width);
        let dst_bits = dst_tree.best_match(dst_ip, width);

        let mut hits = match (src_bits, dst_bits) {
            (Some(s), Some(d)) => s.and(d),
            _ => return SigNumArray::with_capacity(self.max_signum),
        };

        for sig_id in hits.iter_set().collect::<Vec<_>>() {
            let src_ok = self.src_ports.get(&sig_id).is_none_or(|ranges| port_matches(src_port, ranges));
            let dst_ok = self.dst_ports.get(&sig_id).is_none_or(|ranges| port_matches(dst_port, ranges));
            if !src_ok || !dst_ok {
                hits.clear(sig_id);
            }
        }

        hits
    }
}

fn port_matches(port: Option<u16>, ranges: &[PortRange]) -> bool {
    match port {
        Some(port) => ranges.iter().any(|r| r.contains(port)),
        None => false,
    }
}
