//! Inherit-from-longer-prefix, then-flip-your-bit build algorithm.

use crate::addr::SigNumArray;

use super::cidr::IpOnlyCidrItem;
use super::radix::RadixTree;

/// Inserts one signature's CIDR item into `tree`, implementing the
/// three-way build contract: exact match mutates in place; a best
/// (longest-prefix) match is cloned and re-inserted at this item's own
/// netmask; no match at all starts a fresh bitmap.
pub fn insert_item(tree: &mut RadixTree, item: &IpOnlyCidrItem, sig_id: u32, max_signum: usize) {
    if let Some(existing) = tree.exact_mut(item.ip, item.netmask) {
        existing.set_to(sig_id, !item.negated);
        return;
    }

    let inherited = tree.best_match(item.ip, item.netmask as u32).cloned();
    let mut bits = inherited.unwrap_or_else(|| SigNumArray::with_capacity(max_signum));
    bits.set_to(sig_id, !item.negated);
    tree.insert(item.ip, item.netmask, bits);
}
