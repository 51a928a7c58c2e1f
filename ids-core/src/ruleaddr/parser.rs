//! Recursive rule-address expression parser.
//!
//! ```text
//! expr  := atom | '[' list ']' | '!' expr | '$' name
//! list  := expr (',' expr)*
//! atom  := IPv4 | IPv6 | CIDR | range | 'any'
//! range := IPv4 '-' IPv4
//! CIDR  := IP '/' (cidrbits | dotted_mask)
//! ```

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::addr::{self, insert_disjoint, AddrRange, Family};
use crate::error::{AddrResult, RuleError, RuleResult};
use crate::ruleaddr::port::split_top_level;

/// One leaf of a parsed expression: a single contiguous range with the
/// (possibly composed, via XOR, from nested `!`) negation flag resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAtom {
    pub family: Family,
    pub ip1: u128,
    pub ip2: u128,
    pub negated: bool,
}

/// Looks up a `$NAME` variable to its replacement address expression
/// text. Injected by the caller so this module stays free of any
/// concrete variable-table type.
pub trait VarResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> VarResolver for F {
    fn resolve(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Parses a full address expression into its flattened atoms.
pub fn parse_address_expr(input: &str, resolver: &dyn VarResolver) -> RuleResult<Vec<ParsedAtom>> {
    parse_expr(input.trim(), false, resolver)
}

fn parse_expr(input: &str, negated: bool, resolver: &dyn VarResolver) -> RuleResult<Vec<ParsedAtom>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(RuleError::InvalidAddress("empty address expression".into()));
    }

    if let Some(rest) = input.strip_prefix('!') {
        return parse_expr(rest.trim(), !negated, resolver);
    }

    if let Some(name) = input.strip_prefix('$') {
        let replacement = resolver
            .resolve(name)
            .ok_or_else(|| RuleError::UnknownVariable(name.to_string()))?;
        // "![$HOME_NET] expands to [!$HOME_NET]'s semantics" — wrap the
        // resolved text in brackets with the negation folded back in as
        // literal `!`, then reparse from a clean (non-negated) context.
        let wrapped = if negated { format!("[!{replacement}]") } else { replacement };
        return parse_expr(&wrapped, false, resolver);
    }

    if let Some(inner) = input.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| RuleError::UnbalancedBrackets(input.to_string()))?;
        let mut atoms = Vec::new();
        for part in split_top_level(inner) {
            atoms.extend(parse_expr(part, negated, resolver)?);
        }
        return Ok(atoms);
    }

    if input.eq_ignore_ascii_case("any") {
        // "any" expands to both 0.0.0.0/0 and::/0 simultaneously.
        return Ok(vec![
            ParsedAtom { family: Family::V4, ip1: 0, ip2: Family::V4.max_value(), negated },
            ParsedAtom { family: Family::V6, ip1: 0, ip2: Family::V6.max_value(), negated },
        ]);
    }

    parse_atom(input, negated)
}

fn parse_atom(input: &str, negated: bool) -> RuleResult<Vec<ParsedAtom>> {
    if let Some((lo, hi)) = split_dash_range(input) {
        let (fam1, ip1) = parse_ip(lo)?;
        let (fam2, ip2) = parse_ip(hi)?;
        if fam1 != fam2 {
            return Err(RuleError::InvalidAddress(input.to_string()));
        }
        if ip1 > ip2 {
            return Err(RuleError::InvalidAddress(input.to_string()));
        }
        return Ok(vec![ParsedAtom { family: fam1, ip1, ip2, negated }]);
    }

    if let Some((ip_part, mask_part)) = input.split_once('/') {
        let (family, ip) = parse_ip(ip_part)?;
        let netmask = parse_netmask(family, mask_part)?;
        let (ip1, ip2) = cidr_bounds(family, ip, netmask);
        return Ok(vec![ParsedAtom { family, ip1, ip2, negated }]);
    }

    let (family, ip) = parse_ip(input)?;
    Ok(vec![ParsedAtom { family, ip1: ip, ip2: ip, negated }])
}

/// Splits `"IPv4-IPv4"` at the dash that separates two address literals,
/// being careful not to trip on a negative-looking but otherwise invalid
/// token (this grammar has no negative numbers, so the first top-level
/// `-` is always the range separator once a `/` has been ruled out).
fn split_dash_range(input: &str) -> Option<(&str, &str)> {
    if input.contains('/') {
        return None;
    }
    input.split_once('-')
}

fn parse_ip(input: &str) -> RuleResult<(Family, u128)> {
    let input = input.trim();
    if let Ok(v4) = Ipv4Addr::from_str(input) {
        return Ok((Family::V4, u32::from(v4) as u128));
    }
    if let Ok(v6) = Ipv6Addr::from_str(input) {
        return Ok((Family::V6, u128::from(v6)));
    }
    Err(RuleError::InvalidAddress(input.to_string()))
}

fn parse_netmask(family: Family, input: &str) -> RuleResult<u8> {
    let input = input.trim();
    if let Ok(bits) = input.parse::<u8>() {
        if (bits as u32) <= family.bits() {
            return Ok(bits);
        }
        return Err(RuleError::InvalidCidr(input.to_string()));
    }
    // dotted mask, v4 only
    if family == Family::V4 {
        if let Ok(mask) = Ipv4Addr::from_str(input) {
            let bits = u32::from(mask).count_ones();
            return Ok(bits as u8);
        }
    }
    Err(RuleError::InvalidCidr(input.to_string()))
}

fn cidr_bounds(family: Family, ip: u128, netmask: u8) -> (u128, u128) {
    let bits = family.bits();
    if netmask as u32 >= bits {
        return (ip & family.max_value(), ip & family.max_value());
    }
    let host_bits = bits - netmask as u32;
    let mask = if host_bits >= 128 { 0u128 } else { (!0u128 << host_bits) & family.max_value() };
    let network = ip & mask;
    let broadcast = network | (!mask & family.max_value());
    (network, broadcast)
}

/// Folds parsed atoms for signature `sig_id` into disjoint, per-family
/// address groups: non-negated atoms are unioned together first (or, if
/// every atom for a family is negated, the baseline starts as the whole
/// address space), then each negated atom's own span is cleared out of
/// that union. Negation always wins regardless of where it sits in the
/// atom list — matching `[A, !B]` and `[!B, A]` to the same result.
pub fn build_address_group(atoms: &[ParsedAtom], sig_id: u32) -> AddrResult<(Vec<AddrRange>, Vec<AddrRange>)> {
    let v4 = build_group_for_family(atoms, Family::V4, sig_id)?;
    let v6 = build_group_for_family(atoms, Family::V6, sig_id)?;
    Ok((v4, v6))
}

fn build_group_for_family(atoms: &[ParsedAtom], family: Family, sig_id: u32) -> AddrResult<Vec<AddrRange>> {
    let relevant: Vec<&ParsedAtom> = atoms.iter().filter(|a| a.family == family).collect();
    if relevant.is_empty() {
        return Ok(Vec::new());
    }

    let mut target = Vec::new();
    let any_positive = relevant.iter().any(|a| !a.negated);
    if any_positive {
        for atom in relevant.iter().filter(|a| !a.negated) {
            let mut range = AddrRange::new(family, atom.ip1, atom.ip2);
            range.sigs.set(sig_id);
            insert_disjoint(&mut target, range)?;
        }
    } else {
        let mut full = AddrRange::new(family, 0, family.max_value());
        full.sigs.set(sig_id);
        target.push(full);
    }

    for atom in relevant.iter().filter(|a| a.negated) {
        clear_bit_over_range(&mut target, family, atom.ip1, atom.ip2, sig_id);
    }

    Ok(target)
}

/// Clears `sig_id`'s bit over `[lo, hi]`, splitting any overlapping
/// range at the boundary. Ranges with no overlap pass through
/// untouched; this never adds coverage, only removes a bit from it.
fn clear_bit_over_range(list: &mut Vec<AddrRange>, family: Family, lo: u128, hi: u128, sig_id: u32) {
    let mut result = Vec::with_capacity(list.len() + 2);
    for range in list.drain(..) {
        if range.ip2 < lo || range.ip1 > hi {
            result.push(range);
            continue;
        }

        if range.ip1 < lo {
            result.push(AddrRange {
                family,
                ip1: range.ip1,
                ip2: lo - 1,
                sigs: range.sigs.clone(),
                ports: range.ports.clone(),
            });
        }

        let mut mid_sigs = range.sigs.clone();
        mid_sigs.clear(sig_id);
        result.push(AddrRange {
            family,
            ip1: range.ip1.max(lo),
            ip2: range.ip2.min(hi),
            sigs: mid_sigs,
            ports: range.ports.clone(),
        });

        if range.ip2 > hi {
            result.push(AddrRange { family, ip1: hi + 1, ip2: range.ip2, sigs: range.sigs, ports: range.ports });
        }
    }
    result.sort_by_key(|r| r.ip1);
    *list = result;
}

/// Completeness helper re-exported for callers validating a built group
/// against the whole address space.
pub fn group_is_complete(group: &[AddrRange], family: Family) -> bool {
    addr::is_complete(group, family)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn single_host_v4() {
        let atoms = parse_address_expr("192.168.1.5", &no_vars).unwrap();
        assert_eq!(atoms.len(), 1);
        assert_eq!(atoms[0].family, Family::V4);
        assert_eq!(atoms[0].ip1, atoms[0].ip2);
        assert!(!atoms[0].negated);
    }

    #[test]
    fn cidr_v4() {
        let atoms = parse_address_expr("192.168.1.0/24", &no_vars).unwrap();
        assert_eq!(atoms.len(), 1);
        let a = atoms[0];
        assert_eq!(a.ip1, u32::from(Ipv4Addr::new(192, 168, 1, 0)) as u128);
        assert_eq!(a.ip2, u32::from(Ipv4Addr::new(192, 168, 1, 255)) as u128);
    }

    #[test]
    fn dotted_netmask_v4() {
        let atoms = parse_address_expr("10.0.0.0/255.255.255.0", &no_vars).unwrap();
        assert_eq!(atoms[0].ip2 - atoms[0].ip1, 255);
    }

    #[test]
    fn dash_range() {
        let atoms = parse_address_expr("10.0.0.1-10.0.0.10", &no_vars).unwrap();
        assert_eq!(atoms[0].ip1, u32::from(Ipv4Addr::new(10, 0, 0, 1)) as u128);
        assert_eq!(atoms[0].ip2, u32::from(Ipv4Addr::new(10, 0, 0, 10)) as u128);
    }

    #[test]
    fn any_expands_both_families() {
        let atoms = parse_address_expr("any", &no_vars).unwrap();
        assert_eq!(atoms.len(), 2);
        assert!(atoms.iter().any(|a| a.family == Family::V4));
        assert!(atoms.iter().any(|a| a.family == Family::V6));
    }

    #[test]
    fn bracket_list_with_negation() {
        let atoms = parse_address_expr("[192.168.1.0/24, !192.168.1.1]", &no_vars).unwrap();
        assert_eq!(atoms.len(), 2);
        assert!(!atoms[0].negated);
        assert!(atoms[1].negated);
    }

    #[test]
    fn double_negation_composes_via_xor() {
        let atoms = parse_address_expr("!!10.0.0.1", &no_vars).unwrap();
        assert!(!atoms[0].negated);
    }

    #[test]
    fn variable_negated_expands_like_bracket_negation() {
        let resolve = |name: &str| -> Option<String> {
            if name == "HOME_NET" {
                Some("10.0.0.0/8".to_string())
            } else {
                None
            }
        };
        let negated = parse_address_expr("!$HOME_NET", &resolve).unwrap();
        assert!(negated[0].negated);

        let positive = parse_address_expr("$HOME_NET", &resolve).unwrap();
        assert!(!positive[0].negated);
    }

    #[test]
    fn unknown_variable_errors() {
        assert!(parse_address_expr("$NOPE", &no_vars).is_err());
    }

    #[test]
    fn unbalanced_brackets_error() {
        assert!(parse_address_expr("[10.0.0.1", &no_vars).is_err());
    }

    #[test]
    fn negation_inheritance_excludes_pinhole() {
        // rule src [192.168.1.0/24, !192.168.1.1]
        let atoms = parse_address_expr("[192.168.1.0/24, !192.168.1.1]", &no_vars).unwrap();
        let (v4, _v6) = build_address_group(&atoms, 0).unwrap();

        let excluded = u32::from(Ipv4Addr::new(192, 168, 1, 1)) as u128;
        let included = u32::from(Ipv4Addr::new(192, 168, 1, 2)) as u128;

        let matches = |ip: u128| v4.iter().any(|r| r.ip1 <= ip && ip <= r.ip2 && r.sigs.get(0));
        assert!(matches(included));
        assert!(!matches(excluded));
    }

    #[test]
    fn negation_order_in_list_does_not_matter() {
        let forward = parse_address_expr("[192.168.1.0/24, !192.168.1.1]", &no_vars).unwrap();
        let backward = parse_address_expr("[!192.168.1.1, 192.168.1.0/24]", &no_vars).unwrap();
        let (fwd_v4, _) = build_address_group(&forward, 0).unwrap();
        let (back_v4, _) = build_address_group(&backward, 0).unwrap();

        let excluded = u32::from(Ipv4Addr::new(192, 168, 1, 1)) as u128;
        let matches = |group: &[AddrRange], ip: u128| {
            group.iter().any(|r| r.ip1 <= ip && ip <= r.ip2 && r.sigs.get(0))
        };
        assert!(!matches(&fwd_v4, excluded));
        assert!(!matches(&back_v4, excluded));
    }

    #[test]
    fn lone_negated_atom_matches_whole_space_except_itself() {
        let atoms = parse_address_expr("!10.0.0.1", &no_vars).unwrap();
        let (v4, _) = build_address_group(&atoms, 0).unwrap();

        let excluded = u32::from(Ipv4Addr::new(10, 0, 0, 1)) as u128;
        let elsewhere = u32::from(Ipv4Addr::new(8, 8, 8, 8)) as u128;
        let matches = |ip: u128| v4.iter().any(|r| r.ip1 <= ip && ip <= r.ip2 && r.sigs.get(0));
        assert!(!matches(excluded));
        assert!(matches(elsewhere));
    }
}
