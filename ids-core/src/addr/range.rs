//! Address range comparison, cut, complement and join.
//!
//! Ranges are stored as `u128` host-order bounds for both address
//! families — IPv4 occupies the low 32 bits — so the comparison/cut/
//! complement arithmetic is one implementation instead of a v4 and a v6
//! copy. The family tag is still carried and checked everywhere two
//! ranges interact, so a v4 and a v6 range can never be merged into
//! each other.

use crate::addr::sigset::SigNumArray;
use crate::error::{AddrError, AddrResult};
use crate::ruleaddr::PortRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub fn max_value(self) -> u128 {
        match self {
            Family::V4 => u32::MAX as u128,
            Family::V6 => u128::MAX,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Family::V4 => 32,
            Family::V6 => 128,
        }
    }
}

/// The seven-way exhaustive result of comparing two ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrCmp {
    /// `a == b`
    Eq,
    /// `a` is strictly enclosed by `b` (a ⊂ b)
    Es,
    /// `a` strictly encloses `b` (a ⊃ b)
    Eb,
    /// `a` starts before `b` and they overlap, with `a` ending first
    Le,
    /// `a` entirely before `b`, no overlap
    Lt,
    /// `a` starts after `b` and they overlap, with `a` ending last
    Ge,
    /// `a` entirely after `b`, no overlap
    Gt,
}

impl AddrCmp {
    /// `cmp(a, b)` and `cmp(b, a)` must be consistent.
    pub fn flip(self) -> AddrCmp {
        match self {
            AddrCmp::Eq => AddrCmp::Eq,
            AddrCmp::Es => AddrCmp::Eb,
            AddrCmp::Eb => AddrCmp::Es,
            AddrCmp::Le => AddrCmp::Ge,
            AddrCmp::Ge => AddrCmp::Le,
            AddrCmp::Lt => AddrCmp::Gt,
            AddrCmp::Gt => AddrCmp::Lt,
        }
    }
}

/// A half-closed, inclusive address range with its associated signature
/// set and (optionally) inherited destination-port ranges.
#[derive(Debug, Clone)]
pub struct AddrRange {
    pub family: Family,
    pub ip1: u128,
    pub ip2: u128,
    pub sigs: SigNumArray,
    pub ports: Option<Vec<PortRange>>,
}

impl AddrRange {
    pub fn new(family: Family, ip1: u128, ip2: u128) -> Self {
        debug_assert!(ip1 <= ip2);
        Self { family, ip1, ip2, sigs: SigNumArray::default(), ports: None }
    }

    pub fn is_single_host(&self) -> bool {
        self.ip1 == self.ip2
    }

    fn union_ports(a: &Option<Vec<PortRange>>, b: &Option<Vec<PortRange>>) -> Option<Vec<PortRange>> {
        match (a, b) {
            (None, None) => None,
            (Some(x), None) => Some(x.clone()),
            (None, Some(y)) => Some(y.clone()),
            (Some(x), Some(y)) => {
                let mut merged = x.clone();
                merged.extend(y.clone());
                Some(merged)
            }
        }
    }
}

/// Totally orders and classifies two ranges of the *same* family.
///
/// Returns [`AddrError::NonExhaustiveCompare`] only if none of the seven
/// defined outcomes apply — an internal-invariant violation, never
/// reachable for well-formed inputs.
pub fn cmp(a: &AddrRange, b: &AddrRange) -> AddrResult<AddrCmp> {
    debug_assert_eq!(a.family, b.family, "cmp() requires matching address families");
    cmp_bounds(a.ip1, a.ip2, b.ip1, b.ip2)
}

pub fn cmp_bounds(a1: u128, a2: u128, b1: u128, b2: u128) -> AddrResult<AddrCmp> {
    if a1 == b1 && a2 == b2 {
        return Ok(AddrCmp::Eq);
    }
    if b1 <= a1 && a2 <= b2 {
        return Ok(AddrCmp::Es);
    }
    if a1 <= b1 && b2 <= a2 {
        return Ok(AddrCmp::Eb);
    }
    if a1 < b1 && a2 < b2 && a2 >= b1 {
        return Ok(AddrCmp::Le);
    }
    if a2 < b1 {
        return Ok(AddrCmp::Lt);
    }
    if b1 < a1 && b2 < a2 && a1 <= b2 {
        return Ok(AddrCmp::Ge);
    }
    if a1 > b2 {
        return Ok(AddrCmp::Gt);
    }
    Err(AddrError::NonExhaustiveCompare)
}

/// Splits two overlapping ranges into a disjoint, ordered decomposition
/// whose union equals `a ∪ b`.
///
/// Each output inherits the union of the signature sets (and port lists)
/// of every input range it overlaps. `a` and `b` must overlap (any of
/// `Eq`, `Es`, `Eb`, `Le`, `Ge`); `Lt`/`Gt` is an error since there is
/// nothing to cut.
pub fn cut(a: AddrRange, b: AddrRange) -> AddrResult<Vec<AddrRange>> {
    debug_assert_eq!(a.family, b.family, "cut() requires matching address families");
    let family = a.family;
    let rel = cmp(&a, &b)?;
    if matches!(rel, AddrCmp::Lt | AddrCmp::Gt) {
        return Err(AddrError::NotOverlapping);
    }

    let lo = a.ip1.max(b.ip1);
    let hi = a.ip2.min(b.ip2);

    let mut out = Vec::with_capacity(3);

    if a.ip1 < b.ip1 {
        out.push(AddrRange {
            family,
            ip1: a.ip1,
            ip2: b.ip1 - 1,
            sigs: a.sigs.clone(),
            ports: a.ports.clone(),
        });
    } else if b.ip1 < a.ip1 {
        out.push(AddrRange {
            family,
            ip1: b.ip1,
            ip2: a.ip1 - 1,
            sigs: b.sigs.clone(),
            ports: b.ports.clone(),
        });
    }

    out.push(AddrRange {
        family,
        ip1: lo,
        ip2: hi,
        sigs: a.sigs.or(&b.sigs),
        ports: AddrRange::union_ports(&a.ports, &b.ports),
    });

    if a.ip2 > b.ip2 {
        out.push(AddrRange {
            family,
            ip1: b.ip2 + 1,
            ip2: a.ip2,
            sigs: a.sigs,
            ports: a.ports,
        });
    } else if b.ip2 > a.ip2 {
        out.push(AddrRange {
            family,
            ip1: a.ip2 + 1,
            ip2: b.ip2,
            sigs: b.sigs,
            ports: b.ports,
        });
    }

    Ok(out)
}

/// Complements `a` within the full address space of its family. Fails
/// when `a` is the full space.
pub fn cut_not(a: &AddrRange) -> AddrResult<(Option<AddrRange>, Option<AddrRange>)> {
    let max = a.family.max_value();
    if a.ip1 == 0 && a.ip2 == max {
        return Err(AddrError::FullAddressSpace);
    }

    let below = if a.ip1 > 0 {
        Some(AddrRange {
            family: a.family,
            ip1: 0,
            ip2: a.ip1 - 1,
            sigs: a.sigs.clone(),
            ports: a.ports.clone(),
        })
    } else {
        None
    };

    let above = if a.ip2 < max {
        Some(AddrRange {
            family: a.family,
            ip1: a.ip2 + 1,
            ip2: max,
            sigs: a.sigs.clone(),
            ports: a.ports.clone(),
        })
    } else {
        None
    };

    Ok((below, above))
}

/// Widens `target` to `target ∪ source` (convex hull), unioning their
/// signature sets and port lists.
pub fn join(target: &mut AddrRange, source: &AddrRange) -> AddrResult<()> {
    if target.family != source.family {
        return Err(AddrError::FamilyMismatch);
    }
    target.ip1 = target.ip1.min(source.ip1);
    target.ip2 = target.ip2.max(source.ip2);
    target.sigs.or_assign(&source.sigs);
    target.ports = AddrRange::union_ports(&target.ports, &source.ports);
    Ok(())
}

/// Whether a sorted, disjoint list of ranges covers the full address
/// space of `family`: starts at zero, ends
/// at the maximum, and every consecutive pair is contiguous.
pub fn is_complete(list: &[AddrRange], family: Family) -> bool {
    let Some(first) = list.first() else {
        return false;
    };
    let Some(last) = list.last() else {
        return false;
    };
    if first.ip1 != 0 || last.ip2 != family.max_value() {
        return false;
    }
    list.windows(2).all(|w| w[1].ip1 == w[0].ip2 + 1)
}

/// Folds `new` into `list`, keeping it sorted and disjoint by repeatedly
/// applying [`cut`] against every overlapping entry. Rule-load-time
/// only; not on the packet path.
pub fn insert_disjoint(list: &mut Vec<AddrRange>, new: AddrRange) -> AddrResult<()> {
    let mut pool = std::mem::take(list);
    pool.push(new);

    loop {
        let mut merged_at = None;
        'search: for i in 0..pool.len() {
            for j in (i + 1)..pool.len() {
                let rel = cmp(&pool[i], &pool[j])?;
                if !matches!(rel, AddrCmp::Lt | AddrCmp::Gt) {
                    merged_at = Some((i, j));
                    break 'search;
                }
            }
        }
        match merged_at {
            None => break,
            Some((i, j)) => {
                let b = pool.remove(j);
                let a = pool.remove(i);
                pool.extend(cut(a, b)?);
            }
        }
    }

    pool.sort_by(|x, y| x.ip1.cmp(&y.ip1));
    *list = pool;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(ip1: u32, ip2: u32) -> AddrRange {
        AddrRange::new(Family::V4, ip1 as u128, ip2 as u128)
    }

    #[test]
    fn cmp_eq() {
        assert_eq!(cmp(&v4(1, 5), &v4(1, 5)).unwrap(), AddrCmp::Eq);
    }

    #[test]
    fn cmp_es_single_host() {
        assert_eq!(cmp(&v4(5, 5), &v4(1, 10)).unwrap(), AddrCmp::Es);
    }

    #[test]
    fn cmp_eb() {
        assert_eq!(cmp(&v4(1, 10), &v4(5, 5)).unwrap(), AddrCmp::Eb);
    }

    #[test]
    fn cmp_le_and_ge_are_flips() {
        let a = v4(1, 5);
        let b = v4(3, 10);
        assert_eq!(cmp(&a, &b).unwrap(), AddrCmp::Le);
        assert_eq!(cmp(&b, &a).unwrap(), AddrCmp::Ge);
    }

    #[test]
    fn cmp_lt_not_adjacent_merge() {
        // adjacency without overlap is LT, not a cut trigger
        assert_eq!(cmp(&v4(1, 5), &v4(6, 10)).unwrap(), AddrCmp::Lt);
    }

    #[test]
    fn cmp_gt() {
        assert_eq!(cmp(&v4(10, 20), &v4(1, 5)).unwrap(), AddrCmp::Gt);
    }

    #[test]
    fn cmp_is_symmetric_consistent() {
        for (a, b) in [(v4(1, 5), v4(6, 10)), (v4(1, 20), v4(5, 10)), (v4(1, 5), v4(1, 5))] {
            let fwd = cmp(&a, &b).unwrap();
            let back = cmp(&b, &a).unwrap();
            assert_eq!(fwd.flip(), back);
        }
    }

    #[test]
    fn cut_example_from_spec() {
        let mut a = v4(10, 20);
        a.sigs.set(0);
        let mut b = v4(15, 25);
        b.sigs.set(1);

        let out = cut(a, b).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!((out[0].ip1, out[0].ip2), (10, 14));
        assert!(out[0].sigs.get(0) && !out[0].sigs.get(1));
        assert_eq!((out[1].ip1, out[1].ip2), (15, 20));
        assert!(out[1].sigs.get(0) && out[1].sigs.get(1));
        assert_eq!((out[2].ip1, out[2].ip2), (21, 25));
        assert!(!out[2].sigs.get(0) && out[2].sigs.get(1));
    }

    #[test]
    fn cut_rejects_non_overlapping() {
        assert_eq!(cut(v4(1, 5), v4(6, 10)).unwrap_err(), AddrError::NotOverlapping);
    }

    #[test]
    fn cut_preserves_union_and_is_disjoint() {
        let a = v4(1, 100);
        let b = v4(50, 200);
        let out = cut(a, b).unwrap();
        for w in out.windows(2) {
            assert!(w[0].ip2 < w[1].ip1);
        }
        assert_eq!(out.first().unwrap().ip1, 1);
        assert_eq!(out.last().unwrap().ip2, 200);
    }

    #[test]
    fn cut_not_complement_involution() {
        let a = v4(10, 20);
        let (below, above) = cut_not(&a).unwrap();
        let below = below.unwrap();
        let above = above.unwrap();
        assert_eq!((below.ip1, below.ip2), (0, 9));
        assert_eq!((above.ip1, above.ip2), (21, u32::MAX as u128));

        // complementing again (joining the two halves back around a)
        let (below2, _) = cut_not(&below).unwrap();
        assert!(below2.is_none());
    }

    #[test]
    fn cut_not_fails_on_full_space() {
        let full = v4(0, u32::MAX);
        assert_eq!(cut_not(&full).unwrap_err(), AddrError::FullAddressSpace);
    }

    #[test]
    fn join_widens_and_unions_sigs() {
        let mut target = v4(10, 20);
        target.sigs.set(0);
        let mut source = v4(5, 15);
        source.sigs.set(1);
        join(&mut target, &source).unwrap();
        assert_eq!((target.ip1, target.ip2), (5, 20));
        assert!(target.sigs.get(0) && target.sigs.get(1));
    }

    #[test]
    fn join_rejects_family_mismatch() {
        let mut target = v4(1, 5);
        let source = AddrRange::new(Family::V6, 1, 5);
        assert_eq!(join(&mut target, &source).unwrap_err(), AddrError::FamilyMismatch);
    }

    #[test]
    fn completeness_check() {
        let list = vec![v4(0, 99), v4(100, 200), v4(201, u32::MAX)];
        assert!(is_complete(&list, Family::V4));

        let gap = vec![v4(0, 99), v4(101, u32::MAX)];
        assert!(!is_complete(&gap, Family::V4));
    }

    #[test]
    fn insert_disjoint_merges_overlaps() {
        let mut list = vec![];
        let mut first = v4(100, 200);
        first.sigs.set(0);
        insert_disjoint(&mut list, first).unwrap();

        let mut second = v4(150, 250);
        second.sigs.set(1);
        insert_disjoint(&mut list, second).unwrap();

        for w in list.windows(2) {
            assert!(w[0].ip2 < w[1].ip1);
        }
        let middle = list.iter().find(|r| r.ip1 == 150).unwrap();
        assert!(middle.sigs.get(0) && middle.sigs.get(1));
    }

    #[test]
    fn insert_disjoint_v6_arithmetic_carries() {
        let a = AddrRange::new(Family::V6, 0, (1u128 << 64) - 1);
        let b = AddrRange::new(Family::V6, 1u128 << 63, (1u128 << 65) - 1);
        let mut list = vec![];
        insert_disjoint(&mut list, a).unwrap();
        insert_disjoint(&mut list, b).unwrap();
        for w in list.windows(2) {
            assert!(w[0].ip2 < w[1].ip1);
        }
        assert_eq!(list.first().unwrap().ip1, 0);
        assert_eq!(list.last().unwrap().ip2, (1u128 << 65) - 1);
    }
}
