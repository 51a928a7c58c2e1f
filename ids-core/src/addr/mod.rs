//! Address Algebra: comparison, cut, complement and join over
//! IPv4/IPv6 ranges, and the disjoint-decomposition kernel rule
//! compilation builds on.

mod range;
mod sigset;

pub use range::{cmp, cmp_bounds, cut, cut_not, insert_disjoint, is_complete, join, AddrCmp, AddrRange, Family};
pub use sigset::SigNumArray;
