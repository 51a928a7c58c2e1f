//! IP-only Matcher: four radix trees keyed by `{src,dst} x
//! {v4,v6}`, built once at rule-load with the inherit-and-flip policy
//! and queried read-only at packet time.

mod builder;
mod cidr;
mod matcher;
mod radix;

pub use builder::insert_item;
pub use cidr::{range_to_cidr_items, IpOnlyCidrItem};
pub use matcher::IpMatcher;
