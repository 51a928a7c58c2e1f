//! Micro benchmarks for the IP-only radix-tree matcher: build time for
//! a moderately sized rule set, and match-time lookup.
//!
//! ```bash
//! cargo bench --bench bench_ipmatch
//! ```

use criterion::{criterion_group, criterion_main, Criterion};
use ids_core::addr::Family;
use ids_core::ipmatch::{range_to_cidr_items, IpMatcher};

const RULE_COUNT: u32 = 2000;

fn build_matcher() -> IpMatcher {
    let mut matcher = IpMatcher::new(RULE_COUNT as usize);
    for sig_id in 0..RULE_COUNT {
        let base = (sig_id as u128) * 256;
        for item in range_to_cidr_items(Family::V4, base, base + 255, false) {
            matcher.add_source(&item, sig_id);
            matcher.add_dest(&item, sig_id);
        }
    }
    matcher
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("ipmatch_build_2000_rules", |b| {
        b.iter(build_matcher);
    });
}

fn bench_match(c: &mut Criterion) {
    let matcher = build_matcher();
    c.bench_function("ipmatch_match_packet", |b| {
        b.iter(|| matcher.match_packet(std::hint::black_box(Family::V4), 512, 512, None, None));
    });
}

criterion_group!(ipmatch_benches, bench_build, bench_match);
criterion_main!(ipmatch_benches);
