//! Micro benchmarks for the multi-pattern app-layer protocol detector:
//! finalize time (Aho-Corasick automaton build) and match-time
//! classification of a reassembled prefix.
//!
//! ```bash
//! cargo bench --bench bench_appproto
//! ```

use criterion::{criterion_group, criterion_main, Criterion};
use ids_core::appproto::{register_defaults, ProtoDetector};
use ids_core::packet::{Direction, IpProto};

fn built_detector() -> ProtoDetector {
    let mut detector = ProtoDetector::new();
    register_defaults(&mut detector);
    detector.finalize();
    detector
}

fn bench_finalize(c: &mut Criterion) {
    c.bench_function("appproto_finalize_default_patterns", |b| {
        b.iter(|| {
            let mut detector = ProtoDetector::new();
            register_defaults(&mut detector);
            detector.finalize();
        });
    });
}

fn bench_classify_http(c: &mut Criterion) {
    let detector = built_detector();
    let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
    c.bench_function("appproto_classify_http_request", |b| {
        b.iter(|| detector.get_proto(std::hint::black_box(request), Direction::ToServer, IpProto::Tcp));
    });
}

criterion_group!(appproto_benches, bench_finalize, bench_classify_http);
criterion_main!(appproto_benches);
