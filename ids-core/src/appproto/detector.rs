//! Multi-pattern app-layer protocol detector.
//!
//! One [`DirContext`] per flow direction holds the Aho-Corasick set
//! matcher plus the pattern-ID → signature-chain index built at
//! finalization time; [`ProtoDetector::get_proto`] is the match-time
//! entry point.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use tracing::{debug, trace};

use crate::packet::{Direction, IpProto};

use super::types::{AppProto, ProtoContent, ProtoSignature};

#[derive(Default)]
struct DirContext {
    patterns: Vec<Vec<u8>>,
    chains: Vec<Vec<ProtoSignature>>,
    ac: Option<AhoCorasick>,
    min_len: usize,
    max_len: usize,
}

impl DirContext {
    fn add(&mut self, ip_proto: IpProto, app_proto: AppProto, content: ProtoContent) {
        let pattern_id = match self.patterns.iter().position(|p| p == &content.bytes) {
            Some(id) => id,
            None => {
                self.patterns.push(content.bytes.clone());
                self.chains.push(Vec::new());
                self.patterns.len() - 1
            }
        };

        self.min_len = if self.min_len == 0 {
            content.depth
        } else {
            self.min_len.min(content.depth)
        };
        self.max_len = self.max_len.max(content.depth);

        self.chains[pattern_id].push(ProtoSignature { ip_proto, app_proto, content });
    }

    fn build(&mut self) {
        if self.patterns.is_empty() {
            self.ac = None;
            return;
        }
        self.ac = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&self.patterns)
            .ok();
    }

    fn get_proto(&self, buf: &[u8], ip_proto: IpProto) -> AppProto {
        let Some(ac) = &self.ac else {
            return AppProto::Unknown;
        };

        let clipped_len = buf.len().min(self.max_len.max(1));
        let window = &buf[..clipped_len];

        let mut hits: Vec<(usize, usize, usize)> = ac
            .find_overlapping_iter(window)
            .map(|m| (m.start(), m.pattern().as_usize(), m.end()))
            .collect();
        // Ties at the same byte offset resolve by pattern-ID (insertion order).
        hits.sort_by_key(|&(start, pattern_id, _)| (start, pattern_id));

        for (_, pattern_id, _) in hits {
            let Some(chain) = self.chains.get(pattern_id) else {
                continue;
            };
            for sig in chain {
                if sig.ip_proto != ip_proto {
                    continue;
                }
                if sig.content.offset > clipped_len || sig.content.depth > clipped_len {
                    continue;
                }
                let window_end = sig.content.depth.min(clipped_len);
                if window_end <= sig.content.offset {
                    continue;
                }
                let search_window = &buf[sig.content.offset..window_end];
                if contains_literal(search_window, &sig.content.bytes) {
                    trace!(app_proto = ?sig.app_proto, "app-layer pattern matched");
                    return sig.app_proto;
                }
            }
        }

        AppProto::Unknown
    }
}

fn contains_literal(window: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > window.len() {
        return needle.is_empty();
    }
    window.windows(needle.len()).any(|w| w == needle)
}

/// Owns both directions' pattern contexts; built once at rule-load time,
/// read-only from match time onward.
pub struct ProtoDetector {
    toserver: DirContext,
    toclient: DirContext,
    /// Reassembled bytes per direction the MPM will ever look at; past
    /// this, `get_proto` gives up and reports `Unknown` rather than
    /// scanning an unbounded buffer.
    inspect_bytes: usize,
}

impl Default for ProtoDetector {
    fn default() -> Self {
        Self { toserver: DirContext::default(), toclient: DirContext::default(), inspect_bytes: usize::MAX }
    }
}

impl ProtoDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a detector that gives up scanning past `inspect_bytes`
    /// reassembled bytes in either direction.
    pub fn with_inspect_bytes(inspect_bytes: usize) -> Self {
        Self { inspect_bytes, ..Self::default() }
    }

    pub fn set_inspect_bytes(&mut self, inspect_bytes: usize) {
        self.inspect_bytes = inspect_bytes;
    }

    /// Registers a pattern for one direction.
    pub fn add(
        &mut self,
        direction: Direction,
        ip_proto: IpProto,
        app_proto: AppProto,
        bytes: impl Into<Vec<u8>>,
        offset: usize,
        depth: usize,
    ) {
        let ctx = self.dir_mut(direction);
        ctx.add(ip_proto, app_proto, ProtoContent { bytes: bytes.into(), offset, depth });
    }

    /// Finalizes both directions' MPM contexts. Returns the per-direction
    /// `min_len` the reassembler should feed into the stream-queue
    /// minimum-chunk-length interface.
    pub fn finalize(&mut self) -> (usize, usize) {
        self.toserver.build();
        self.toclient.build();
        debug!(
            toserver_min_len = self.toserver.min_len,
            toclient_min_len = self.toclient.min_len,
            "app-layer detector finalized"
        );
        (self.toserver.min_len, self.toclient.min_len)
    }

    pub fn max_len(&self, direction: Direction) -> usize {
        self.dir(direction).max_len
    }

    /// Classifies a direction's reassembled prefix. Bytes past
    /// `inspect_bytes` are never looked at.
    pub fn get_proto(&self, buf: &[u8], direction: Direction, ip_proto: IpProto) -> AppProto {
        let clipped = &buf[..buf.len().min(self.inspect_bytes)];
        self.dir(direction).get_proto(clipped, ip_proto)
    }

    fn dir(&self, direction: Direction) -> &DirContext {
        match direction {
            Direction::ToServer => &self.toserver,
            Direction::ToClient => &self.toclient,
        }
    }

    fn dir_mut(&mut self, direction: Direction) -> &mut DirContext {
        match direction {
            Direction::ToServer => &mut self.toserver,
            Direction::ToClient => &mut self.toclient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_when_context_empty() {
        let detector = ProtoDetector::new();
        assert_eq!(detector.get_proto(b"GET / HTTP/1.0\r\n", Direction::ToServer, IpProto::Tcp), AppProto::Unknown);
    }

    #[test]
    fn matches_registered_pattern() {
        let mut detector = ProtoDetector::new();
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Http, b"GET ".to_vec(), 0, 4);
        detector.finalize();
        assert_eq!(
            detector.get_proto(b"GET / HTTP/1.0\r\n", Direction::ToServer, IpProto::Tcp),
            AppProto::Http
        );
    }

    #[test]
    fn rejects_ip_proto_mismatch() {
        let mut detector = ProtoDetector::new();
        detector.add(Direction::ToServer, IpProto::Udp, AppProto::DcerpcUdp, vec![0x04, 0x00], 0, 2);
        detector.finalize();
        assert_eq!(
            detector.get_proto(&[0x04, 0x00, 0x00, 0x00], Direction::ToServer, IpProto::Tcp),
            AppProto::Unknown
        );
    }

    #[test]
    fn same_offset_patterns_disambiguated_by_magic_byte() {
        // SMB vs SMB2 share position 4, differ only by magic byte.
        let mut detector = ProtoDetector::new();
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Smb, vec![0xff, 0x53, 0x4d, 0x42], 4, 8);
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Smb2, vec![0xfe, 0x53, 0x4d, 0x42], 4, 8);
        detector.finalize();

        let mut smb_buf = vec![0u8; 8];
        smb_buf[4..8].copy_from_slice(&[0xff, 0x53, 0x4d, 0x42]);
        assert_eq!(detector.get_proto(&smb_buf, Direction::ToServer, IpProto::Tcp), AppProto::Smb);

        let mut smb2_buf = vec![0u8; 8];
        smb2_buf[4..8].copy_from_slice(&[0xfe, 0x53, 0x4d, 0x42]);
        assert_eq!(detector.get_proto(&smb2_buf, Direction::ToServer, IpProto::Tcp), AppProto::Smb2);
    }

    #[test]
    fn inspect_bytes_cap_hides_matches_past_the_limit() {
        let mut detector = ProtoDetector::with_inspect_bytes(4);
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Http, b"GET ".to_vec(), 0, 4);
        detector.finalize();
        assert_eq!(
            detector.get_proto(b"GET / HTTP/1.0\r\n", Direction::ToServer, IpProto::Tcp),
            AppProto::Http
        );

        let mut detector = ProtoDetector::with_inspect_bytes(2);
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Http, b"GET ".to_vec(), 0, 4);
        detector.finalize();
        assert_eq!(
            detector.get_proto(b"GET / HTTP/1.0\r\n", Direction::ToServer, IpProto::Tcp),
            AppProto::Unknown
        );
    }

    #[test]
    fn depth_bound_rejects_late_match() {
        let mut detector = ProtoDetector::new();
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Http, b"GET ".to_vec(), 0, 4);
        detector.finalize();
        // "GET " appears but starting past depth, so buffer is too short
        // once clipped: simulate by handing a buffer shorter than offset+pattern.
        assert_eq!(detector.get_proto(b"XXGET ", Direction::ToServer, IpProto::Tcp), AppProto::Unknown);
    }
}
