//! Flat signature table shared by the IP-only matcher and the app-layer
//! detector, keyed by internal signature ID so neither module needs to
//! reference the other's rule-metadata type directly.

use ahash::AHashMap;

use crate::packet::IpProto;

/// Per-signature protocol mask: which IP protocols this signature's
/// `ip_proto` keyword (if any) allows. Checked against a packet's actual
/// protocol before trusting an IP-only match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtoMask {
    bits: u8,
}

impl ProtoMask {
    pub fn any() -> Self {
        Self { bits: u8::MAX }
    }

    pub fn allow(mut self, proto: IpProto) -> Self {
        if let Some(bit) = proto.mask_bit() {
            self.bits |= 1 << bit;
        }
        self
    }

    pub fn permits(&self, proto: IpProto) -> bool {
        match proto.mask_bit() {
            Some(bit) => self.bits & (1 << bit) != 0,
            None => false,
        }
    }
}

/// A signature's load-time metadata, referenced by ID from every
/// per-range bitmap and every app-layer pattern chain.
#[derive(Debug, Clone)]
pub struct SignatureMeta {
    pub sig_id: u32,
    pub name: String,
    pub proto_mask: ProtoMask,
}

/// The signature table itself: a dense `sig_id -> SignatureMeta` map
/// built once at rule-load time and consulted read-only thereafter.
#[derive(Debug, Default)]
pub struct SignatureTable {
    entries: AHashMap<u32, SignatureMeta>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, proto_mask: ProtoMask) -> u32 {
        let sig_id = self.entries.len() as u32;
        self.entries.insert(sig_id, SignatureMeta { sig_id, name: name.into(), proto_mask });
        sig_id
    }

    pub fn get(&self, sig_id: u32) -> Option<&SignatureMeta> {
        self.entries.get(&sig_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `sig_id`'s protocol mask permits `proto`; unknown
    /// signature IDs are treated as permitting nothing, not everything —
    /// a stale bitmap bit should never resurrect a dropped signature.
    pub fn permits(&self, sig_id: u32, proto: IpProto) -> bool {
        self.entries.get(&sig_id).map(|meta| meta.proto_mask.permits(proto)).unwrap_or(false)
    }
}
