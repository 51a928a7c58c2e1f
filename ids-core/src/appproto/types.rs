//! Application-layer protocol enum and the registered-pattern record
//! shape.

use crate::packet::IpProto;

/// The deployment's set of recognizable application-layer protocols.
/// `Unknown` is the detector's "no match yet" result, never a registered
/// pattern's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppProto {
    Unknown,
    Http,
    Tls,
    Ssh,
    Smb,
    Smb2,
    DcerpcTcp,
    DcerpcUdp,
    Ftp,
    Smtp,
    Imap,
    Msn,
}

impl Default for AppProto {
    fn default() -> Self {
        AppProto::Unknown
    }
}

/// The offset/depth window a pattern must fall within, carried alongside
/// the raw bytes so the post-MPM literal check can re-verify position.
#[derive(Debug, Clone)]
pub struct ProtoContent {
    pub bytes: Vec<u8>,
    pub offset: usize,
    pub depth: usize,
}

/// One registered rule: these bytes, in this window, on this IP
/// protocol, mean this app-proto.
#[derive(Debug, Clone)]
pub struct ProtoSignature {
    pub ip_proto: IpProto,
    pub app_proto: AppProto,
    pub content: ProtoContent,
}
