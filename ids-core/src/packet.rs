//! External-interface types: the shape of already-decoded input the
//! core consumes. Packet capture and decode themselves stay out of scope.

use bytes::Bytes;
use std::net::IpAddr;

/// IP-layer protocol of a packet, as needed by the IP-only matcher's
/// protocol-mask filter and the `rpc`/`stream_size` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProto {
    Tcp,
    Udp,
    Icmp,
    Other(u8),
}

impl IpProto {
    /// Bit position used by the per-signature protocol mask in
    /// [`crate::signature`]. `Other` protocols never match a mask built
    /// purely from `Tcp`/`Udp`/`Icmp`.
    pub fn mask_bit(self) -> Option<u8> {
        match self {
            IpProto::Tcp => Some(0),
            IpProto::Udp => Some(1),
            IpProto::Icmp => Some(2),
            IpProto::Other(_) => None,
        }
    }
}

/// Flow direction. `ToServer` is client→server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    ToServer,
    ToClient,
}

impl Direction {
    pub fn is_toserver(self) -> bool {
        matches!(self, Direction::ToServer)
    }

    pub fn is_toclient(self) -> bool {
        matches!(self, Direction::ToClient)
    }
}

/// A decoded packet, as handed to the core by the (external) packet
/// decoder and flow tracker.
#[derive(Debug, Clone)]
pub struct Packet {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub ip_proto: IpProto,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub direction: Direction,
    pub payload: Bytes,
}

impl Packet {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// Per-direction byte counters used by the `stream_size` keyword,
/// and the app-proto result latched onto a flow once detection succeeds.
///
/// TCP reassembly proper is out of scope; this is the minimal slice
/// of flow state the core reads and writes.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    pub app_proto: Option<crate::appproto::AppProto>,
    pub client_isn: u32,
    pub client_next_seq: u32,
    pub server_isn: u32,
    pub server_next_seq: u32,
}

impl FlowState {
    /// `next_seq - isn` for one side of the stream.
    pub fn client_stream_size(&self) -> u32 {
        self.client_next_seq.wrapping_sub(self.client_isn)
    }

    pub fn server_stream_size(&self) -> u32 {
        self.server_next_seq.wrapping_sub(self.server_isn)
    }
}
