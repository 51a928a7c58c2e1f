//! Default pattern table. These are contracts: altering them breaks the
//! integration tests that assume this exact ground truth.

use crate::packet::{Direction, IpProto};

use super::detector::ProtoDetector;
use super::types::AppProto;

/// Populates `detector` with the deployment's baseline fingerprints and
/// finalizes it. Returns the `(toserver_min_len, toclient_min_len)` pair
/// the reassembler needs.
pub fn register_defaults(detector: &mut ProtoDetector) -> (usize, usize) {
    const HTTP_METHODS: &[&[u8]] =
        &[b"GET ", b"POST ", b"PUT ", b"HEAD ", b"OPTIONS ", b"TRACE ", b"CONNECT "];

    for method in HTTP_METHODS {
        let depth = method.len() + 1;
        detector.add(Direction::ToServer, IpProto::Tcp, AppProto::Http, method.to_vec(), 0, depth);
    }
    detector.add(Direction::ToClient, IpProto::Tcp, AppProto::Http, b"HTTP/".to_vec(), 0, 5);
    detector.add(Direction::ToClient, IpProto::Tcp, AppProto::Ftp, b"220 ".to_vec(), 0, 4);

    for direction in [Direction::ToServer, Direction::ToClient] {
        for third_byte in 0x00u8..=0x04 {
            detector.add(direction, IpProto::Tcp, AppProto::Tls, vec![0x16, 0x03, third_byte], 0, 3);
        }
    }

    for direction in [Direction::ToServer, Direction::ToClient] {
        detector.add(direction, IpProto::Tcp, AppProto::Smb, vec![0xff, 0x53, 0x4d, 0x42], 4, 8);
        detector.add(direction, IpProto::Tcp, AppProto::Smb2, vec![0xfe, 0x53, 0x4d, 0x42], 4, 8);
    }

    detector.add(Direction::ToServer, IpProto::Tcp, AppProto::DcerpcTcp, vec![0x05, 0x00], 0, 2);
    detector.add(Direction::ToClient, IpProto::Tcp, AppProto::DcerpcTcp, vec![0x05, 0x00], 0, 2);
    detector.add(Direction::ToServer, IpProto::Udp, AppProto::DcerpcUdp, vec![0x04, 0x00], 0, 2);
    detector.add(Direction::ToClient, IpProto::Udp, AppProto::DcerpcUdp, vec![0x04, 0x00], 0, 2);

    detector.finalize()
}
