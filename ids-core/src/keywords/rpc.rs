//! `rpc` keyword: `program[, version|*[, procedure|*]]` against a
//! Sun RPC Call header.

use crate::error::{RuleError, RuleResult};
use crate::packet::IpProto;

const RPC_HEADER_LEN: usize = 24;
const TCP_RECORD_MARK_LEN: usize = 4;
const RPC_CALL_MSG_TYPE: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcMatch {
    pub program: u32,
    pub version: Option<u32>,
    pub procedure: Option<u32>,
}

/// Parses `program[, version|*[, procedure|*]]`.
pub fn parse_rpc_args(input: &str) -> RuleResult<RpcMatch> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.is_empty() || parts.len() > 3 || parts[0].is_empty() {
        return Err(RuleError::InvalidRpc(input.to_string()));
    }

    let program: u32 = parts[0].parse().map_err(|_| RuleError::InvalidRpc(input.to_string()))?;
    let version = parse_wildcard_field(parts.get(1).copied(), input)?;
    let procedure = parse_wildcard_field(parts.get(2).copied(), input)?;

    Ok(RpcMatch { program, version, procedure })
}

fn parse_wildcard_field(field: Option<&str>, whole_input: &str) -> RuleResult<Option<u32>> {
    match field {
        None => Ok(None),
        Some("*") => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| RuleError::InvalidRpc(whole_input.to_string())),
    }
}

impl RpcMatch {
    /// Checks the parsed `rpc` match against a decoded payload, skipping
    /// the TCP record mark first when present. Fails closed on any short
    /// or malformed payload.
    pub fn matches(&self, ip_proto: IpProto, payload: &[u8]) -> bool {
        let header = match ip_proto {
            IpProto::Tcp => {
                if payload.len() < TCP_RECORD_MARK_LEN + RPC_HEADER_LEN {
                    return false;
                }
                &payload[TCP_RECORD_MARK_LEN..TCP_RECORD_MARK_LEN + RPC_HEADER_LEN]
            }
            IpProto::Udp => {
                if payload.len() < RPC_HEADER_LEN {
                    return false;
                }
                &payload[..RPC_HEADER_LEN]
            }
            _ => return false,
        };

        let msg_type = be_u32(header, 4);
        if msg_type != RPC_CALL_MSG_TYPE {
            return false;
        }
        let program = be_u32(header, 12);
        if program != self.program {
            return false;
        }
        if let Some(version) = self.version {
            if be_u32(header, 16) != version {
                return false;
            }
        }
        if let Some(procedure) = self.procedure {
            if be_u32(header, 20) != procedure {
                return false;
            }
        }
        true
    }
}

fn be_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_call_payload(prog: u32, vers: u32, proc_: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1234u32.to_be_bytes()); // xid
        buf.extend_from_slice(&0u32.to_be_bytes()); // type = Call
        buf.extend_from_slice(&2u32.to_be_bytes()); // rpcvers
        buf.extend_from_slice(&prog.to_be_bytes());
        buf.extend_from_slice(&vers.to_be_bytes());
        buf.extend_from_slice(&proc_.to_be_bytes());
        buf.extend_from_slice(&[0u8; 32]); // auth-null + getport-args
        buf
    }

    #[test]
    fn parses_full_triple() {
        let m = parse_rpc_args("100000, 2, 3").unwrap();
        assert_eq!(m, RpcMatch { program: 100000, version: Some(2), procedure: Some(3) });
    }

    #[test]
    fn wildcards_become_none() {
        let m = parse_rpc_args("100000, *, 3").unwrap();
        assert_eq!(m.version, None);
        assert_eq!(m.procedure, Some(3));
    }

    #[test]
    fn rpc_call_match_over_udp() {
        let payload = rpc_call_payload(100000, 2, 3);
        let exact = parse_rpc_args("100000, 2, 3").unwrap();
        assert!(exact.matches(IpProto::Udp, &payload));

        let wildcard_version = parse_rpc_args("100000, *, 3").unwrap();
        assert!(wildcard_version.matches(IpProto::Udp, &payload));

        let wrong_program = parse_rpc_args("123456, *, 3").unwrap();
        assert!(!wrong_program.matches(IpProto::Udp, &payload));
    }

    #[test]
    fn tcp_skips_record_mark_prefix() {
        let mut payload = vec![0u8; 4];
        payload.extend(rpc_call_payload(100000, 1, 0));
        let m = parse_rpc_args("100000").unwrap();
        assert!(m.matches(IpProto::Tcp, &payload));
    }

    #[test]
    fn short_payload_fails_closed() {
        let m = parse_rpc_args("100000").unwrap();
        assert!(!m.matches(IpProto::Udp, &[0u8; 10]));
        assert!(!m.matches(IpProto::Tcp, &[0u8; 10]));
    }

    #[test]
    fn non_call_message_type_rejected() {
        let mut payload = rpc_call_payload(100000, 2, 3);
        payload[4..8].copy_from_slice(&1u32.to_be_bytes()); // Reply, not Call
        let m = parse_rpc_args("100000").unwrap();
        assert!(!m.matches(IpProto::Udp, &payload));
    }
}
