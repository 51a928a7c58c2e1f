//! `stream_size` keyword: `<side>, <op>, <n>` compared against
//! `next_seq - isn` for the indicated TCP stream direction(s).

use crate::error::{RuleError, RuleResult};
use crate::packet::FlowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSide {
    Server,
    Client,
    Both,
    Either,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSizeOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSizeMatch {
    pub side: StreamSide,
    pub op: StreamSizeOp,
    pub n: u32,
}

pub fn parse_stream_size_args(input: &str) -> RuleResult<StreamSizeMatch> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(RuleError::InvalidStreamSize(input.to_string()));
    }

    let side = match parts[0].to_ascii_lowercase().as_str() {
        "server" => StreamSide::Server,
        "client" => StreamSide::Client,
        "both" => StreamSide::Both,
        "either" => StreamSide::Either,
        _ => return Err(RuleError::InvalidStreamSize(input.to_string())),
    };

    // Historically a missing `== 0` on the `strcmp` result left this
    // comparison backwards; every arm here is an explicit, exact string
    // match against the trimmed operator token.
    let op = match parts[1] {
        "<" => StreamSizeOp::Lt,
        "<=" => StreamSizeOp::Le,
        "==" => StreamSizeOp::Eq,
        "!=" => StreamSizeOp::Ne,
        ">=" => StreamSizeOp::Ge,
        ">" => StreamSizeOp::Gt,
        _ => return Err(RuleError::InvalidStreamSize(input.to_string())),
    };

    let n: u32 = parts[2].parse().map_err(|_| RuleError::InvalidStreamSize(input.to_string()))?;

    Ok(StreamSizeMatch { side, op, n })
}

impl StreamSizeOp {
    fn compare(self, actual: u32, n: u32) -> bool {
        match self {
            StreamSizeOp::Lt => actual < n,
            StreamSizeOp::Le => actual <= n,
            StreamSizeOp::Eq => actual == n,
            StreamSizeOp::Ne => actual != n,
            StreamSizeOp::Ge => actual >= n,
            StreamSizeOp::Gt => actual > n,
        }
    }
}

impl StreamSizeMatch {
    /// Fails closed if the flow has no established TCP sequence state
    /// (both ISN/next_seq pairs default to zero for a fresh `FlowState`,
    /// which compares as a zero-length stream rather than erroring —
    /// callers without a real TCP session should not invoke this at all).
    pub fn matches(&self, flow: &FlowState) -> bool {
        match self.side {
            StreamSide::Server => self.op.compare(flow.server_stream_size(), self.n),
            StreamSide::Client => self.op.compare(flow.client_stream_size(), self.n),
            StreamSide::Both => {
                self.op.compare(flow.server_stream_size(), self.n)
                    && self.op.compare(flow.client_stream_size(), self.n)
            }
            StreamSide::Either => {
                self.op.compare(flow.server_stream_size(), self.n)
                    || self.op.compare(flow.client_stream_size(), self.n)
            }
        }
    }
}
