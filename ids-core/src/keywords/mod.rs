//! Keyword Matchers: small, self-contained per-packet
//! predicates beyond addressing and protocol detection.

mod rpc;
mod stream_size;

pub use rpc::{parse_rpc_args, RpcMatch};
pub use stream_size::{parse_stream_size_args, StreamSide, StreamSizeMatch, StreamSizeOp};
