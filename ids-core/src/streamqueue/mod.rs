//! Stream-Message Queue: bounded, pooled FIFO carrying
//! reassembled payload chunks from reassembler to inspection.

mod msg;
mod pool;
mod queue;

pub use msg::StreamMsg;
pub use pool::{PooledMsg, StreamMsgPool};
pub use queue::StreamMsgQueue;

use crate::packet::Direction;

/// Per-direction minimum chunk lengths: written by the protocol
/// detector during finalization, read by the reassembler to decide when
/// enough bytes have accumulated to release a chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinChunkLen {
    toserver_init: usize,
    toserver: usize,
    toclient_init: usize,
    toclient: usize,
}

impl MinChunkLen {
    pub fn set_min_init_chunk_len(&mut self, direction: Direction, len: usize) {
        match direction {
            Direction::ToServer => self.toserver_init = len,
            Direction::ToClient => self.toclient_init = len,
        }
    }

    pub fn set_min_chunk_len(&mut self, direction: Direction, len: usize) {
        match direction {
            Direction::ToServer => self.toserver = len,
            Direction::ToClient => self.toclient = len,
        }
    }

    pub fn min_init_chunk_len(&self, direction: Direction) -> usize {
        match direction {
            Direction::ToServer => self.toserver_init,
            Direction::ToClient => self.toclient_init,
        }
    }

    pub fn min_chunk_len(&self, direction: Direction) -> usize {
        match direction {
            Direction::ToServer => self.toserver,
            Direction::ToClient => self.toclient,
        }
    }
}
