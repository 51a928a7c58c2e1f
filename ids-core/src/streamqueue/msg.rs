//! A single pooled stream message: either a reassembled data chunk or a
//! gap marker, tagged with the direction and flags it carries from the
//! reassembler to the inspection path.

use bytes::BytesMut;

use crate::packet::Direction;

/// Stream boundary/flow flags, OR'd together on [`StreamMsg::flags`].
pub const FLAG_START: u8 = 0x01;
pub const FLAG_EOF: u8 = 0x02;
pub const FLAG_GAP: u8 = 0x04;

/// The payload half of a [`StreamMsg`]: a reassembled chunk, or a marker
/// recording how many bytes of the stream were lost to a gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMsgBody {
    Data { data: BytesMut, seq: u32 },
    Gap { gap_size: u32 },
}

impl Default for StreamMsgBody {
    fn default() -> Self {
        StreamMsgBody::Data { data: BytesMut::new(), seq: 0 }
    }
}

#[derive(Debug, Default)]
pub struct StreamMsg {
    pub direction: Direction,
    pub flags: u8,
    pub body: StreamMsgBody,
}

impl StreamMsg {
    /// Overwrites this message in place as a data chunk, reusing the
    /// existing buffer's capacity when it already held one.
    pub fn set_data(&mut self, direction: Direction, seq: u32, bytes: &[u8]) {
        self.direction = direction;
        self.flags &= !FLAG_GAP;
        match &mut self.body {
            StreamMsgBody::Data { data, seq: existing_seq } => {
                data.clear();
                data.extend_from_slice(bytes);
                *existing_seq = seq;
            }
            StreamMsgBody::Gap { .. } => {
                let mut data = BytesMut::new();
                data.extend_from_slice(bytes);
                self.body = StreamMsgBody::Data { data, seq };
            }
        }
    }

    /// Overwrites this message in place as a gap marker.
    pub fn set_gap(&mut self, direction: Direction, gap_size: u32) {
        self.direction = direction;
        self.flags |= FLAG_GAP;
        self.body = StreamMsgBody::Gap { gap_size };
    }

    pub fn is_gap(&self) -> bool {
        matches!(self.body, StreamMsgBody::Gap { .. })
    }

    /// `None` for a gap message.
    pub fn seq(&self) -> Option<u32> {
        match &self.body {
            StreamMsgBody::Data { seq, .. } => Some(*seq),
            StreamMsgBody::Gap { .. } => None,
        }
    }

    /// `None` for a gap message.
    pub fn data(&self) -> Option<&BytesMut> {
        match &self.body {
            StreamMsgBody::Data { data, .. } => Some(data),
            StreamMsgBody::Gap { .. } => None,
        }
    }

    /// `None` for a data message.
    pub fn gap_size(&self) -> Option<u32> {
        match &self.body {
            StreamMsgBody::Gap { gap_size } => Some(*gap_size),
            StreamMsgBody::Data { .. } => None,
        }
    }

    pub fn reset(&mut self) {
        self.direction = Direction::ToServer;
        self.flags = 0;
        match &mut self.body {
            StreamMsgBody::Data { data, seq } => {
                data.clear();
                *seq = 0;
            }
            StreamMsgBody::Gap { .. } => {
                self.body = StreamMsgBody::Data { data: BytesMut::new(), seq: 0 };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_data_overwrites_gap_variant() {
        let mut msg = StreamMsg::default();
        msg.set_gap(Direction::ToClient, 128);
        assert!(msg.is_gap());

        msg.set_data(Direction::ToServer, 7, b"hello");
        assert!(!msg.is_gap());
        assert_eq!(msg.seq(), Some(7));
        assert_eq!(msg.data().unwrap().as_ref(), b"hello");
        assert_eq!(msg.flags & FLAG_GAP, 0);
    }

    #[test]
    fn set_gap_overwrites_data_variant() {
        let mut msg = StreamMsg::default();
        msg.set_data(Direction::ToServer, 1, b"abc");

        msg.set_gap(Direction::ToServer, 42);
        assert!(msg.is_gap());
        assert_eq!(msg.gap_size(), Some(42));
        assert_eq!(msg.seq(), None);
        assert_ne!(msg.flags & FLAG_GAP, 0);
    }

    #[test]
    fn reset_clears_flags_and_reverts_to_empty_data() {
        let mut msg = StreamMsg::default();
        msg.set_gap(Direction::ToClient, 16);
        msg.flags |= FLAG_EOF;

        msg.reset();
        assert_eq!(msg.flags, 0);
        assert_eq!(msg.direction, Direction::ToServer);
        assert!(!msg.is_gap());
        assert!(msg.data().unwrap().is_empty());
        assert_eq!(msg.seq(), Some(0));
    }
}
