//! Resumable NBSS + SMB2 header parser. Each call consumes as many bytes
//! as it can of whatever fragment it's handed and reports how many it
//! took; the caller re-invokes with the remainder.

const NBSS_LEN: usize = 4;
const SMB2_HEADER_LEN: usize = 64;
const TOTAL_LEN: usize = NBSS_LEN + SMB2_HEADER_LEN;
const SMB2_MAGIC: [u8; 4] = [0xfe, 0x53, 0x4d, 0x42];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbssHeader {
    pub msg_type: u8,
    /// 17-bit length: bit 0 of byte 1 is bit 16 of the length.
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Smb2Header {
    pub structure_size: u16,
    pub credit_charge: u16,
    pub status: u32,
    pub command: u16,
    pub credit: u16,
    pub flags: u32,
    pub next_command: u32,
    pub message_id: u64,
    pub process_id: u32,
    pub tree_id: u32,
    pub session_id: u64,
    pub signature: [u8; 16],
}

/// Resumable parser state, indexed by the global `bytes_processed`
/// counter.
#[derive(Debug, Default)]
pub struct Smb2Parser {
    bytes_processed: usize,
    nbss: [u8; NBSS_LEN],
    magic: [u8; 4],
    header: Smb2Header,
    failed: bool,
}

impl Smb2Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_processed == TOTAL_LEN && !self.failed
    }

    pub fn nbss_header(&self) -> Option<NbssHeader> {
        if self.bytes_processed < NBSS_LEN {
            return None;
        }
        let length = ((self.nbss[1] as u32 & 0x01) << 16) | ((self.nbss[2] as u32) << 8) | self.nbss[3] as u32;
        Some(NbssHeader { msg_type: self.nbss[0], length })
    }

    pub fn header(&self) -> Option<&Smb2Header> {
        self.is_complete().then_some(&self.header)
    }

    /// Feeds a fragment; returns the number of bytes consumed. Consumes
    /// nothing once failed or complete.
    pub fn parse(&mut self, input: &[u8]) -> usize {
        if self.failed || self.is_complete() || input.is_empty() {
            return 0;
        }

        let remaining_to_finish = TOTAL_LEN - self.bytes_processed;
        if input.len() >= remaining_to_finish {
            // Fast path: the whole remainder of the header arrived in one
            // shot, so parse every field directly instead of one byte
            // at a time.
            self.parse_fast(&input[..remaining_to_finish]);
            remaining_to_finish
        } else {
            for &byte in input {
                self.consume_byte(byte);
                if self.failed {
                    break;
                }
            }
            input.len()
        }
    }

    fn parse_fast(&mut self, chunk: &[u8]) {
        let start = self.bytes_processed;
        for (i, &byte) in chunk.iter().enumerate() {
            self.write_field_byte(start + i, byte);
        }
        self.bytes_processed += chunk.len();
        self.check_magic();
    }

    fn consume_byte(&mut self, byte: u8) {
        let idx = self.bytes_processed;
        self.write_field_byte(idx, byte);
        self.bytes_processed += 1;
        if idx >= 4 && idx <= 7 {
            self.check_magic();
        }
    }

    fn check_magic(&mut self) {
        if self.bytes_processed >= 8 && self.magic != SMB2_MAGIC {
            self.failed = true;
        }
    }

    /// Writes one incoming byte, at absolute header offset `idx`, into
    /// the right field. Multi-byte little-endian integers are
    /// accumulated with `|=` against a shifted byte, one bit-lane per
    /// offset, so no field byte can ever clobber one written earlier —
    /// in particular this applies uniformly to the 64-bit MessageId at
    /// offsets 28..35.
    fn write_field_byte(&mut self, idx: usize, byte: u8) {
        match idx {
            0 => self.nbss[0] = byte,
            1..=3 => self.nbss[idx] = byte,
            4..=7 => self.magic[idx - 4] = byte,
            8..=9 => or_u16(&mut self.header.structure_size, idx - 8, byte),
            10..=11 => or_u16(&mut self.header.credit_charge, idx - 10, byte),
            12..=15 => or_u32(&mut self.header.status, idx - 12, byte),
            16..=17 => or_u16(&mut self.header.command, idx - 16, byte),
            18..=19 => or_u16(&mut self.header.credit, idx - 18, byte),
            20..=23 => or_u32(&mut self.header.flags, idx - 20, byte),
            24..=27 => or_u32(&mut self.header.next_command, idx - 24, byte),
            28..=35 => or_u64(&mut self.header.message_id, idx - 28, byte),
            36..=39 => or_u32(&mut self.header.process_id, idx - 36, byte),
            40..=43 => or_u32(&mut self.header.tree_id, idx - 40, byte),
            44..=51 => or_u64(&mut self.header.session_id, idx - 44, byte),
            52..=67 => self.header.signature[idx - 52] = byte,
            _ => {}
        }
    }
}

fn or_u16(field: &mut u16, byte_offset: usize, byte: u8) {
    *field |= (byte as u16) << (8 * byte_offset);
}

fn or_u32(field: &mut u32, byte_offset: usize, byte: u8) {
    *field |= (byte as u32) << (8 * byte_offset);
}

fn or_u64(field: &mut u64, byte_offset: usize, byte: u8) {
    *field |= (byte as u64) << (8 * byte_offset);
}
