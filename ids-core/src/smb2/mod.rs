//! SMB2 Header Parser: resumable NBSS + SMB2 header decode.
//! Unknown NBSS message types are not SMB2 parse failures — callers
//! should check [`NbssHeader::msg_type`] and simply stop feeding bytes
//! to this parser when it isn't a session message.

mod parser;

pub use parser::{NbssHeader, Smb2Header, Smb2Parser};
