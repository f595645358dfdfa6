//! Exchange Wire Protocol
//!
//! Every message on a shuffle connection is exactly `FRAME_LEN` bytes: one control
//! byte followed by one record-sized payload. There is no length prefix, so a short
//! read can never be resynchronized and is always fatal.
//!
//! ```text
//! [control: u8][payload: RECORD_LEN bytes]
//!   0x00 -> data record
//!   0xFF -> end of stream (payload ignored)
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, SortError};
use crate::storage::record::{RECORD_LEN, Record};

pub const FRAME_LEN: usize = RECORD_LEN + 1;
pub const CONTROL_DATA: u8 = 0x00;
pub const CONTROL_END_OF_STREAM: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Data(Record),
    EndOfStream,
}

impl Frame {
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        match self {
            Frame::Data(record) => {
                buf[0] = CONTROL_DATA;
                buf[1..].copy_from_slice(record.as_bytes());
            }
            Frame::EndOfStream => {
                buf[0] = CONTROL_END_OF_STREAM;
            }
        }
        buf
    }

    /// Decodes one frame. `peer` only labels the error.
    pub fn decode(buf: &[u8; FRAME_LEN], peer: &str) -> Result<Self> {
        match buf[0] {
            CONTROL_DATA => {
                let mut payload = [0u8; RECORD_LEN];
                payload.copy_from_slice(&buf[1..]);
                Ok(Frame::Data(Record::new(payload)))
            }
            CONTROL_END_OF_STREAM => Ok(Frame::EndOfStream),
            byte => Err(SortError::UnknownControlByte {
                peer: peer.to_string(),
                byte,
            }),
        }
    }
}

/// Reads one full frame.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary and
/// `SortError::ShortRead` when it ends partway through a frame.
pub async fn read_frame<R>(reader: &mut R, peer: &str) -> Result<Option<Frame>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; FRAME_LEN];
    let mut filled = 0;

    while filled < FRAME_LEN {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(SortError::ShortRead {
                peer: peer.to_string(),
                got: filled,
                expected: FRAME_LEN,
            });
        }
        filled += n;
    }

    Frame::decode(&buf, peer).map(Some)
}

pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.encode()).await?;
    Ok(())
}
