//! Length-prefixed message framing.
//!
//! Every control message travels as one frame:
//!
//! ```text
//! +--------------------+--------------------+
//! | length: u32 (BE)   | payload bytes      |
//! +--------------------+--------------------+
//! ```
//!
//! A frame is delivered whole or not at all. A declared length above
//! [`MAX_FRAME_SIZE`](crate::MAX_FRAME_SIZE) is rejected before any
//! payload allocation, and a zero-length frame is legal.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::MAX_FRAME_SIZE;
use crate::error::{ProtocolError, ProtocolResult};

/// Length of the frame prefix in bytes.
const PREFIX_LEN: usize = 4;

/// Encodes a payload into a complete frame ready for transmission.
pub fn encode_frame(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    if payload.len() as u64 > u64::from(MAX_FRAME_SIZE) {
        return Err(ProtocolError::FrameTooLarge {
            size: payload.len() as u64,
            max: MAX_FRAME_SIZE,
        });
    }
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes a single frame to `writer`.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads a single frame from `reader`.
///
/// Returns `Ok(None)` when the stream closes cleanly before any prefix
/// byte arrives. A stream that ends partway through the prefix or the
/// payload yields [`ProtocolError::TruncatedFrame`].
pub async fn read_frame<R>(reader: &mut R) -> ProtocolResult<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; PREFIX_LEN];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::TruncatedFrame {
                expected: PREFIX_LEN,
                received: filled,
            });
        }
        filled += n;
    }

    let len = u32::from_be_bytes(prefix);
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size: u64::from(len),
            max: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; len as usize];
    let mut filled = 0;
    while filled < payload.len() {
        let n = reader.read(&mut payload[filled..]).await?;
        if n == 0 {
            return Err(ProtocolError::TruncatedFrame {
                expected: PREFIX_LEN + payload.len(),
                received: PREFIX_LEN + filled,
            });
        }
        filled += n;
    }
    Ok(Some(payload))
}
