//! Chunked file transfer.
//!
//! A transfer follows a `READY` response on the same stream:
//!
//! ```text
//! +----------------------+--------------------------------------+
//! | file size: u64 (BE)  | file bytes, chunks of <= CHUNK_SIZE  |
//! +----------------------+--------------------------------------+
//! ```
//!
//! The body carries no framing of its own; both ends count bytes until
//! the announced size is reached. A zero-byte file is a legal transfer
//! consisting of the header alone. Chunks are written to the
//! destination as they arrive, so a file is never buffered whole.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::{CHUNK_SIZE, FILE_HEADER_LEN};

/// Sends exactly `len` bytes from `src`, preceded by the size header.
///
/// `progress` is invoked with `(bytes_sent, len)` after every chunk. A
/// source that runs dry before `len` bytes yields
/// [`ProtocolError::TransferInterrupted`]; a source holding more than
/// `len` bytes is not read past `len`.
pub async fn send_file<W, R, F>(
    writer: &mut W,
    src: &mut R,
    len: u64,
    mut progress: F,
) -> ProtocolResult<u64>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
    F: FnMut(u64, u64),
{
    writer.write_all(&len.to_be_bytes()).await?;

    let mut chunk = [0u8; CHUNK_SIZE];
    let mut sent = 0u64;
    while sent < len {
        let want = (CHUNK_SIZE as u64).min(len - sent) as usize;
        let n = src.read(&mut chunk[..want]).await?;
        if n == 0 {
            return Err(ProtocolError::TransferInterrupted {
                received: sent,
                expected: len,
            });
        }
        writer.write_all(&chunk[..n]).await?;
        sent += n as u64;
        progress(sent, len);
    }
    writer.flush().await?;
    Ok(sent)
}

/// Receives one file into `dst`, returning the number of bytes written.
///
/// Reads the 8-byte size header first; a stream that ends before the
/// header completes yields [`ProtocolError::MalformedHeader`], and one
/// that ends mid-body yields [`ProtocolError::TransferInterrupted`]
/// with the byte counts so far. `progress` is invoked with
/// `(bytes_received, total)` after every chunk.
pub async fn receive_file<R, W, F>(
    reader: &mut R,
    dst: &mut W,
    mut progress: F,
) -> ProtocolResult<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnMut(u64, u64),
{
    let mut header = [0u8; FILE_HEADER_LEN];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return Err(ProtocolError::MalformedHeader { received: filled });
        }
        filled += n;
    }
    let len = u64::from_be_bytes(header);

    let mut chunk = [0u8; CHUNK_SIZE];
    let mut received = 0u64;
    while received < len {
        let want = (CHUNK_SIZE as u64).min(len - received) as usize;
        let n = reader.read(&mut chunk[..want]).await?;
        if n == 0 {
            return Err(ProtocolError::TransferInterrupted {
                received,
                expected: len,
            });
        }
        dst.write_all(&chunk[..n]).await?;
        received += n as u64;
        progress(received, len);
    }
    dst.flush().await?;
    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    async fn wire_for(content: &[u8]) -> Vec<u8> {
        let mut wire = Vec::new();
        let mut src = content;
        send_file(&mut wire, &mut src, content.len() as u64, |_, _| {})
            .await
            .unwrap();
        wire
    }

    #[tokio::test]
    async fn round_trip_various_sizes() {
        for len in [0usize, 1, 100, CHUNK_SIZE, CHUNK_SIZE + 1, 3 * CHUNK_SIZE + 17] {
            let content = pattern(len);
            let wire = wire_for(&content).await;
            assert_eq!(wire.len(), FILE_HEADER_LEN + len);

            let mut reader = wire.as_slice();
            let mut out = Vec::new();
            let received = receive_file(&mut reader, &mut out, |_, _| {}).await.unwrap();
            assert_eq!(received, len as u64);
            assert_eq!(out, content);
        }
    }

    #[tokio::test]
    async fn streams_through_a_small_pipe() {
        // The pipe is far smaller than the file, so the sender must
        // interleave with the receiver instead of buffering the body.
        let content = pattern(64 * 1024);
        let (mut tx, mut rx) = tokio::io::duplex(1024);

        let payload = content.clone();
        let sender = tokio::spawn(async move {
            let mut src = payload.as_slice();
            send_file(&mut tx, &mut src, payload.len() as u64, |_, _| {})
                .await
                .unwrap()
        });

        let mut out = Vec::new();
        let received = receive_file(&mut rx, &mut out, |_, _| {}).await.unwrap();
        assert_eq!(sender.await.unwrap(), content.len() as u64);
        assert_eq!(received, content.len() as u64);
        assert_eq!(out, content);
    }

    #[tokio::test]
    async fn zero_byte_file_transfers_cleanly() {
        let wire = wire_for(&[]).await;
        assert_eq!(wire, 0u64.to_be_bytes());

        let mut reader = wire.as_slice();
        let mut out = Vec::new();
        let mut calls = 0;
        let received = receive_file(&mut reader, &mut out, |_, _| calls += 1)
            .await
            .unwrap();
        assert_eq!(received, 0);
        assert!(out.is_empty());
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_total() {
        let content = pattern(3 * CHUNK_SIZE + 5);
        let wire = wire_for(&content).await;

        let mut reader = wire.as_slice();
        let mut out = Vec::new();
        let mut seen = Vec::new();
        receive_file(&mut reader, &mut out, |done, total| {
            assert_eq!(total, content.len() as u64);
            seen.push(done);
        })
        .await
        .unwrap();

        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(seen.last().copied(), Some(content.len() as u64));
    }

    #[tokio::test]
    async fn interrupted_body_reports_bytes_so_far() {
        let content = pattern(1000);
        let full = wire_for(&content).await;

        for cut in [0usize, 1, 400, 999] {
            let mut wire = full.clone();
            wire.truncate(FILE_HEADER_LEN + cut);

            let mut reader = wire.as_slice();
            let mut out = Vec::new();
            let err = receive_file(&mut reader, &mut out, |_, _| {})
                .await
                .unwrap_err();
            match err {
                ProtocolError::TransferInterrupted { received, expected } => {
                    assert_eq!(received, cut as u64);
                    assert_eq!(expected, 1000);
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(out.len(), cut);
        }
    }

    #[tokio::test]
    async fn short_header_is_malformed() {
        for cut in 0..FILE_HEADER_LEN {
            let wire = 42u64.to_be_bytes();
            let mut reader = &wire[..cut];
            let err = receive_file(&mut reader, &mut Vec::new(), |_, _| {})
                .await
                .unwrap_err();
            assert!(
                matches!(err, ProtocolError::MalformedHeader { received } if received == cut),
                "cut at {cut}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn sender_detects_short_source() {
        let content = pattern(40);
        let mut src = content.as_slice();
        let mut wire = Vec::new();
        let err = send_file(&mut wire, &mut src, 100, |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::TransferInterrupted {
                received: 40,
                expected: 100,
            }
        ));
        assert_eq!(wire.len(), FILE_HEADER_LEN + 40);
    }

    #[tokio::test]
    async fn sender_never_reads_past_len() {
        let content = pattern(200);
        let mut src = content.as_slice();
        let mut wire = Vec::new();
        let sent = send_file(&mut wire, &mut src, 100, |_, _| {}).await.unwrap();
        assert_eq!(sent, 100);
        assert_eq!(wire.len(), FILE_HEADER_LEN + 100);
        assert_eq!(&wire[FILE_HEADER_LEN..], &content[..100]);
        assert_eq!(src.len(), 100);
    }
}
