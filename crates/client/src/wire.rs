//! Client-side reads and writes of the greatwire stream.
//!
//! ```text
//! UPLOAD:
//!   client -> server  RR***Great++1++<name>++<size>++***
//!   server -> client  ok | abort
//!   client -> server  [size bytes: raw file data]
//!   server -> client  ok | abort
//!
//! DOWNLOAD:
//!   client -> server  RR***Great++2++<name>++***
//!   server -> client  ok | abort
//!   server -> client  <size>\n
//!   server -> client  [size bytes: raw file data, read in 2048-byte chunks]
//!
//! TEARDOWN:
//!   client -> server  RR***Great++1++exit++***
//! ```

use greatwire_protocol::{CHUNK_SIZE, ControlFrame, Response, decode_size_line};
use greatwire_transfer::{ChunkTracker, chunk_len, total_chunks};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
};

use crate::error::ClientError;

/// Longest size message accepted, digits plus newline.
const MAX_SIZE_LINE: u64 = 32;

/// Writes one control frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &ControlFrame,
) -> Result<(), ClientError> {
    writer.write_all(frame.encode().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one response token.
///
/// Tokens have fixed lengths and share no prefix, so exactly the token's
/// bytes are consumed and anything the server sent after it stays unread.
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Response, ClientError> {
    let mut token = [0u8; Response::MAX_LEN];
    let head = Response::Ok.as_bytes().len();
    reader.read_exact(&mut token[..head]).await?;

    let len = if &token[..head] == b"ab" {
        reader.read_exact(&mut token[head..]).await?;
        Response::MAX_LEN
    } else {
        head
    };

    Response::parse(&token[..len]).ok_or_else(|| {
        ClientError::UnexpectedResponse(String::from_utf8_lossy(&token[..len]).into_owned())
    })
}

/// Reads the size message that follows a download `ok`.
pub async fn read_size<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<u64, ClientError> {
    let mut line = Vec::new();
    let mut limited = reader.take(MAX_SIZE_LINE);
    limited.read_until(b'\n', &mut line).await?;
    if line.last() != Some(&b'\n') {
        return Err(ClientError::BadSize(
            String::from_utf8_lossy(&line).into_owned(),
        ));
    }
    let text = std::str::from_utf8(&line)
        .map_err(|_| ClientError::BadSize(String::from_utf8_lossy(&line).into_owned()))?;
    Ok(decode_size_line(text)?)
}

/// Reads `size` bytes of file content, one chunk at a time.
///
/// The loop runs `ceil(size / CHUNK_SIZE)` times and every chunk is read in
/// full, the last one being only as long as what is left. `on_chunk` sees
/// the tracker after each chunk.
pub async fn read_content<R, F>(
    reader: &mut R,
    size: u64,
    mut on_chunk: F,
) -> Result<Vec<u8>, ClientError>
where
    R: AsyncRead + Unpin,
    F: FnMut(&ChunkTracker),
{
    let mut content = Vec::with_capacity(size.min(64 * CHUNK_SIZE as u64) as usize);
    let mut buf = [0u8; CHUNK_SIZE];
    let mut tracker = ChunkTracker::new(size);

    for index in 0..total_chunks(size) {
        let len = chunk_len(index, size);
        reader.read_exact(&mut buf[..len]).await?;
        content.extend_from_slice(&buf[..len]);
        tracker = tracker.record(len);
        on_chunk(&tracker);
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use tokio::io::BufReader;

    use super::*;

    #[tokio::test]
    async fn write_frame_bytes() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &ControlFrame::download("a.txt"))
            .await
            .unwrap();
        assert_eq!(buf, b"RR***Great++2++a.txt++***");
    }

    #[tokio::test]
    async fn response_ok_leaves_following_bytes() {
        let mut cursor: &[u8] = b"ok12\nrest";
        assert_eq!(read_response(&mut cursor).await.unwrap(), Response::Ok);
        assert_eq!(cursor, b"12\nrest");
    }

    #[tokio::test]
    async fn response_abort() {
        let mut cursor: &[u8] = b"abort";
        assert_eq!(read_response(&mut cursor).await.unwrap(), Response::Abort);
        assert!(cursor.is_empty());
    }

    #[tokio::test]
    async fn response_unknown() {
        let mut cursor: &[u8] = b"nope!";
        let err = read_response(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(ref s) if s == "no"));

        let mut cursor: &[u8] = b"abxyz";
        let err = read_response(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(ref s) if s == "abxyz"));
    }

    #[tokio::test]
    async fn response_on_closed_stream() {
        let mut cursor: &[u8] = b"o";
        let err = read_response(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[tokio::test]
    async fn size_then_content() {
        let mut reader = BufReader::new(&b"5\nhello"[..]);
        let size = read_size(&mut reader).await.unwrap();
        assert_eq!(size, 5);

        let content = read_content(&mut reader, size, |_| {}).await.unwrap();
        assert_eq!(content, b"hello");
    }

    #[tokio::test]
    async fn size_starting_content_with_digits() {
        let mut reader = BufReader::new(&b"3\n123"[..]);
        let size = read_size(&mut reader).await.unwrap();
        assert_eq!(size, 3);
        assert_eq!(
            read_content(&mut reader, size, |_| {}).await.unwrap(),
            b"123"
        );
    }

    #[tokio::test]
    async fn size_without_newline_is_rejected() {
        let mut reader = BufReader::new(&b"12345"[..]);
        assert!(matches!(
            read_size(&mut reader).await,
            Err(ClientError::BadSize(_))
        ));
    }

    #[tokio::test]
    async fn size_not_a_number() {
        let mut reader = BufReader::new(&b"abc\n"[..]);
        assert!(read_size(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn content_counts_chunks() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 7) as u8).collect();
        let mut trailing = data.clone();
        trailing.extend_from_slice(b"RR***Great");

        let mut seen = Vec::new();
        let mut cursor: &[u8] = &trailing;
        let content = read_content(&mut cursor, 5000, |t| seen.push(t.chunks_received()))
            .await
            .unwrap();

        assert_eq!(content, data);
        assert_eq!(seen, vec![1, 2, 3]);
        // Bytes after the declared size are not consumed.
        assert_eq!(cursor, b"RR***Great");
    }

    #[tokio::test]
    async fn zero_size_reads_nothing() {
        let mut cursor: &[u8] = b"untouched";
        let content = read_content(&mut cursor, 0, |_| panic!("no chunks expected"))
            .await
            .unwrap();
        assert!(content.is_empty());
        assert_eq!(cursor, b"untouched");
    }

    #[tokio::test]
    async fn truncated_content_fails() {
        let mut cursor: &[u8] = b"short";
        let err = read_content(&mut cursor, 4096, |_| {}).await.unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
    }
}
