//! Drives a [`Session`] over one accepted TCP stream.

use std::net::SocketAddr;
use std::sync::Arc;

use greatwire_protocol::{CHUNK_SIZE, Response, encode_size};
use greatwire_transfer::{Storage, StorageError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::ServerError;
use crate::session::{Effect, Session, SessionState};

/// Runs the protocol on `stream` until the session terminates.
///
/// Returns `Ok` when the peer sent `exit` or went quiet for too long, and
/// `Err` only on socket I/O failure.
pub async fn serve_connection<S>(
    mut stream: S,
    peer_addr: SocketAddr,
    storage: Arc<Storage>,
    max_empty_reads: u32,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!(%peer_addr, "client connected");

    let mut session = Session::new(max_empty_reads);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut last_decile = 0u8;

    while !session.is_terminated() {
        let limit = session.next_read_len().min(buf.len());
        let n = stream.read(&mut buf[..limit]).await?;
        if n > 0 && matches!(session.state(), SessionState::Idle { .. }) {
            tracing::debug!(%peer_addr, bytes = n, "control data received");
        }

        let effects = session.on_read(&buf[..n]);

        if let SessionState::Receiving(transfer) = session.state() {
            let decile = transfer.tracker().decile();
            if decile != last_decile {
                last_decile = decile;
                tracing::info!(
                    %peer_addr,
                    filename = transfer.filename(),
                    percent = transfer.tracker().percent().round() as u64,
                    "receiving file"
                );
            }
        } else {
            last_decile = 0;
        }

        for effect in effects {
            apply(&mut stream, &storage, peer_addr, effect).await?;
        }
    }

    tracing::info!(%peer_addr, "client disconnected");
    Ok(())
}

async fn apply<S>(
    stream: &mut S,
    storage: &Storage,
    peer_addr: SocketAddr,
    effect: Effect,
) -> Result<(), ServerError>
where
    S: AsyncWrite + Unpin,
{
    match effect {
        Effect::Reply(response) => send(stream, response.as_bytes()).await?,

        Effect::Serve { filename } => match storage.read(&filename).await {
            Ok(data) => {
                send(stream, Response::Ok.as_bytes()).await?;
                send(stream, encode_size(data.len() as u64).as_bytes()).await?;
                send(stream, &data).await?;
                tracing::info!(%peer_addr, %filename, size = data.len(), "file sent");
            }
            Err(StorageError::NotFound(_)) => {
                tracing::info!(%peer_addr, %filename, "requested file not found");
                send(stream, Response::Abort.as_bytes()).await?;
            }
            Err(e) => {
                tracing::error!(%peer_addr, %filename, "failed to read file: {e}");
                send(stream, Response::Abort.as_bytes()).await?;
            }
        },

        Effect::Store { filename, payload } => {
            let size = payload.len();
            let kind = payload.kind();
            match storage.write(&filename, &payload).await {
                Ok(path) => {
                    tracing::info!(
                        %peer_addr,
                        path = %path.display(),
                        size,
                        kind,
                        "file received"
                    );
                    send(stream, Response::Ok.as_bytes()).await?;
                }
                Err(e) => {
                    tracing::error!(%peer_addr, %filename, "failed to store upload: {e}");
                    send(stream, Response::Abort.as_bytes()).await?;
                }
            }
        }

        Effect::Close => {
            // The peer may already be gone; closing is best-effort.
            let _ = stream.shutdown().await;
        }
    }
    Ok(())
}

async fn send<S: AsyncWrite + Unpin>(stream: &mut S, data: &[u8]) -> Result<(), ServerError> {
    stream.write_all(data).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use greatwire_protocol::ControlFrame;
    use tokio::io::duplex;

    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:9".parse().unwrap()
    }

    async fn read_some(client: &mut tokio::io::DuplexStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        client.read_exact(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn exit_ends_connection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(dir.path()));
        let (mut client, server) = duplex(4096);

        let handle = tokio::spawn(serve_connection(server, addr(), storage, 10));
        client
            .write_all(ControlFrame::Exit.encode().as_bytes())
            .await
            .unwrap();

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn closed_peer_ends_connection_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(dir.path()));
        let (client, server) = duplex(4096);

        let handle = tokio::spawn(serve_connection(server, addr(), storage, 10));
        drop(client);

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn upload_is_stored_and_acknowledged() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(dir.path().join("storage")));
        let (mut client, server) = duplex(16 * 1024);

        let handle = tokio::spawn(serve_connection(server, addr(), Arc::clone(&storage), 10));

        let content = b"line one\nline two\n";
        let frame = ControlFrame::upload("notes.txt", content.len() as u64);
        client.write_all(frame.encode().as_bytes()).await.unwrap();
        assert_eq!(read_some(&mut client, 2).await, b"ok");

        client.write_all(content).await.unwrap();
        assert_eq!(read_some(&mut client, 2).await, b"ok");

        client
            .write_all(ControlFrame::Exit.encode().as_bytes())
            .await
            .unwrap();
        handle.await.unwrap().unwrap();

        let stored = std::fs::read(dir.path().join("storage").join("notes.txt")).unwrap();
        assert_eq!(stored, content);
    }

    #[tokio::test]
    async fn failed_store_aborts_and_session_continues() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("not-a-dir");
        std::fs::write(&root, b"occupied").unwrap();
        let storage = Arc::new(Storage::new(&root));
        let (mut client, server) = duplex(4096);

        let handle = tokio::spawn(serve_connection(server, addr(), storage, 10));

        let frame = ControlFrame::upload("a.txt", 3);
        client.write_all(frame.encode().as_bytes()).await.unwrap();
        assert_eq!(read_some(&mut client, 2).await, b"ok");

        client.write_all(b"abc").await.unwrap();
        assert_eq!(read_some(&mut client, 5).await, b"abort");

        // Back to idle: the next frame is decoded and answered.
        client.write_all(b"garbage").await.unwrap();
        assert_eq!(read_some(&mut client, 5).await, b"abort");

        client
            .write_all(ControlFrame::Exit.encode().as_bytes())
            .await
            .unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(std::fs::read(&root).unwrap(), b"occupied");
    }

    #[tokio::test]
    async fn download_sends_ok_size_and_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), b"hello").unwrap();
        let storage = Arc::new(Storage::new(dir.path()));
        let (mut client, server) = duplex(4096);

        let handle = tokio::spawn(serve_connection(server, addr(), storage, 10));

        let frame = ControlFrame::download("hello.txt");
        client.write_all(frame.encode().as_bytes()).await.unwrap();
        assert_eq!(read_some(&mut client, 2 + 2 + 5).await, b"ok5\nhello");

        client
            .write_all(ControlFrame::Exit.encode().as_bytes())
            .await
            .unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn missing_download_aborts_and_session_continues() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::new(dir.path()));
        let (mut client, server) = duplex(4096);

        let handle = tokio::spawn(serve_connection(server, addr(), storage, 10));

        let frame = ControlFrame::download("nope.txt");
        client.write_all(frame.encode().as_bytes()).await.unwrap();
        assert_eq!(read_some(&mut client, 5).await, b"abort");

        client.write_all(b"not a frame").await.unwrap();
        assert_eq!(read_some(&mut client, 5).await, b"abort");

        client
            .write_all(ControlFrame::Exit.encode().as_bytes())
            .await
            .unwrap();
        handle.await.unwrap().unwrap();

        // Nothing beyond the two aborts was written.
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}
