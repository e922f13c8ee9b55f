//! Client session (push/pull side).
//!
//! Opens one connection per operation and drives it through
//! request, transfer, acknowledge and teardown.

use std::path::{Path, PathBuf};

use greatwire_protocol::{ControlFrame, Response, classify_payload};
use greatwire_transfer::{unique_local_path, write_local};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::wire::{read_content, read_response, read_size, write_frame};

/// Where to connect and where downloads land.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Directory downloaded files are saved into.
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            download_dir: PathBuf::from("."),
        }
    }
}

/// Pushes local files to a server and pulls named files from it.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Sends the file at `path` to the server under its base name.
    ///
    /// Fails without connecting if `path` is not an existing regular file.
    /// Returns the number of bytes sent once the server confirmed receipt.
    pub async fn upload(&self, path: &Path) -> Result<u64, ClientError> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let (true, Some(filename)) = (is_file, filename) else {
            warn!(path = %path.display(), "file cannot be found");
            return Err(ClientError::FileNotFound(path.to_path_buf()));
        };

        let content = tokio::fs::read(path).await?;
        let mut conn = Connection::open(&self.config).await?;
        info!(path = %path.display(), size = content.len(), "sending file");

        let result = conn.upload(&filename, &content).await;
        match &result {
            Ok(()) => info!(%filename, "the file has been sent"),
            Err(e) => warn!(%filename, "the file has not been sent: {e}"),
        }

        conn.close().await;
        result.map(|()| content.len() as u64)
    }

    /// Fetches `filename` from the server into the download directory.
    ///
    /// Returns the local path the file was saved to, which carries one or
    /// more `(1) ` prefixes if the name was already taken.
    pub async fn download(&self, filename: &str) -> Result<PathBuf, ClientError> {
        let mut conn = Connection::open(&self.config).await?;

        let result = match conn.download(filename).await {
            Ok(content) => self.save(filename, content).await,
            Err(e) => Err(e),
        };
        if let Err(ClientError::NotFoundOnServer(_)) = &result {
            warn!(%filename, "the file cannot be found on the server");
        }

        conn.close().await;
        result
    }

    async fn save(&self, filename: &str, content: Vec<u8>) -> Result<PathBuf, ClientError> {
        let path = unique_local_path(&self.config.download_dir, filename).await?;
        let payload = classify_payload(content);
        write_local(&path, &payload).await?;
        info!(
            output = %path.display(),
            size = payload.len(),
            kind = payload.kind(),
            "the file has been downloaded successfully"
        );
        Ok(path)
    }
}

/// One open connection to the server.
struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    target: String,
}

impl Connection {
    async fn open(config: &ClientConfig) -> Result<Self, ClientError> {
        let target = format!("{}:{}", config.host, config.port);
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        let _ = stream.set_nodelay(true);
        info!(server = %target, "connected to server");

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            target,
        })
    }

    async fn upload(&mut self, filename: &str, content: &[u8]) -> Result<(), ClientError> {
        let frame = ControlFrame::upload(filename, content.len() as u64);
        write_frame(&mut self.writer, &frame).await?;

        match read_response(&mut self.reader).await {
            Ok(Response::Ok) => {}
            Ok(Response::Abort) | Err(ClientError::UnexpectedResponse(_)) => {
                return Err(ClientError::Rejected(filename.to_string()));
            }
            Err(e) => return Err(e),
        }

        self.writer.write_all(content).await?;
        self.writer.flush().await?;

        match read_response(&mut self.reader).await {
            Ok(Response::Ok) => Ok(()),
            Ok(Response::Abort) | Err(ClientError::UnexpectedResponse(_)) => {
                Err(ClientError::TransferIncomplete(filename.to_string()))
            }
            Err(ClientError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(ClientError::TransferIncomplete(filename.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn download(&mut self, filename: &str) -> Result<Vec<u8>, ClientError> {
        write_frame(&mut self.writer, &ControlFrame::download(filename)).await?;

        match read_response(&mut self.reader).await {
            Ok(Response::Ok) => {}
            Ok(Response::Abort) | Err(ClientError::UnexpectedResponse(_)) => {
                return Err(ClientError::NotFoundOnServer(filename.to_string()));
            }
            Err(e) => return Err(e),
        }

        info!(%filename, "start downloading");
        let size = read_size(&mut self.reader).await?;

        let mut last_decile = None;
        read_content(&mut self.reader, size, |tracker| {
            let decile = tracker.decile();
            if last_decile != Some(decile) {
                last_decile = Some(decile);
                info!(
                    %filename,
                    percent = tracker.percent().round() as u64,
                    "download in progress"
                );
            }
        })
        .await
    }

    /// Sends the teardown frame and closes the socket.
    ///
    /// Failures are logged: the operation's own outcome is already decided.
    async fn close(mut self) {
        let result = async {
            write_frame(&mut self.writer, &ControlFrame::Exit).await?;
            self.writer.shutdown().await?;
            Ok::<_, ClientError>(())
        }
        .await;

        match result {
            Ok(()) => info!(server = %self.target, "disconnected from server"),
            Err(e) => warn!(server = %self.target, "teardown failed: {e}"),
        }
    }
}
