//! Listener: binds the configured address and spawns one task per connection.

use std::net::SocketAddr;
use std::sync::Arc;

use greatwire_protocol::{DEFAULT_BACKLOG, DEFAULT_MAX_EMPTY_READS};
use greatwire_transfer::Storage;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::connection::serve_connection;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host name or address to listen on.
    pub host: String,
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Pending-connection queue length passed to `listen`.
    pub backlog: u32,
    /// Consecutive empty reads tolerated on an idle connection.
    pub max_empty_reads: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            backlog: DEFAULT_BACKLOG,
            max_empty_reads: DEFAULT_MAX_EMPTY_READS,
        }
    }
}

/// The greatwire file server.
///
/// Accepts connections until [`shutdown`](Self::shutdown) is called. Sessions
/// already running are independent tasks and finish on their own.
pub struct Server {
    config: ServerConfig,
    storage: Arc<Storage>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Server {
    pub fn new(config: ServerConfig, storage: Storage) -> Arc<Self> {
        Arc::new(Self {
            config,
            storage: Arc::new(storage),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Stops the accept loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn bind(&self) -> Result<TcpListener, ServerError> {
        let target = format!("{}:{}", self.config.host, self.config.port);
        let addr = tokio::net::lookup_host(&target)
            .await?
            .next()
            .ok_or_else(|| ServerError::AddrResolve(target.clone()))?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        Ok(socket.listen(self.config.backlog)?)
    }

    /// Binds and runs the accept loop until shutdown.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let listener = self.bind().await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(
            storage = %self.storage.root().display(),
            "server listening on {local_addr}"
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("server shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => self.spawn_session(stream, peer_addr),
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let _ = stream.set_nodelay(true);
        let storage = Arc::clone(&self.storage);
        let max_empty_reads = self.config.max_empty_reads;

        tokio::spawn(async move {
            let result = serve_connection(stream, peer_addr, storage, max_empty_reads).await;
            if let Err(e) = result {
                tracing::error!(%peer_addr, "connection error: {e}");
            }
        });
    }
}
