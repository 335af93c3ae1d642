use crate::config::ServerConfig;
use crate::handler::ConnectionHandler;
use crate::store::SampleStore;
use crate::{ImuError, Result};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

/// First pause after a failed accept; doubles up to [`ACCEPT_BACKOFF_MAX`].
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// A bound listener plus the retention buffer its connections share.
///
/// Each accepted connection runs its own [`ConnectionHandler`] on a
/// dedicated thread; a failure in one never touches the others.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    store: SampleStore,
    config: ServerConfig,
    epoch: Instant,
}

impl Server {
    /// Bind the listening socket and start the sample store.
    ///
    /// Bind failures (address in use, permission denied) are returned as
    /// [`ImuError::Bind`].
    pub fn bind(config: ServerConfig) -> Result<Server> {
        let addr = config.addr();
        let listener = TcpListener::bind(&addr).map_err(|source| ImuError::Bind {
            addr: addr.clone(),
            source,
        })?;
        let store = SampleStore::spawn(config.buffer_capacity)?;

        log::info!(
            "Listening on {} (buffer capacity {})",
            listener.local_addr()?,
            config.buffer_capacity
        );

        Ok(Server {
            listener,
            store,
            config,
            epoch: Instant::now(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared retention buffer.
    pub fn store(&self) -> SampleStore {
        self.store.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections forever, one thread per client.
    ///
    /// Only returns if the listener itself stops yielding connections.
    pub fn serve(self) -> Result<()> {
        let mut backoff = AcceptBackoff::new();

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(s) => {
                    backoff.reset();
                    s
                }
                Err(e) => {
                    // Out of descriptors (EMFILE) fails every accept until a
                    // connection closes; don't spin on it.
                    let wait = backoff.failed();
                    log::warn!("Accept error: {} (retrying in {:?})", e, wait);
                    std::thread::sleep(wait);
                    continue;
                }
            };

            if let Err(e) = self.dispatch(stream) {
                log::error!("Failed to start connection handler: {}", e);
            }
        }
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream) -> Result<()> {
        let peer = stream.peer_addr()?;
        let mut handler =
            ConnectionHandler::new(peer, self.store(), self.epoch, self.config.idle_timeout);

        std::thread::Builder::new()
            .name(format!("imu-conn-{}", peer))
            .spawn(move || {
                // The handler logs every way a connection can end.
                let _ = handler.run(stream);
            })?;
        Ok(())
    }
}

/// Pause schedule for consecutive accept failures.
#[derive(Debug)]
struct AcceptBackoff {
    next: Duration,
}

impl AcceptBackoff {
    fn new() -> Self {
        Self {
            next: ACCEPT_BACKOFF_MIN,
        }
    }

    /// Pause to apply now; the following failure waits twice as long.
    fn failed(&mut self) -> Duration {
        let wait = self.next;
        self.next = (self.next * 2).min(ACCEPT_BACKOFF_MAX);
        wait
    }

    fn reset(&mut self) {
        self.next = ACCEPT_BACKOFF_MIN;
    }
}

/// Bind `host:port` with default settings and serve forever.
pub fn serve(host: &str, port: u16) -> Result<()> {
    Server::bind(ServerConfig::new(host, port))?.serve()
}
