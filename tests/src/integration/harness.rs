//! Shared fixtures for the integration scenarios.

use parking_lot::Mutex;
use portcullis_server::Server;
use portcullis_transport_mem::{pair, MemConnector, MemPeer};
use portcullis_types::{Authenticator, RpcError};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber once per test binary; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Records everything a server's error sink receives.
#[derive(Clone, Default)]
pub struct SinkRecorder {
    errors: Arc<Mutex<Vec<RpcError>>>,
}

impl SinkRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler suitable for `Server::set_error_handler`.
    pub fn handler(&self) -> impl Fn(RpcError) + Send + Sync + 'static {
        let errors = Arc::clone(&self.errors);
        move |error| errors.lock().push(error)
    }

    pub fn count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Vec<RpcError> {
        std::mem::take(&mut *self.errors.lock())
    }
}

/// Spawns the server onto a fresh in-memory listener, returning the shared
/// handle and the connector for clients.
pub fn spawn_server<A>(server: Server<A>) -> (Arc<Server<A>>, MemConnector)
where
    A: Authenticator<Peer = MemPeer> + 'static,
{
    let (listener, connector) = pair();
    let server = Arc::new(server);
    tokio::spawn(Arc::clone(&server).serve(listener));
    (server, connector)
}

/// Polls `condition` until it holds or `deadline` passes.
pub async fn eventually(deadline: Duration, condition: impl Fn() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
