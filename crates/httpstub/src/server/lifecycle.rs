//! Server lifecycle: bind, serve, drain, verify.

use crate::error::StubError;
use crate::expectation::{ExpectationRegistry, RequestDescriptor, ResponseDescriptor};
use crate::server::handler::handle_request;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// A running stub server bound to a loopback port.
///
/// Register expectations with [`expect`](Self::expect), point the code under
/// test at [`base_url`](Self::base_url), then call
/// [`shutdown`](Self::shutdown): it drains in-flight requests and runs the
/// teardown verification, so a forgotten expectation or an unanticipated
/// request fails the invoking test.
///
/// ```no_run
/// # use httpstub::{RequestDescriptor, ResponseDescriptor, StubServer};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = StubServer::start().await?;
/// server.expect(
///     RequestDescriptor::get("/health").build()?,
///     ResponseDescriptor::ok().body("up").build(),
/// );
/// // exercise code under test against server.base_url() ...
/// server.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct StubServer {
    registry: Arc<ExpectationRegistry>,
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl StubServer {
    /// Bind an unused loopback port and start serving.
    pub async fn start() -> Result<Self, StubError> {
        Self::start_on(SocketAddr::from(([127, 0, 0, 1], 0))).await
    }

    /// Bind the given address and start serving. Bind failure is fatal and
    /// never retried.
    pub async fn start_on(addr: SocketAddr) -> Result<Self, StubError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StubError::Setup { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| StubError::Setup { addr, source })?;

        let registry = Arc::new(ExpectationRegistry::new());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&registry), shutdown_rx));

        info!("stub server listening on {local_addr}");
        Ok(Self {
            registry,
            local_addr,
            shutdown_tx,
            accept_task,
        })
    }

    /// Register an expectation. Normally called during test setup, but safe
    /// to call while traffic is in flight.
    pub fn expect(&self, request: RequestDescriptor, response: ResponseDescriptor) {
        self.registry.add_expectation(request, response);
    }

    /// `http://localhost:<port>` for the bound port.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.local_addr.port())
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// The registry backing this server, for direct inspection.
    pub fn registry(&self) -> Arc<ExpectationRegistry> {
        Arc::clone(&self.registry)
    }

    /// Stop accepting connections, drain in-flight requests, then verify.
    ///
    /// Verification runs `check_no_unexpected_requests` before
    /// `check_all_expectations_met`: an unexpected request is usually the
    /// root cause of a leftover expectation, so it surfaces first and the
    /// second check is skipped. Consuming `self` makes a second shutdown
    /// unrepresentable.
    pub async fn shutdown(self) -> Result<(), StubError> {
        // The accept loop may already be gone if its task panicked.
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.accept_task.await {
            error!("accept loop failed: {err}");
        }

        self.registry.check_no_unexpected_requests()?;
        self.registry.check_all_expectations_met()?;
        Ok(())
    }
}

/// Accept connections until the shutdown signal, then drain.
///
/// Each connection is watched by a [`GracefulShutdown`]; on shutdown, open
/// connections get a final keep-alive refusal and the loop returns only once
/// every in-flight request has completed.
async fn accept_loop(
    listener: TcpListener,
    registry: Arc<ExpectationRegistry>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, remote_addr)) => {
                    let registry = Arc::clone(&registry);
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| {
                        let registry = Arc::clone(&registry);
                        handle_request(req, registry)
                    });
                    let conn = graceful.watch(http1::Builder::new().serve_connection(io, service));
                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            debug!("connection error from {remote_addr}: {err}");
                        }
                    });
                }
                Err(err) => {
                    error!("accept error: {err}");
                }
            },
            _ = shutdown_rx.recv() => break,
        }
    }

    // Stop accepting, then wait for in-flight requests to finish.
    drop(listener);
    graceful.shutdown().await;
    debug!("stub server drained");
}
