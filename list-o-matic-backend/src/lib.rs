extern crate alloc;

pub mod access;
pub mod clock;
pub mod contribution;
pub mod error;
pub mod ids;
pub mod registry;
pub mod report;
pub mod routes;
pub mod time_distribution;

use core::convert::Infallible;
use core::future::Future;
use core::pin::Pin;
use std::sync::Arc;

use access::{AccessPolicy, ApiKeyPolicy};
use bytes::Bytes;
use error::AppError;
use http::{Request, Response};
use http_body::Body;
use http_body_util::{BodyExt as _, Full, LengthLimitError, Limited};
use hyper_util::rt::{TokioExecutor, TokioIo};
use list_o_matic_config::Config;
use list_o_matic_database::JsonFileStore;
use registry::Registry;
use routes::{AppResult, RouteContext};
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Requests with a larger body are rejected.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// The whole HTTP interface as a single hyper service.
#[derive(Clone)]
pub struct ListService {
    registry: Arc<Registry>,
    policy: Arc<dyn AccessPolicy>,
}

impl ListService {
    pub fn new(registry: Arc<Registry>, policy: Arc<dyn AccessPolicy>) -> Self {
        Self { registry, policy }
    }

    pub async fn handle<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        let response = match self.try_handle(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        };
        debug!(%method, %path, status = response.status().as_u16(), "handled request");
        response
    }

    async fn try_handle<B>(&self, request: Request<B>) -> AppResult
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let caller = self.policy.caller(&parts);
        let body = Limited::new(body, MAX_BODY_SIZE)
            .collect()
            .await
            .map_err(|err| {
                if err.downcast_ref::<LengthLimitError>().is_some() {
                    AppError::PayloadTooLarge
                } else {
                    AppError::BadRequest(format!("failed to read request body: {err}"))
                }
            })?
            .to_bytes();

        // registry operations block on locks and on writing the snapshot
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || {
            let cx = RouteContext {
                registry: &registry,
                caller,
                query: parts.uri.query(),
                body: &body,
            };
            routes::route(&parts.method, parts.uri.path(), &cx)
        })
        .await?
    }
}

impl<B> hyper::service::Service<Request<B>> for ListService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = Response<Full<Bytes>>;

    fn call(&self, request: Request<B>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(request).await) })
    }
}

/// Restores the registry from the configured snapshot and wires up the access policy.
pub fn setup_server(config: &Config) -> ListService {
    info!("starting up server...");

    let store = Arc::new(JsonFileStore::new(&config.database.talking_lists));
    let registry = Registry::load(store)
        .with_default_group_name(config.lists.default_group_name.clone());
    if config.authentication.admin_key_sha256.is_empty() {
        warn!("no admin keys configured, the protected routes are unreachable");
    }
    let policy = ApiKeyPolicy::new(&config.authentication.admin_key_sha256);

    ListService::new(Arc::new(registry), Arc::new(policy))
}

pub async fn run_server(
    config: Config,
) -> Result<impl Future<Output = Result<(), AppError>>, AppError> {
    let service = setup_server(&config);
    let listener = TcpListener::bind(config.server.address).await?;
    info!("listening on {}", listener.local_addr()?);
    Ok(serve(listener, service, shutdown_signal()))
}

/// Serves connections until `shutdown` completes, then waits for the open connections
/// to finish.
#[allow(clippy::cognitive_complexity, clippy::redundant_pub_crate)]
pub async fn serve(
    listener: TcpListener,
    service: ListService,
    shutdown: impl Future<Output = ()>,
) -> Result<(), AppError> {
    // tell the connections to shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let shutdown_tx = Arc::new(shutdown_tx);

    // wait for the connections to finish shutdown
    let (closed_tx, closed_rx) = watch::channel(());

    tokio::pin!(shutdown);

    loop {
        select! {
            accept = listener.accept() => {
                let (socket, remote_addr) = match accept {
                    Ok(accept) => accept,
                    Err(err) => {
                        error!("failed to accept connection: {err}");
                        continue;
                    }
                };
                debug!(%remote_addr, "accepted connection");

                let service = service.clone();
                let shutdown_tx = Arc::clone(&shutdown_tx);
                let closed_rx = closed_rx.clone();

                tokio::spawn(async move {
                    let socket = TokioIo::new(socket);
                    let builder = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());
                    let connection = builder.serve_connection(socket, service);
                    tokio::pin!(connection);

                    let connection_result = select! {
                        connection_result = connection.as_mut() => connection_result,
                        () = shutdown_tx.closed() => {
                            connection.as_mut().graceful_shutdown();
                            connection.await
                        }
                    };
                    if let Err(err) = connection_result {
                        error!("failed to serve connection: {err:#}");
                    }

                    drop(closed_rx);
                });
            }
            () = &mut shutdown => {
                warn!("shutting down");
                drop(shutdown_rx); // initiate shutdown
                drop(closed_rx);
                closed_tx.closed().await;
                break;
            }
        }
    }

    info!("stopped server");
    Ok(())
}

#[allow(clippy::redundant_pub_crate)]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            core::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {err}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
