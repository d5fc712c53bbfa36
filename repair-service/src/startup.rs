//! Application startup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, patch, put},
    Router,
};
use repair_core::error::AppError;
use repair_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::{DatabaseBackend, RepairConfig};
use crate::handlers;
use crate::middleware::TenantContext;
use crate::services::{JobService, MemoryStore, MongoStore, PaymentLedger, RecordStore, TenantStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RepairConfig,
    pub store: Arc<dyn RecordStore>,
    pub jobs: JobService,
    pub ledger: PaymentLedger,
}

impl AppState {
    pub fn new(config: RepairConfig, store: Arc<dyn RecordStore>) -> Self {
        let retry = config.reconcile.retry_policy();
        Self {
            config,
            store,
            jobs: JobService::new(retry),
            ledger: PaymentLedger::new(retry),
        }
    }

    /// Store view restricted to the caller's organization.
    pub fn scoped(&self, tenant: &TenantContext) -> TenantStore {
        TenantStore::new(self.store.clone(), tenant.org_id.clone())
    }
}

async fn connect_store(config: &RepairConfig) -> Result<Arc<dyn RecordStore>, AppError> {
    match config.database.backend {
        DatabaseBackend::Mongo => {
            let store = MongoStore::connect(
                config.database.uri.expose_secret(),
                &config.database.name,
            )
            .await?;
            store.initialize_indexes().await?;
            Ok(Arc::new(store))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/customers/:id", put(handlers::customers::update_customer))
        .route(
            "/technicians",
            get(handlers::technicians::list_technicians)
                .post(handlers::technicians::create_technician),
        )
        .route(
            "/technicians/:id",
            put(handlers::technicians::update_technician),
        )
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/:id",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route(
            "/shops",
            get(handlers::shops::list_shops).post(handlers::shops::create_shop),
        )
        .route("/shops/:id", put(handlers::shops::update_shop))
        .route(
            "/parts",
            get(handlers::parts::list_parts).post(handlers::parts::create_part),
        )
        .route("/parts/:id", put(handlers::parts::update_part))
        .route(
            "/jobs",
            get(handlers::jobs::list_jobs).post(handlers::jobs::create_job),
        )
        .route(
            "/jobs/:id",
            get(handlers::jobs::get_job).put(handlers::jobs::update_job),
        )
        .route("/jobs/:id/status", patch(handlers::jobs::update_job_status))
        .route(
            "/payments",
            get(handlers::payments::list_payments).post(handlers::payments::create_payment),
        )
        .route("/payments/:id", put(handlers::payments::update_payment))
        .route(
            "/expenses",
            get(handlers::expenses::list_expenses).post(handlers::expenses::create_expense),
        )
        .route("/expenses/:id", put(handlers::expenses::update_expense))
        .route("/dashboard", get(handlers::dashboard::get_dashboard));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api", api)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    org_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        // Outermost, so the trace span above already sees the request id.
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the store selected by configuration.
    pub async fn build(config: RepairConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Build the application on a caller-provided store.
    pub async fn build_with_store(
        config: RepairConfig,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, AppError> {
        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, backend = ?config.database.backend, "Repair service bound");

        let router = router(AppState::new(config, store));
        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
