use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use credit_core::{CreditError, ErrorKind, FinancialDataProvider};
use credit_orchestrator::{CreditEvaluator, FixtureProvider};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use yahoo_client::YahooFinanceClient;

pub mod config;
pub mod evaluate_routes;
pub mod request_id;

use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<CreditEvaluator>,
    pub max_batch_size: usize,
}

impl AppState {
    pub fn new(evaluator: CreditEvaluator, max_batch_size: usize) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            max_batch_size,
        }
    }
}

/// Error returned by handlers, rendered as `{"ticker": ..., "error": ...}`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    ticker: String,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            ticker: String::new(),
            error: error.into(),
        }
    }

    /// Validation failures are 400, data failures 422.
    pub fn for_ticker(ticker: impl Into<String>, error: CreditError) -> Self {
        let status = match error.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::DataRetrieval => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            ticker: ticker.into(),
            error: error.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} [{}]: {:#}", self.status, self.ticker, self.error);
        } else {
            tracing::warn!("{} [{}]: {}", self.status, self.ticker, self.error);
        }

        let body = json!({
            "ticker": self.ticker,
            "error": self.error.to_string(),
        });
        (self.status, Json(body)).into_response()
    }
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    AppError::with_status(
        StatusCode::INTERNAL_SERVER_ERROR,
        anyhow::anyhow!("internal server error"),
    )
    .into_response()
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(evaluate_routes::evaluate_routes())
        .with_state(state)
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
}

/// Pick the data provider from configuration and wire up the evaluator.
pub fn build_state(config: &ServerConfig) -> Result<AppState> {
    let provider: Arc<dyn FinancialDataProvider> = match &config.fixtures_path {
        Some(path) => {
            let fixtures = FixtureProvider::from_json_file(path)?;
            tracing::info!("Serving {} companies from fixtures at {}", fixtures.len(), path);
            Arc::new(fixtures)
        }
        None => {
            let mut client = YahooFinanceClient::new(config.provider_timeout);
            if let Some(base_url) = &config.yahoo_base_url {
                client = client.with_base_url(base_url.as_str());
            }
            tracing::info!("Using Yahoo Finance data provider");
            Arc::new(client)
        }
    };

    let evaluator = CreditEvaluator::new(provider).with_fetch_timeout(config.provider_timeout);
    Ok(AppState::new(evaluator, config.max_batch_size))
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

pub async fn run_server() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Starting credit risk API");
    tracing::info!("  Provider timeout: {}s", config.provider_timeout.as_secs());
    tracing::info!("  Max batch size: {}", config.max_batch_size);

    let state = build_state(&config)?;
    let app = app_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
