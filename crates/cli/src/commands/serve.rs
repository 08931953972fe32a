use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use sitedrop_core::{RelayConfig, UploadForm};
use sitedrop_deployer::{DeployError, Relay, VercelClient};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

#[derive(Clone)]
struct AppState {
    relay: Arc<Relay>,
}

/// Command-line overrides for `serve`
pub struct ServeOptions {
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub public: Option<PathBuf>,
}

/// Error body returned to clients
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Start the deploy relay.
///
/// Loads configuration (file, then environment, then flags), builds the
/// Vercel client and serves until Ctrl+C or SIGTERM.
pub async fn run(options: ServeOptions) -> Result<()> {
    let mut config = super::load_config(options.config.as_deref())?;
    if let Some(port) = options.port {
        config.port = port;
    }
    if let Some(public) = options.public {
        config.public_dir = public;
    }

    let provider = VercelClient::new(&config.provider).context("Failed to create Vercel client")?;
    let relay = Relay::new(Arc::new(provider), &config);

    if config.default_token().is_none() {
        warn!("VERCEL_TOKEN not set; every request must supply its own token");
    }
    if !config.public_dir.is_dir() {
        info!(
            public_dir = %config.public_dir.display(),
            "frontend directory not found, serving API only"
        );
    }

    let app = router(Arc::new(relay), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to port {}", config.port))?;

    info!(%addr, "Server ready on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

/// Build the relay router: `/deploy`, `/health`, and the static frontend
fn router(relay: Arc<Relay>, config: &RelayConfig) -> Router {
    let mut app = Router::new()
        .route("/deploy", post(deploy_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(AppState { relay });

    if config.public_dir.is_dir() {
        app = app.fallback_service(ServeDir::new(&config.public_dir));
    }

    app.layer(TraceLayer::new_for_http())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Deploy an uploaded page. Every outcome becomes a JSON response.
async fn deploy_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let form = match multipart {
        Ok(multipart) => read_upload(multipart)
            .await
            .map_err(|e| (e.status(), e.body_text())),
        Err(rejection) => Err((rejection.status(), rejection.body_text())),
    };

    let form = match form {
        Ok(form) => form,
        Err((status, message)) => {
            warn!(%status, error = %message, "rejected upload");
            return error_response(status, format!("Invalid multipart body: {}", message), None);
        }
    };

    match state.relay.handle(form).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, e.to_string(), None),
        Err(e) => deploy_failed(e),
    }
}

fn deploy_failed(err: DeployError) -> Response {
    let details = err.details();
    error!(error = %err, details = %details, "deploy error");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Deployment failed".to_string(),
        Some(details),
    )
}

fn error_response(status: StatusCode, error: String, details: Option<Value>) -> Response {
    (status, Json(ErrorResponse { error, details })).into_response()
}

/// Collect the `file`, `siteName` and `token` fields; others are ignored.
///
/// Only a part with a filename counts as the uploaded file.
async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if field.file_name().is_some() => {
                form.file = Some(field.bytes().await?.to_vec());
            }
            Some("siteName") => form.site_name = Some(field.text().await?),
            Some("token") => form.token = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, shutting down");
        }
        () = terminate => {
            info!("received SIGTERM, shutting down");
        }
    }
}
