//! Alert relay binary entrypoint.
//!
//! Serves the Grafana webhook and runs the single delivery worker that posts
//! queued alerts to the configured Matrix room.

use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use relay_common::config::AppConfig;
use relay_notifier::matrix::MatrixClient;
use relay_notifier::queue::DeliveryQueue;
use relay_notifier::session::{Credentials, Session};
use relay_notifier::worker::{DeliveryWorker, WorkerConfig};

use relay_api::routes::create_router;
use relay_api::state::AppState;

/// Largest accepted webhook body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting alert relay...");

    // Missing credentials stop start-up before the worker ever tries to log in
    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    let client = MatrixClient::new(&config.matrix_homeserver, config.matrix_request_timeout())?;
    let session = Session::new(
        client,
        Credentials::new(config.matrix_user.clone(), config.matrix_password.clone()),
    );

    let queue = DeliveryQueue::new();
    let worker_config = WorkerConfig::new(config.matrix_room_id.clone())
        .with_retry_backoff(config.retry_backoff())
        .with_poll_interval(config.poll_interval());
    let worker = DeliveryWorker::new(session, queue.clone(), worker_config);
    tokio::spawn(worker.run());

    let app = create_router(AppState::new(queue))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        homeserver = %config.matrix_homeserver,
        room_id = %config.matrix_room_id,
        "Webhook listener ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Alert relay stopped, undelivered alerts discarded.");
    Ok(())
}

/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("relay_api=debug,relay_notifier=debug,tower_http=debug")
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
