use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::SchedulingService;
use booking_queue_cell::{BookingQueueError, EventQueue};
use patient_cell::{InMemoryPatientDirectory, PatientDirectory};
use shared_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling API server");

    let config = Arc::new(AppConfig::from_env());

    // Shared scheduling state
    let events = Arc::new(EventQueue::bounded(config.event_queue_capacity, config.event_journal_capacity));
    let directory: Arc<dyn PatientDirectory> = Arc::new(InMemoryPatientDirectory::new());
    let scheduling = Arc::new(SchedulingService::with_event_queue(
        &config,
        Arc::clone(&directory),
        Arc::clone(&events),
    ));
    tokio::spawn(log_scheduling_events(Arc::clone(&events)));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(Arc::clone(&config), scheduling, directory)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Drains the scheduling outbox into the log.
async fn log_scheduling_events(events: Arc<EventQueue>) {
    let mut subscriber = events.subscribe();
    loop {
        match subscriber.recv().await {
            Ok(event) => info!(
                event_id = %event.id,
                appointment_id = %event.appointment_id,
                kind = event.kind.name(),
                "Scheduling event"
            ),
            Err(BookingQueueError::Lagged { skipped }) => {
                warn!("Event log fell behind, skipped {} events", skipped);
            }
            Err(BookingQueueError::Closed) => break,
        }
    }
}
