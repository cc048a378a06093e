use anyhow::Context;
use rail_api::{app, AppState, AuthConfig};
use rail_booking::{BookingPolicy, BookingService};
use rail_core::payment::SimulatedGateway;
use rail_core::repository::BookingStore;
use rail_store::app_config::{Config, StorageBackend};
use rail_store::seed::seed_demo_trains;
use rail_store::{DbClient, MemoryStore, PgStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rail_api=debug,rail_booking=debug,rail_store=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Rail API on port {}", config.server.port);

    let lock_timeout = config.booking.lock_timeout();
    let store: Arc<dyn BookingStore> = match config.storage.backend {
        StorageBackend::Memory => {
            let store = MemoryStore::new(lock_timeout);
            if config.storage.seed_demo_data {
                seed_demo_trains(&store).await.context("Failed to seed demo trains")?;
            }
            Arc::new(store)
        }
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            let store = PgStore::new(&db, lock_timeout);
            if config.storage.seed_demo_data {
                seed_demo_trains(&store).await.context("Failed to seed demo trains")?;
            }
            Arc::new(store)
        }
    };
    tracing::info!("Using {:?} storage", config.storage.backend);

    let bookings = BookingService::new(
        store,
        Arc::new(SimulatedGateway::approving()),
        BookingPolicy {
            pnr_attempts: config.booking.pnr_attempts,
            currency: config.booking.currency.clone(),
        },
    );

    // Log committed booking changes
    let mut events = bookings.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!("Booking event for {}: {:?}", event.pnr(), event);
        }
    });

    let app_state = AppState {
        bookings: Arc::new(bookings),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
