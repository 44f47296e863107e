//! Application wiring: storage backend selection, router, and server lifecycle.

use crate::config::{BookingConfig, StorageBackend};
use crate::handlers::{self, bookings, rooms};
use crate::middleware::{auth_middleware, JwtVerifier};
use crate::services::{
    BookingManager, BookingStore, InMemoryBookingStore, InMemoryRoomStore,
    MongoBookingRepository, MongoRoomRepository, RoomStore, StripeClient, SystemClock,
};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub manager: BookingManager,
    pub rooms: Arc<dyn RoomStore>,
    pub jwt: JwtVerifier,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/bookings",
            get(bookings::list_all_bookings).post(bookings::create_booking),
        )
        .route("/bookings/user", get(bookings::list_user_bookings))
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .delete(bookings::cancel_booking),
        )
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/rooms/:id", get(rooms::get_room))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .merge(protected)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
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
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

async fn connect_mongo(config: &BookingConfig) -> Result<mongodb::Database, AppError> {
    let mut client_options = ClientOptions::parse(config.mongodb.uri.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
    client_options.app_name = Some(config.service_name.clone());

    let client = Client::with_options(client_options).map_err(|e| {
        tracing::error!("Failed to create MongoDB client: {}", e);
        AppError::from(e)
    })?;

    tracing::info!(database = %config.mongodb.database, "Connected to MongoDB");
    Ok(client.database(&config.mongodb.database))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: BookingConfig) -> Result<Self, AppError> {
        let (bookings, rooms): (Arc<dyn BookingStore>, Arc<dyn RoomStore>) = match config.storage
        {
            StorageBackend::Mongodb => {
                let db = connect_mongo(&config).await?;

                let bookings = MongoBookingRepository::new(&db);
                let rooms = MongoRoomRepository::new(&db);
                bookings.init_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize booking indexes: {}", e);
                    AppError::DatabaseError(e)
                })?;
                rooms.init_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize room indexes: {}", e);
                    AppError::DatabaseError(e)
                })?;

                (Arc::new(bookings), Arc::new(rooms))
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage - data is lost on restart");
                (
                    Arc::new(InMemoryBookingStore::new()),
                    Arc::new(InMemoryRoomStore::new()),
                )
            }
        };

        let stripe = StripeClient::new(config.stripe.clone());
        if stripe.is_configured() {
            tracing::info!("Stripe client initialized");
        } else {
            tracing::warn!("Stripe credentials not configured - card payments will be rejected");
        }

        let manager = BookingManager::new(
            bookings,
            rooms.clone(),
            Arc::new(stripe),
            Arc::new(SystemClock),
            config.currency.clone(),
        );

        let state = AppState {
            jwt: JwtVerifier::new(&config.auth.jwt_secret),
            manager,
            rooms,
        };

        // Port 0 picks a random port, which tests rely on.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, storage = ?config.storage, "Booking service ready");

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
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
