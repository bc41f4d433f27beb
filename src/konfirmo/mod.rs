pub mod email;
pub mod handlers;

use crate::cli::globals::GlobalArgs;
use crate::identity::{HttpIdentityProvider, IdentityProvider};
use crate::otp::{
    store::OtpStore,
    sweep::{Sweeper, SWEEP_PERIOD},
};
use anyhow::Result;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use email::{Mailer, SmtpMailer};
use handlers::rate_limit::{rate_limit, FixedWindowLimiter};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// Per-request settings shared with the handlers.
#[derive(Clone, Copy, Debug)]
pub struct ApiConfig {
    pub otp_expiry_minutes: u64,
}

/// Build the router with all routes, middleware, and shared state.
#[must_use]
pub fn app(
    store: Arc<OtpStore>,
    identity: Arc<dyn IdentityProvider>,
    mailer: Arc<dyn Mailer>,
    limiter: Arc<FixedWindowLimiter>,
    config: Arc<ApiConfig>,
    cors: CorsLayer,
) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/send-otp", post(handlers::send_otp))
        .route("/api/verify-otp", post(handlers::verify_otp))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(Extension(limiter))
                .layer(middleware::from_fn(rate_limit))
                .layer(Extension(store))
                .layer(Extension(identity))
                .layer(Extension(mailer))
                .layer(Extension(config)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let mailer = SmtpMailer::new(globals)?;

    // Probe the SMTP transport once; a failure is logged, not fatal
    match mailer.verify_connection().await {
        Ok(()) => info!("SMTP connection established"),
        Err(err) => error!("SMTP connection error: {err}"),
    }

    let identity = HttpIdentityProvider::new(globals)?;

    let store = Arc::new(OtpStore::new());

    // Runs for the process lifetime
    let _sweeper = Sweeper::spawn(store.clone(), SWEEP_PERIOD);

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(AllowOrigin::exact(
            globals.allowed_origin.parse::<HeaderValue>()?,
        ))
        .allow_credentials(true);

    let config = Arc::new(ApiConfig {
        otp_expiry_minutes: globals.otp_expiry_minutes,
    });

    let app = app(
        store,
        Arc::new(identity),
        Arc::new(mailer),
        Arc::new(FixedWindowLimiter::new()),
        config,
        cors,
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("listening on port {port}");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
