use crate::{
    cli::{globals::GlobalArgs, telemetry},
    credentials::{Credentials, DocumentUsers, PasswordHasher},
    store::{DocumentStore, MemoryStore, PgStore},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{delete, get, post},
    Extension, Router,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod handlers;
pub mod openapi;

use self::handlers::{composers, customers, persons, teams, users};

/// DSN prefix that selects the in-process store.
pub const MEMORY_DSN_PREFIX: &str = "memory:";

/// Start the server
/// # Errors
/// Return error if the store cannot be opened or the server fails to start
pub async fn new(port: u16, globals: &GlobalArgs) -> Result<()> {
    let store = open_store(globals).await?;

    let app = router(store, globals.clone())?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry::shutdown_tracer();

    Ok(())
}

/// Open the document store named by the DSN.
///
/// # Errors
/// Returns an error if the database is unreachable or the schema cannot be applied.
pub async fn open_store(globals: &GlobalArgs) -> Result<Arc<dyn DocumentStore>> {
    let dsn = globals.dsn.expose_secret();

    if dsn.starts_with(MEMORY_DSN_PREFIX) {
        warn!("Using the in-memory store, documents are lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgStore::connect(dsn, globals.db_max_connections)
        .await
        .context("Failed to connect to database")?;

    Ok(Arc::new(store))
}

/// Build the application router over an opened store.
///
/// # Errors
/// Returns an error if the configured bcrypt cost is out of range.
pub fn router(store: Arc<dyn DocumentStore>, globals: GlobalArgs) -> Result<Router> {
    let hasher = PasswordHasher::new(globals.bcrypt_cost)?;
    let credentials = Credentials::new(Arc::new(DocumentUsers::new(store.clone())), hasher);

    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any);

    let app = Router::new()
        .route("/", get(|| async { "🌱" }))
        .route("/api/signup", post(users::signup))
        .route("/api/login", post(users::login))
        .route(
            "/api/composers",
            get(composers::find_all_composers).post(composers::create_composer),
        )
        .route(
            "/api/composers/:id",
            get(composers::find_composer_by_id)
                .put(composers::update_composer_by_id)
                .delete(composers::delete_composer_by_id),
        )
        .route(
            "/api/persons",
            get(persons::find_all_persons).post(persons::create_person),
        )
        .route(
            "/api/teams",
            get(teams::find_all_teams).post(teams::create_team),
        )
        .route("/api/teams/:id", delete(teams::delete_team_by_id))
        .route(
            "/api/teams/:id/players",
            get(teams::find_all_players_by_team_id).post(teams::assign_player_to_team),
        )
        .route("/api/customers", post(customers::create_customer))
        .route(
            "/api/customers/:username/invoices",
            get(customers::find_all_invoices_by_username)
                .post(customers::create_invoice_by_username),
        )
        .merge(SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", openapi::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(credentials))
                .layer(Extension(globals))
                .layer(Extension(store.clone())),
        )
        .route(
            "/health",
            get(handlers::health).options(handlers::health),
        )
        .layer(Extension(store));

    Ok(app)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_dsn_opens_memory_store() -> Result<()> {
        let globals = GlobalArgs::new("memory://".to_string());
        let store = open_store(&globals).await?;
        store.ping().await?;
        Ok(())
    }

    #[test]
    fn router_rejects_out_of_range_cost() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let globals = GlobalArgs::new("memory://".to_string()).with_bcrypt_cost(3);
        assert!(router(store, globals).is_err());
    }
}
