use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum_server::tls_rustls::RustlsConfig;
use chrono::TimeDelta;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::database::Store;

mod config;
mod database;
mod endpoints;
mod error;
mod grouping;
mod model;
mod scoring;
mod security;

const OK_JSON: &str = r#"{ "message": "OK" }"#;

/// Shared by every handler and middleware layer.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub session_ttl: TimeDelta,
}

/// Only the configured front-end origin may call the API, with credentials.
fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, String> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| format!("Invalid allowed_origin '{allowed_origin}': {e}"))?;

    Ok(CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true))
}

fn router(state: AppState, cors: CorsLayer) -> Router {
    // Each group of routes carries its own auth layer; `route_layer` keeps the
    // layer off routes merged in from the other groups.
    let teacher = Router::new()
        .route("/api/groups/validate", post(endpoints::teacher::check_group))
        .route("/api/assignments", post(endpoints::teacher::create_assignment))
        .route(
            "/api/assignments/{id}/evaluate",
            put(endpoints::teacher::evaluate_assignment),
        )
        .route("/api/statistics", get(endpoints::teacher::statistics))
        .route_layer(from_fn_with_state(
            state.clone(),
            security::handle_teacher_auth,
        ));

    let student = Router::new()
        .route(
            "/api/assignments/closed-with-average",
            get(endpoints::student::closed_with_average),
        )
        .route(
            "/api/assignments/{id}/answer",
            put(endpoints::student::submit_answer),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            security::handle_student_auth,
        ));

    // Accessible by every authenticated user
    let user = Router::new()
        .route(
            "/api/sessions/current",
            get(endpoints::current_session).delete(endpoints::logout),
        )
        .route("/api/students", get(endpoints::list_students))
        .route("/api/assignments", get(endpoints::list_assignments))
        .route("/api/assignments/open", get(endpoints::list_open_assignments))
        .route("/api/assignments/{id}", get(endpoints::get_assignment))
        .route_layer(from_fn_with_state(state.clone(), security::handle_basic_auth));

    Router::new()
        .route("/api/sessions", post(endpoints::login))
        .merge(teacher)
        .merge(student)
        .merge(user)
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    // Begin logging. The level was checked when the config was loaded.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level().unwrap_or(tracing::Level::INFO))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install the log subscriber: {e}");
        return;
    }

    let cors = match cors_layer(&config.allowed_origin) {
        Ok(cors) => cors,
        Err(e) => {
            tracing::error!("{e}");
            return;
        }
    };

    // Initialize the database, aborting start-up if an error occurs
    let store = match database::init_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("{e}");
            return;
        }
    };
    info!("Store ready ({:?} backend)", config.database.backend);

    let app = router(
        AppState {
            store,
            session_ttl: config.session_ttl(),
        },
        cors,
    );

    let addr = match config.listen_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("{e}");
            return;
        }
    };

    let served = match &config.tls {
        Some(tls) => {
            if rustls::crypto::aws_lc_rs::default_provider()
                .install_default()
                .is_err()
            {
                tracing::warn!("A rustls crypto provider was already installed");
            }

            let tls_config =
                match RustlsConfig::from_pem_file(&tls.certificate, &tls.private_key).await {
                    Ok(tls_config) => tls_config,
                    Err(e) => {
                        tracing::error!("Could not load the TLS certificate: {e}");
                        return;
                    }
                };

            info!("Listening on https://{addr}");
            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
        }
        None => {
            info!("Listening on http://{addr}");
            axum_server::bind(addr).serve(app.into_make_service()).await
        }
    };

    if let Err(e) = served {
        tracing::error!("Server stopped: {e}");
    }
}
