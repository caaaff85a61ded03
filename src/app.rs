use axum::{
    extract::{DefaultBodyLimit, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::database::models::{Certificate, Product, Project};
use crate::handlers::{auth, catalog, certificates, contact, products, projects, users};
use crate::middleware::{login_rate_limit, require_admin, require_auth};
use crate::state::AppState;
use crate::upload::{CERTIFICATE_FORM, PRODUCT_FORM, PROJECT_FORM};

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes(&state))
        .merge(catalog_routes())
        .merge(contact_routes())
        // Admin only
        .merge(admin_routes(&state))
        // Global middleware
        .layer(cors_layer(&state.config.security));

    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    let login = if state.config.api.enable_rate_limiting {
        post(auth::login).layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ))
    } else {
        post(auth::login)
    };

    Router::new()
        .route("/api/auth/login", login)
        .route("/api/auth/test", get(auth::test))
        // Bootstrap refuses once an admin exists
        .route("/api/users/admin", post(users::create_admin))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(catalog::list::<Product>))
        .route("/api/products/:id", get(catalog::get::<Product>))
        .route("/api/projects", get(catalog::list::<Project>))
        .route("/api/projects/:id", get(catalog::get::<Project>))
        .route("/api/certificates", get(catalog::list::<Certificate>))
        .route("/api/certificates/:id", get(catalog::get::<Certificate>))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/products",
            post(products::create).layer(DefaultBodyLimit::max(PRODUCT_FORM.body_limit())),
        )
        .route(
            "/api/products/:id",
            put(products::update)
                .layer(DefaultBodyLimit::max(PRODUCT_FORM.body_limit()))
                .delete(catalog::delete::<Product>),
        )
        .route(
            "/api/projects",
            post(projects::create).layer(DefaultBodyLimit::max(PROJECT_FORM.body_limit())),
        )
        .route(
            "/api/projects/:id",
            put(projects::update)
                .layer(DefaultBodyLimit::max(PROJECT_FORM.body_limit()))
                .delete(catalog::delete::<Project>),
        )
        .route(
            "/api/certificates",
            post(certificates::create)
                .layer(DefaultBodyLimit::max(CERTIFICATE_FORM.body_limit())),
        )
        .route(
            "/api/certificates/:id",
            axum::routing::delete(catalog::delete::<Certificate>),
        )
        // route_layer runs bottom-up: authenticate, then check the role
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/api/contact", post(contact::submit))
        // Path used by older website builds
        .route("/api/contract", post(contact::submit))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring malformed CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "JSP API",
            "version": version,
            "description": "Catalog, contact form and admin backend for the JSP website",
            "endpoints": {
                "auth": "/api/auth/login, /api/users/admin (public)",
                "products": "/api/products[/:id] (GET public, writes admin)",
                "projects": "/api/projects[/:id] (GET public, writes admin)",
                "certificates": "/api/certificates[/:id] (GET public, writes admin)",
                "contact": "/api/contact (public)",
                "health": "/health (public)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let result = match &state.database {
        Some(db) => db.health_check().await.map_err(|e| e.to_string()),
        None => Err("database not configured".to_string()),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "environment": state.config.environment,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "environment": state.config.environment,
                        "database_error": e
                    }
                })),
            )
        }
    }
}
