use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::{GoogleBooksClient, OmdbClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, JwtAuthService, SeaOrmWatchedItemService, UserService, WatchedItemService,
};

pub mod auth;
mod error;
pub mod external;
mod types;
pub mod watched;

pub use error::ApiError;
pub use types::ApiResponse;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub user_service: Arc<UserService>,

    pub watched_service: Arc<dyn WatchedItemService>,

    pub omdb: OmdbClient,

    pub google_books: GoogleBooksClient,

    pub config: Config,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    create_app_state_with_store(config, store)
}

/// Split out so tests can hand in an in-memory store.
pub fn create_app_state_with_store(config: Config, store: Store) -> anyhow::Result<Arc<AppState>> {
    let auth_service: Arc<dyn AuthService> = Arc::new(JwtAuthService::new(
        store.clone(),
        &config.auth,
        config.security.clone(),
    ));

    let user_service = Arc::new(UserService::new(
        store.clone(),
        auth_service.clone(),
        config.security.clone(),
    ));

    let watched_service: Arc<dyn WatchedItemService> =
        Arc::new(SeaOrmWatchedItemService::new(store.clone()));

    let omdb = OmdbClient::new(&config.external)?;
    let google_books = GoogleBooksClient::new(&config.external)?;

    Ok(Arc::new(AppState {
        store,
        auth_service,
        user_service,
        watched_service,
        omdb,
        google_books,
        config,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route("/external/search/omdb", get(external::search_omdb))
        .route("/external/search/omdb-details", get(external::omdb_details))
        .route("/external/search/book", get(external::search_books))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/watched", post(watched::add_item))
        // One segment serves double duty: PUT/DELETE take an item id,
        // GET takes a user id
        .route(
            "/watched/{id}",
            put(watched::update_item)
                .delete(watched::delete_item)
                .get(watched::list_items),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
