// Copyright 2025 Remi Bernotavicius

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::database;
use auth::TokenIssuer;
use error::AppError;

pub mod auth;
pub mod categories;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod recipes;
pub mod responses;
pub mod search;
pub mod users;

#[cfg(test)]
mod tests;

pub struct AppState {
    pool: database::Pool,
    tokens: TokenIssuer,
}

impl AppState {
    fn new(pool: database::Pool, tokens: TokenIssuer) -> Self {
        Self { pool, tokens }
    }

    /// Run a database closure on the blocking pool. Diesel's sqlite driver is
    /// synchronous, so queries must not run on the async executor.
    async fn db<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut database::Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/categories/", get(categories::list))
        .route("/categories/:slug/", get(categories::detail))
        .route("/categories/:slug/recipes/", get(categories::recipes))
        .route("/recipes/", get(recipes::list).post(recipes::create))
        .route("/recipes/search/", get(search::search))
        .route(
            "/recipes/:id/",
            get(recipes::detail)
                .put(recipes::update)
                .patch(recipes::update)
                .delete(recipes::remove),
        )
        .route("/recipes/:id/rate/", post(recipes::rate))
        .route("/recipes/:id/comments/", post(recipes::comment))
        .route("/auth/register/", post(users::register))
        .route("/auth/login/", post(users::login))
        .route("/auth/token/refresh/", post(users::refresh))
        .route("/auth/user/", get(users::me))
        .route(
            "/auth/user/update/",
            put(users::update_me).patch(users::update_me),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(config: Config) -> crate::Result<()> {
    let pool = database::build_pool(&config.database_path)?;
    let tokens = TokenIssuer::new(
        &config.jwt_secret,
        config.access_token_minutes,
        config.refresh_token_days,
    );
    let state = Arc::new(AppState::new(pool, tokens));

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("listening on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install ctrl-c handler");
        info!("received ctrl-c, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
