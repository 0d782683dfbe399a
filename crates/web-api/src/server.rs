use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/conversion-rates", get(handlers::list_rates))
            .route("/api/conversion-rates/refresh", post(handlers::refresh_rates))
            .route("/api/conversion-rates/:network", put(handlers::put_rate))
            .route("/api/network-rewards", get(handlers::list_rewards))
            .route("/api/network-rewards", post(handlers::create_reward))
            .route("/api/network-rewards/:id", put(handlers::update_reward))
            .route("/api/network-rewards/:id", delete(handlers::delete_reward))
            .route("/api/tiers", get(handlers::list_tiers))
            .route("/api/tiers/:tier/price", get(handlers::tier_price))
            .route(
                "/api/users/:user_id/tiers/:tier/price",
                get(handlers::user_tier_price),
            )
            .route(
                "/api/users/:user_id/levels/:level/graph",
                get(handlers::user_level_graph),
            )
            .route(
                "/api/users/:user_id/levels/:level/watched",
                post(handlers::mark_animation_watched),
            )
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
