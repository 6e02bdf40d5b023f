//! Administrative API.
//!
//! | Operation | Route |
//! |---|---|
//! | status | `GET /admin/status` |
//! | list | `GET /admin/nodes` |
//! | add_node | `POST /admin/nodes` |
//! | remove_node | `DELETE /admin/nodes/{name}` |
//! | remove_node_by_sequence | `DELETE /admin/nodes/seq/{seq}` |
//! | probe_node | `POST /admin/probe` |
//! | notify_coordinator | `POST /admin/notify` |

pub mod auth;
pub mod handlers;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::KeeperConfig;
use crate::coordinator::{SignalRelay, StatusSnapshot};
use crate::heartbeat::HeartbeatProber;
use crate::lifecycle::Shutdown;
use crate::registry::TopologyRegistry;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<TopologyRegistry>,
    pub prober: HeartbeatProber,
    pub relay: Arc<SignalRelay>,
    pub status: Arc<ArcSwap<StatusSnapshot>>,
    pub config: Arc<ArcSwap<KeeperConfig>>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/nodes", get(list_nodes).post(add_node))
        .route("/admin/nodes/{name}", delete(remove_node))
        .route("/admin/nodes/seq/{seq}", delete(remove_node_by_sequence))
        .route("/admin/probe", post(probe_node))
        .route("/admin/notify", post(notify_coordinator))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until shutdown is triggered.
pub async fn serve(listener: TcpListener, state: AdminState, shutdown: Shutdown) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown.signalled())
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
