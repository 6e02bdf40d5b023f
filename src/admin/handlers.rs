use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::coordinator::{NotifySignal, StatusSnapshot};
use crate::error::Error;
use crate::node::ProbeOutcome;
use crate::registry::Node;

#[derive(Debug, Deserialize)]
pub struct AddNodeRequest {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct ProbeRequest {
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    pub signal: String,
}

#[derive(Debug, Serialize)]
pub struct OpReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<Node>,
}

#[derive(Debug, Serialize)]
pub struct ProbeReply {
    pub ok: bool,
    pub outcome: ProbeOutcome,
}

/// Failed administrative call: `{"ok": false, "error": "..."}`.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.to_http_status();
        if self.0.is_admin_input() {
            tracing::info!(error = %self.0, "Admin request rejected");
        } else {
            tracing::error!(error = %self.0, "Admin request failed");
        }
        let body = serde_json::json!({ "ok": false, "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<StatusSnapshot> {
    Json(state.status.load().as_ref().clone())
}

pub async fn list_nodes(State(state): State<AdminState>) -> Result<Json<Vec<Node>>, ApiError> {
    Ok(Json(state.registry.list().await?))
}

pub async fn add_node(
    State(state): State<AdminState>,
    Json(req): Json<AddNodeRequest>,
) -> Result<Json<OpReply>, ApiError> {
    let node = state.registry.add(&req.name, &req.target).await?;
    Ok(Json(OpReply { ok: true, node: Some(node) }))
}

pub async fn remove_node(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<OpReply>, ApiError> {
    let node = state.registry.remove(&name).await?;
    Ok(Json(OpReply { ok: true, node: Some(node) }))
}

pub async fn remove_node_by_sequence(
    State(state): State<AdminState>,
    Path(seq): Path<u64>,
) -> Result<Json<OpReply>, ApiError> {
    let node = state.registry.remove_by_sequence(seq).await?;
    Ok(Json(OpReply { ok: true, node: Some(node) }))
}

/// Direct diagnostic probe; does not touch the registry.
pub async fn probe_node(
    State(state): State<AdminState>,
    Json(req): Json<ProbeRequest>,
) -> Json<ProbeReply> {
    let timeout = state.config.load().heartbeat.timeout();
    let outcome = state.prober.probe(&req.target, timeout).await;
    Json(ProbeReply { ok: outcome.is_alive(), outcome })
}

pub async fn notify_coordinator(
    State(state): State<AdminState>,
    Json(req): Json<NotifyRequest>,
) -> Result<Json<OpReply>, ApiError> {
    let signal: NotifySignal = req.signal.parse()?;
    state.relay.raise(signal.flag());
    Ok(Json(OpReply { ok: true, node: None }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::setup_admin_router;
    use crate::config::KeeperConfig;
    use crate::coordinator::{KeeperRole, RelayFlag, SignalRelay};
    use crate::heartbeat::HeartbeatProber;
    use crate::node::fake::FakeNodeClient;
    use crate::registry::{FileStore, TopologyRegistry};
    use arc_swap::ArcSwap;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Api {
        _dir: tempfile::TempDir,
        state: AdminState,
        client: Arc<FakeNodeClient>,
    }

    fn api(api_key: &str) -> Api {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(FakeNodeClient::new());
        client.set_alive("addr1", ProbeOutcome::Alive);
        client.set_alive("addr2", ProbeOutcome::Alive);
        let relay = Arc::new(SignalRelay::new());

        let mut config = KeeperConfig::default();
        config.node.name = "nodeA".into();
        config.admin.api_key = api_key.into();

        let state = AdminState {
            registry: Arc::new(TopologyRegistry::new(
                FileStore::new(dir.path().join("registry.json")),
                client.clone(),
                relay.clone(),
                "nodeA",
                Duration::from_secs(1),
            )),
            prober: HeartbeatProber::new(client.clone()),
            relay,
            status: Arc::new(ArcSwap::from_pointee(StatusSnapshot::initial("nodeA", KeeperRole::Master))),
            config: Arc::new(ArcSwap::from_pointee(config)),
        };
        Api { _dir: dir, state, client }
    }

    async fn call(api: &Api, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = setup_admin_router(api.state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn add_first_node_as_primary() {
        let api = api("");
        let (status, body) = call(
            &api,
            Method::POST,
            "/admin/nodes",
            Some(serde_json::json!({ "name": "nodeA", "target": "addr1" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["node"]["role"], "primary");
        assert_eq!(body["node"]["sequence_number"], 1);
        assert!(api.state.relay.take(RelayFlag::ReloadRegistry));
    }

    #[tokio::test]
    async fn unreachable_add_reports_failure() {
        let api = api("");
        let (status, body) = call(
            &api,
            Method::POST,
            "/admin/nodes",
            Some(serde_json::json!({ "name": "nodeX", "target": "nowhere" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn remove_by_sequence_then_list() {
        let api = api("");
        api.state.registry.add("nodeA", "addr1").await.unwrap();
        api.state.registry.add("nodeB", "addr2").await.unwrap();

        let (status, _) = call(&api, Method::DELETE, "/admin/nodes/seq/2", None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, nodes) = call(&api, Method::GET, "/admin/nodes", None).await;
        let nodes = nodes.as_array().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0]["name"], "nodeA");
        assert_eq!(nodes[0]["is_self"], true);

        let (status, body) = call(&api, Method::DELETE, "/admin/nodes/nodeB", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn bogus_signal_is_rejected_without_side_effects() {
        let api = api("");
        let (status, body) = call(
            &api,
            Method::POST,
            "/admin/notify",
            Some(serde_json::json!({ "signal": "bogus-signal" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(api.state.relay.next_pending(), None);
    }

    #[tokio::test]
    async fn reload_registry_signal_wakes_coordinator() {
        let api = api("");
        let (status, body) = call(
            &api,
            Method::POST,
            "/admin/notify",
            Some(serde_json::json!({ "signal": "reload_registry" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(api.state.relay.take(RelayFlag::ReloadRegistry));
    }

    #[tokio::test]
    async fn probe_bypasses_registry() {
        let api = api("");
        let (_, body) = call(&api, Method::POST, "/admin/probe", Some(serde_json::json!({ "target": "addr2" }))).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["outcome"], "alive");

        let (_, body) = call(&api, Method::POST, "/admin/probe", Some(serde_json::json!({ "target": "dead" }))).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["outcome"], "unreachable");
        assert!(api.state.registry.list().await.unwrap().is_empty());
        assert_eq!(api.client.promotions(), 0);
    }

    #[tokio::test]
    async fn api_key_is_enforced() {
        let api = api("secret");
        let (status, _) = call(&api, Method::GET, "/admin/status", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let response = setup_admin_router(api.state.clone())
            .oneshot(
                Request::builder()
                    .uri("/admin/status")
                    .header(header::AUTHORIZATION, "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
