use crate::app::dto::*;
use crate::app::engine::SliceEngine;
use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct HttpState {
    pub engine: SliceEngine,
}

#[derive(Debug, Clone, Serialize)]
struct ApiErrorBody {
    error: String,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> impl IntoResponse {
    (status, Json(ApiErrorBody { error: msg.into() }))
}

pub fn build_router(engine: SliceEngine) -> Router {
    let state = Arc::new(HttpState { engine });

    Router::new()
        .route("/health", get(health))
        .route("/sources", post(sources))
        .route("/walk", post(walk))
        .route("/window", post(window))
        .route("/resolve", post(resolve))
        .route("/reload", post(reload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(engine: SliceEngine, addr: SocketAddr) -> Result<()> {
    let app = build_router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run a blocking engine query off the async runtime. Query failures are the
/// caller's fault (bad selector, bad window, bad path) and map to
/// `failure_status`.
async fn blocking<T, F>(failure_status: StatusCode, query: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match spawn_blocking(query).await {
        Ok(Ok(res)) => Json(res).into_response(),
        Ok(Err(e)) => api_error(failure_status, format!("{e:#}")).into_response(),
        Err(e) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("task join error: {e}"),
        )
        .into_response(),
    }
}

async fn health(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(state.engine.health())
}

async fn reload(State(state): State<Arc<HttpState>>) -> Response {
    let engine = state.engine.clone();
    blocking(StatusCode::INTERNAL_SERVER_ERROR, move || engine.reload()).await
}

async fn sources(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<SourcesRequest>,
) -> Response {
    let engine = state.engine.clone();
    blocking(StatusCode::BAD_REQUEST, move || engine.sources(req)).await
}

async fn walk(State(state): State<Arc<HttpState>>, Json(req): Json<WalkRequest>) -> Response {
    let engine = state.engine.clone();
    blocking(StatusCode::BAD_REQUEST, move || engine.walk(req)).await
}

async fn window(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<WindowRequest>,
) -> Response {
    let engine = state.engine.clone();
    blocking(StatusCode::BAD_REQUEST, move || engine.window(req)).await
}

async fn resolve(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<ResolveRequest>,
) -> Response {
    let engine = state.engine.clone();
    blocking(StatusCode::BAD_REQUEST, move || engine.resolve(req)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::classes::table::ClassTable;
    use crate::domain::builder::TraceReplayer;
    use crate::domain::trace::TraceData;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn make_engine() -> SliceEngine {
        let trace: TraceData = serde_json::from_value(serde_json::json!({
            "events": [
                {"id": "a", "kind": "source"},
                {"id": "b", "kind": "source"},
                {"id": "c", "kind": "composite", "data": ["a"], "control": "b"}
            ]
        }))
        .unwrap();
        let run = TraceReplayer::new(Box::new(ClassTable::new()))
            .replay(trace)
            .unwrap();
        SliceEngine::from_replayed("trace.json".into(), run)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_http_health_and_sources() {
        let app = build_router(make_engine());

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["node_count"], 3);

        let res = app
            .oneshot(post_json("/sources", serde_json::json!({"nodes": ["c"]})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["results"][0]["sources"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_http_bad_request_has_error_body() {
        let app = build_router(make_engine());
        let res = app
            .oneshot(post_json(
                "/window",
                serde_json::json!({"node": "c", "start": 0, "end": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert!(body["error"].as_str().unwrap().contains("#2"));
    }

    #[tokio::test]
    async fn test_http_walk_data_only() {
        let app = build_router(make_engine());
        let res = app
            .oneshot(post_json(
                "/walk",
                serde_json::json!({"node": "c", "order": "dfs", "follow_control": false}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["visited"].as_array().unwrap().len(), 2);
    }
}
