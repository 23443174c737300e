use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tower_http::trace::TraceLayer;

use crate::error::StoreError;
use crate::store::Storage;

/// HTTP front end for a [`Storage`] implementation.
///
/// Absence maps to 404, `WrongType` and malformed parameters map to 400; the
/// storage layer itself never distinguishes "not found" from an empty result.
pub struct HttpServer {
    bind_address: String,
    port: u16,
    storage: Arc<dyn Storage>,
}

/// JSON body for `set`: the value plus a TTL in milliseconds (0 = no
/// expiration, negative rejected).
#[derive(Debug, Serialize, Deserialize)]
pub struct SetParams {
    pub value: String,
    pub ttl: i64,
}

/// JSON body for `expire`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TtlParams {
    pub ttl: i64,
}

/// JSON value object returned by reads and accepted by `hset`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValueParams {
    pub value: String,
}

#[derive(Clone)]
struct ApiState {
    storage: Arc<dyn Storage>,
}

impl HttpServer {
    pub fn new(bind_address: String, port: u16, storage: Arc<dyn Storage>) -> Self {
        Self {
            bind_address,
            port,
            storage,
        }
    }

    /// Serves until `signal` completes, then finishes in-flight requests.
    pub async fn start_with_shutdown<F>(&self, signal: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: std::future::Future<Output = ()>,
    {
        let app = self.router();
        let addr: SocketAddr = format!("{}:{}", self.bind_address, self.port).parse()?;

        tracing::info!(%addr, "http server listening");

        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(signal)
            .await?;

        Ok(())
    }

    pub fn router(&self) -> Router {
        let state = ApiState {
            storage: Arc::clone(&self.storage),
        };

        Router::new()
            .route("/api/keys", get(keys_handler))
            .route("/api/get/:key", get(get_handler))
            .route("/api/set/:key", post(set_handler))
            .route("/api/remove/:key", post(remove_handler))
            .route("/api/expire/:key", post(expire_handler))
            .route("/api/hget/:key/:field", get(hget_handler))
            .route("/api/hset/:key/:field", post(hset_handler))
            .route("/api/hdel/:key/:field", post(hdel_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

async fn keys_handler(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.storage.keys().await)
}

async fn get_handler(
    State(state): State<ApiState>,
    Path(key): Path<String>,
) -> Result<Json<ValueParams>, StatusCode> {
    match state.storage.get(&key).await {
        Ok(Some(value)) => Ok(Json(ValueParams { value })),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(StoreError::WrongType) => Err(StatusCode::BAD_REQUEST),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn set_handler(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    Json(params): Json<SetParams>,
) -> StatusCode {
    if params.value.is_empty() || params.ttl < 0 {
        return StatusCode::BAD_REQUEST;
    }

    let ttl = Duration::from_millis(params.ttl as u64);
    state.storage.set(key, params.value, ttl).await;
    StatusCode::OK
}

async fn remove_handler(State(state): State<ApiState>, Path(key): Path<String>) -> StatusCode {
    state.storage.remove(&key).await;
    StatusCode::OK
}

async fn expire_handler(
    State(state): State<ApiState>,
    Path(key): Path<String>,
    Json(params): Json<TtlParams>,
) -> StatusCode {
    if params.ttl < 0 {
        return StatusCode::BAD_REQUEST;
    }

    let ttl = Duration::from_millis(params.ttl as u64);
    if state.storage.expire(&key, ttl).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn hget_handler(
    State(state): State<ApiState>,
    Path((key, field)): Path<(String, String)>,
) -> Result<Json<ValueParams>, StatusCode> {
    match state.storage.hget(&key, &field).await {
        Ok(Some(value)) => Ok(Json(ValueParams { value })),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(StoreError::WrongType) => Err(StatusCode::BAD_REQUEST),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn hset_handler(
    State(state): State<ApiState>,
    Path((key, field)): Path<(String, String)>,
    Json(params): Json<ValueParams>,
) -> StatusCode {
    if params.value.is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    match state.storage.hset(key, field, params.value).await {
        Ok(()) => StatusCode::OK,
        Err(StoreError::WrongType) => StatusCode::BAD_REQUEST,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn hdel_handler(
    State(state): State<ApiState>,
    Path((key, field)): Path<(String, String)>,
) -> StatusCode {
    match state.storage.hdel(&key, &field).await {
        Ok(()) => StatusCode::OK,
        Err(StoreError::WrongType) => StatusCode::BAD_REQUEST,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Cluster;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let cluster = Cluster::new(4, Duration::ZERO).unwrap();
        let server = HttpServer::new("127.0.0.1".to_string(), 0, Arc::new(cluster));
        server.router()
    }

    async fn request(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<String>,
    ) -> axum::response::Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(content) => builder
                .header("content-type", "application/json")
                .body(Body::from(content))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let app = test_router();

        let response = request(
            app.clone(),
            "POST",
            "/api/set/k",
            Some(r#"{"value":"v","ttl":0}"#.to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = request(app, "GET", "/api/get/k", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value: ValueParams = serde_json::from_slice(&body).unwrap();
        assert_eq!(value.value, "v");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let app = test_router();
        let response = request(app, "GET", "/api/get/missing", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_set_rejects_bad_params() {
        let app = test_router();

        let response = request(
            app.clone(),
            "POST",
            "/api/set/k",
            Some(r#"{"value":"","ttl":0}"#.to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = request(
            app,
            "POST",
            "/api/set/k",
            Some(r#"{"value":"v","ttl":-1}"#.to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_type_is_bad_request() {
        let app = test_router();

        let response = request(
            app.clone(),
            "POST",
            "/api/hset/h/f",
            Some(r#"{"value":"v"}"#.to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = request(app, "GET", "/api/get/h", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expire_missing_is_not_found() {
        let app = test_router();
        let response = request(
            app,
            "POST",
            "/api/expire/missing",
            Some(r#"{"ttl":1000}"#.to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_keys_lists_live_keys() {
        let app = test_router();

        for key in ["a", "b"] {
            let response = request(
                app.clone(),
                "POST",
                &format!("/api/set/{}", key),
                Some(r#"{"value":"v","ttl":0}"#.to_string()),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = request(app, "GET", "/api/keys", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let mut keys: Vec<String> = serde_json::from_slice(&body).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
