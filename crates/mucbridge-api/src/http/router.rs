//! Axum router configuration with middleware.
//!
//! Routes keep the paths existing clients use (`/newConnection`, `/ws/{id}`).
//! Middleware: CORS (any origin, the bridge is called from browser pages on
//! other hosts) and request tracing.

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mucbridge_core::chat::ChatConnector;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router<C: ChatConnector + 'static>(state: AppState<C>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/newConnection", post(handlers::session::new_connection::<C>))
        .route("/connection/{id}", delete(handlers::session::close_connection::<C>))
        .route("/ws/{id}", get(handlers::ws::ws_handler::<C>))
        .route("/health", get(health_check::<C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_check<C: ChatConnector + 'static>(State(state): State<AppState<C>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.bridge.registry().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mucbridge_types::config::BridgeConfig;
    use tower::ServiceExt;

    use crate::http::test_support::NullConnector;

    fn state() -> AppState<NullConnector> {
        AppState::new(NullConnector, BridgeConfig::default())
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn new_connection_returns_session_id() {
        let state = state();
        let app = build_router(state.clone());

        let req = Request::builder()
            .method("POST")
            .uri("/newConnection")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let id = body_text(resp).await;
        assert!(state.bridge.registry().lookup(&id).is_ok());
    }

    #[tokio::test]
    async fn close_connection_removes_session() {
        let state = state();
        let id = state.bridge.create_session().await.unwrap();

        let close = || {
            Request::builder()
                .method("DELETE")
                .uri(format!("/connection/{id}"))
                .body(Body::empty())
                .unwrap()
        };

        let resp = build_router(state.clone()).oneshot(close()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(state.bridge.registry().is_empty());

        let resp = build_router(state.clone()).oneshot(close()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["errors"][0]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn health_reports_session_count() {
        let state = state();
        state.bridge.create_session().await.unwrap();

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = build_router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["sessions"], 1);
    }
}
