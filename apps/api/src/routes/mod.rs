pub mod health;

use axum::{
    http::{header, HeaderName},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::dashboard::handlers;
use crate::proxy::handlers::handle_youtube_proxy;
use crate::state::AppState;

/// Browser clients call the proxy cross-origin with their session token.
fn proxy_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn build_router(state: AppState) -> Router {
    let proxy = Router::new()
        .route("/functions/v1/youtube-api", post(handle_youtube_proxy))
        .layer(proxy_cors());

    Router::new()
        .route("/health", get(health::health_handler))
        // Dashboard API
        .route("/api/v1/dashboard", get(handlers::handle_get_dashboard))
        .route("/api/v1/dashboard/videos", post(handlers::handle_add_video))
        .route(
            "/api/v1/dashboard/videos/:id/select",
            post(handlers::handle_select_video),
        )
        .route("/api/v1/dashboard/refresh", post(handlers::handle_refresh))
        .route(
            "/api/v1/dashboard/edit",
            post(handlers::handle_begin_edit)
                .put(handlers::handle_save_edit)
                .delete(handlers::handle_cancel_edit),
        )
        .route(
            "/api/v1/dashboard/notes",
            get(handlers::handle_list_notes).post(handlers::handle_add_note),
        )
        .route(
            "/api/v1/dashboard/notes/:id",
            delete(handlers::handle_delete_note),
        )
        .route(
            "/api/v1/dashboard/comments",
            post(handlers::handle_post_comment),
        )
        .route(
            "/api/v1/dashboard/comments/:id",
            delete(handlers::handle_delete_comment),
        )
        .route("/api/v1/dashboard/sign-out", post(handlers::handle_sign_out))
        .merge(proxy)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::{Config, StoreBackend, DEFAULT_YOUTUBE_API_BASE};
    use crate::dashboard::sessions::DashboardSessions;
    use crate::events::{EventLogger, LocalBufferSink, StoreSink};
    use crate::proxy::test_support::FakePlatform;
    use crate::proxy::transport::{HttpProxy, LocalProxy, ProxyTransport};
    use crate::proxy::{ProxyAction, ProxyError, ProxyRequest};
    use crate::store::MemoryStore;

    const TOKEN: &str = "session-token";
    const YT_ID: &str = "dQw4w9WgXcQ";

    fn test_config() -> Config {
        Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            youtube_api_key: Some("test-key".to_string()),
            youtube_api_base: DEFAULT_YOUTUBE_API_BASE.to_string(),
            proxy_url: None,
            user_agent: "test".to_string(),
            event_buffer_capacity: 16,
            dev_session_token: None,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    fn test_router(platform: FakePlatform) -> Router {
        test_app(platform).0
    }

    fn test_app(platform: FakePlatform) -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.insert_session(TOKEN, Uuid::new_v4());
        let platform = Arc::new(platform);
        let event_buffer = Arc::new(LocalBufferSink::new(16));
        let events = EventLogger::new(
            Arc::new(StoreSink::new(store.clone())),
            event_buffer.clone(),
            "test",
        );
        let router = build_router(AppState {
            store: store.clone(),
            platform: platform.clone(),
            transport: Arc::new(LocalProxy::new(platform)),
            events,
            event_buffer,
            dashboards: DashboardSessions::default(),
            config: test_config(),
        });
        (router, store)
    }

    async fn request(
        router: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let parsed = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, parsed)
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, body) = request(&router, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["buffered_events"], 0);
    }

    #[tokio::test]
    async fn test_proxy_fetch_video_details() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, body) = request(
            &router,
            Method::POST,
            "/functions/v1/youtube-api",
            None,
            Some(json!({ "action": "fetchVideoDetails", "videoId": YT_ID })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], YT_ID);
        assert_eq!(body["statistics"]["viewCount"], "1234567");
    }

    #[tokio::test]
    async fn test_proxy_write_is_simulated() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, body) = request(
            &router,
            Method::POST,
            "/functions/v1/youtube-api",
            Some("user-jwt"),
            Some(json!({
                "action": "postComment",
                "videoId": YT_ID,
                "commentText": "Great video!"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["outcome"], "simulated");
    }

    #[tokio::test]
    async fn test_proxy_unknown_action_is_400() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, body) = request(
            &router,
            Method::POST,
            "/functions/v1/youtube-api",
            None,
            Some(json!({ "action": "likeVideo", "videoId": YT_ID })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn test_proxy_missing_key_is_400() {
        let mut platform = FakePlatform::new(YT_ID);
        platform.configured = false;
        let router = test_router(platform);
        let (status, body) = request(
            &router,
            Method::POST,
            "/functions/v1/youtube-api",
            None,
            Some(json!({ "action": "fetchVideoDetails", "videoId": YT_ID })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "YouTube API key not configured");
    }

    #[tokio::test]
    async fn test_proxy_preflight_allows_any_origin() {
        let router = test_router(FakePlatform::new(YT_ID));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/functions/v1/youtube-api")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization, apikey")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(req).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, body) = request(&router, Method::GET, "/api/v1/dashboard", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = request(
            &router,
            Method::GET,
            "/api/v1/dashboard",
            Some("unknown-token"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dashboard_add_video_and_note() {
        let router = test_router(FakePlatform::new(YT_ID));

        let (status, view) =
            request(&router, Method::GET, "/api/v1/dashboard", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "empty");

        let (status, view) = request(
            &router,
            Method::POST,
            "/api/v1/dashboard/videos",
            Some(TOKEN),
            Some(json!({ "input": format!("https://youtu.be/{YT_ID}") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "browsing");
        assert_eq!(view["selected_video"]["view_count"], 1_234_567);
        assert_eq!(view["comments"].as_array().unwrap().len(), 1);
        assert_eq!(view["notices"][0]["level"], "success");

        let (status, view) = request(
            &router,
            Method::POST,
            "/api/v1/dashboard/notes",
            Some(TOKEN),
            Some(json!({
                "title": "Ideas",
                "content": "Shorter intro",
                "tags": "editing, pacing"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["notes"][0]["tags"], json!(["editing", "pacing"]));

        let (status, notes) = request(
            &router,
            Method::GET,
            "/api/v1/dashboard/notes?q=PACING",
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(notes.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_invalid_input_is_a_notice() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, view) = request(
            &router,
            Method::POST,
            "/api/v1/dashboard/videos",
            Some(TOKEN),
            Some(json!({ "input": "not a video" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["state"], "empty");
        assert_eq!(view["notices"][0]["level"], "error");
    }

    #[tokio::test]
    async fn test_edit_without_selection_is_400() {
        let router = test_router(FakePlatform::new(YT_ID));
        let (status, body) =
            request(&router, Method::POST, "/api/v1/dashboard/edit", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_sign_out_drops_dashboard() {
        let router = test_router(FakePlatform::new(YT_ID));
        request(&router, Method::GET, "/api/v1/dashboard", Some(TOKEN), None).await;

        let (_, health) = request(&router, Method::GET, "/health", None, None).await;
        assert_eq!(health["active_dashboards"], 1);

        let (status, _) = request(
            &router,
            Method::POST,
            "/api/v1/dashboard/sign-out",
            Some(TOKEN),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, health) = request(&router, Method::GET, "/health", None, None).await;
        assert_eq!(health["active_dashboards"], 0);
    }

    #[tokio::test]
    async fn test_events_record_client_user_agent() {
        let (router, store) = test_app(FakePlatform::new(YT_ID));
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/dashboard")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header(header::USER_AGENT, "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5)")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let visited = store
            .events()
            .into_iter()
            .find(|e| e.event_type == "user_dashboard_visited")
            .unwrap();
        assert_eq!(visited.user_agent, "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5)");
    }

    #[tokio::test]
    async fn test_events_fall_back_to_configured_user_agent() {
        let (router, store) = test_app(FakePlatform::new(YT_ID));
        request(&router, Method::GET, "/api/v1/dashboard", Some(TOKEN), None).await;

        let visited = store
            .events()
            .into_iter()
            .find(|e| e.event_type == "user_dashboard_visited")
            .unwrap();
        assert_eq!(visited.user_agent, "test");
    }

    #[tokio::test]
    async fn test_expired_session_evicts_dashboard() {
        let (router, store) = test_app(FakePlatform::new(YT_ID));
        let (status, _) =
            request(&router, Method::GET, "/api/v1/dashboard", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, health) = request(&router, Method::GET, "/health", None, None).await;
        assert_eq!(health["active_dashboards"], 1);

        store.remove_session(TOKEN);

        let (status, _) =
            request(&router, Method::GET, "/api/v1/dashboard", Some(TOKEN), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (_, health) = request(&router, Method::GET, "/health", None, None).await;
        assert_eq!(health["active_dashboards"], 0);
    }

    #[tokio::test]
    async fn test_http_proxy_transport_against_served_router() {
        let router = test_router(FakePlatform::new(YT_ID));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let proxy = HttpProxy::new(format!("http://{addr}/functions/v1/youtube-api"));

        let details = proxy
            .invoke(ProxyRequest::new(ProxyAction::FetchVideoDetails, YT_ID), None)
            .await
            .unwrap();
        assert_eq!(details["id"], YT_ID);

        let err = proxy
            .invoke(
                ProxyRequest::new(ProxyAction::FetchVideoDetails, "zzzzzzzzzzz"),
                None,
            )
            .await
            .unwrap_err();
        match err {
            ProxyError::Remote { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Video not found");
            }
            other => panic!("expected a remote error, got {other:?}"),
        }

        let mut write = ProxyRequest::new(ProxyAction::PostComment, YT_ID);
        write.comment_text = Some("Great breakdown".to_string());
        let outcome = proxy.invoke(write, Some("user-jwt")).await.unwrap();
        assert_eq!(outcome["success"], true);
        assert_eq!(outcome["outcome"], "simulated");
    }
}
