//! 路由模块

use axum::{
    routing::{get, head},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/hello", get(handlers::hello))
        .route("/api/health", get(handlers::health_check))
        .route("/api/tables", get(handlers::list_tables))
        .route("/api/table-data/{object}", get(handlers::table_data))
        .route("/api/system-config", get(handlers::system_config))
        .route("/api/system-logs", get(handlers::system_logs))
        .route("/api/kv-keys", get(handlers::kv_keys))
        .route("/api/kv-value/{key}", get(handlers::kv_value))
        .route("/api/files", get(handlers::list_files))
        .route(
            "/api/files/{*key}",
            head(handlers::head_file)
                .get(handlers::get_file)
                .put(handlers::put_file)
                .delete(handlers::delete_file),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::middleware;
    use axum::response::Response;
    use common::config::{AppConfig, DeployEnv};
    use common::middleware::no_cache_middleware;
    use serde_json::Value;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::util::ServiceExt;

    use super::*;
    use crate::blob::FsBlobStore;
    use crate::registry::SchemaRegistry;
    use crate::state::{ensure_system_tables, AppState};

    async fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();

        let config = AppConfig {
            env: DeployEnv::Dev,
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            redis_url: None,
            blob_root: dir.path().to_path_buf(),
            excluded_table_prefixes: vec!["_cf_".to_string()],
            excluded_table_names: vec!["sqlite_sequence".to_string()],
            max_connections: 1,
        };

        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let registry = Arc::new(SchemaRegistry::with_system_tables());
        ensure_system_tables(&db, &registry).await.unwrap();

        let state = AppState {
            config,
            registry,
            db,
            kv: None,
            blobs: Arc::new(FsBlobStore::new(dir.path().join("blobs"))),
        };
        (dir, state)
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .merge(router())
            .fallback(handlers::not_found)
            .layer(middleware::from_fn(no_cache_middleware))
            .with_state(state)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_hello_envelope_and_no_cache_headers() {
        let (_dir, state) = test_state().await;
        let response = app(state).oneshot(get_req("/api/hello?name=Rust")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "no-store, no-cache, must-revalidate, proxy-revalidate"
        );
        assert_eq!(response.headers()[header::PRAGMA], "no-cache");

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Hello, Rust!");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_unmatched_route_returns_404_envelope_with_path() {
        let (_dir, state) = test_state().await;
        let response = app(state).oneshot(get_req("/api/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["path"], "/api/nope");
    }

    #[tokio::test]
    async fn test_tables_reports_matched_and_database_only() {
        let (_dir, state) = test_state().await;

        // One live table with no definition, plus an excluded internal one.
        sqlx::query("CREATE TABLE orphan_tbl (id INTEGER)")
            .execute(&state.db)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE _cf_internal (id INTEGER)")
            .execute(&state.db)
            .await
            .unwrap();

        let response = app(state).oneshot(get_req("/api/tables")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["matched"].as_array().unwrap().len(), 3);
        assert_eq!(json["schemaOnly"].as_array().unwrap().len(), 0);
        assert_eq!(json["databaseOnly"], serde_json::json!(["orphan_tbl"]));
    }

    #[tokio::test]
    async fn test_table_data_resolves_snake_case_alias() {
        let (_dir, state) = test_state().await;

        sqlx::query(
            "INSERT INTO `system_config` (`key`, `value`, `created_at`, `updated_at`) VALUES ('a', 'b', 1, 1)",
        )
        .execute(&state.db)
        .await
        .unwrap();

        let response = app(state)
            .oneshot(get_req("/api/table-data/system_config"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["rows"][0]["key"], "a");
    }

    #[tokio::test]
    async fn test_table_data_unknown_name_carries_valid_names() {
        let (_dir, state) = test_state().await;
        let response = app(state)
            .oneshot(get_req("/api/table-data/users"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        let valid: Vec<&str> = json["validNames"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(valid.contains(&"systemConfig"));
    }

    #[tokio::test]
    async fn test_system_logs_second_page_descending() {
        let (_dir, state) = test_state().await;

        for i in 1..=25i64 {
            sqlx::query("INSERT INTO `system_log` (`level`, `message`, `created_at`) VALUES ('info', ?, ?)")
                .bind(format!("m{i}"))
                .bind(1_000 + i)
                .execute(&state.db)
                .await
                .unwrap();
        }

        let response = app(state)
            .oneshot(get_req("/api/system-logs?page=2&limit=10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["count"], 10);
        assert_eq!(json["page"], 2);
        let ids: Vec<i64> = json["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_invalid_page_is_bad_request() {
        let (_dir, state) = test_state().await;
        let response = app(state)
            .oneshot(get_req("/api/system-logs?page=0&limit=10"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_kv_endpoints_without_binding_are_500() {
        let (_dir, state) = test_state().await;
        let response = app(state).oneshot(get_req("/api/kv-keys")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_file_upload_download_delete_cycle() {
        let (_dir, state) = test_state().await;
        let app = app(state);

        // Upload.
        let put = Request::builder()
            .method("PUT")
            .uri("/api/files/docs/hello.txt")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello blob"))
            .unwrap();
        let response = app.clone().oneshot(put).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["key"], "docs/hello.txt");
        assert_eq!(json["size"], 10);

        // Binary download with metadata headers.
        let response = app
            .clone()
            .oneshot(get_req("/api/files/docs/hello.txt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(response.headers().contains_key(header::ETAG));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello blob");

        // Content-negotiated metadata.
        let req = Request::builder()
            .uri("/api/files/docs/hello.txt")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["key"], "docs/hello.txt");
        assert_eq!(json["contentType"], "text/plain");

        // HEAD: headers only, empty body.
        let req = Request::builder()
            .method("HEAD")
            .uri("/api/files/docs/hello.txt")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());

        // Delete twice: idempotent.
        for _ in 0..2 {
            let req = Request::builder()
                .method("DELETE")
                .uri("/api/files/docs/hello.txt")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        // Gone.
        let response = app
            .oneshot(get_req("/api/files/docs/hello.txt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_with_empty_body_is_rejected_without_mutation() {
        let (_dir, state) = test_state().await;
        let app = app(state);

        let put = Request::builder()
            .method("PUT")
            .uri("/api/files/empty.txt")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(put).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Nothing was stored.
        let response = app.oneshot(get_req("/api/files/empty.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_without_content_type_is_rejected() {
        let (_dir, state) = test_state().await;
        let put = Request::builder()
            .method("PUT")
            .uri("/api/files/x.bin")
            .body(Body::from("data"))
            .unwrap();
        let response = app(state).oneshot(put).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_file_listing_with_truncation_flag() {
        let (_dir, state) = test_state().await;
        let app = app(state);

        for key in ["one.txt", "two.txt"] {
            let put = Request::builder()
                .method("PUT")
                .uri(format!("/api/files/{key}"))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("x"))
                .unwrap();
            app.clone().oneshot(put).await.unwrap();
        }

        let response = app.oneshot(get_req("/api/files")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["truncated"], false);
        assert_eq!(json["files"][0]["key"], "one.txt");
    }
}
