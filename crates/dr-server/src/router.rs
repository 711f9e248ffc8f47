//! Axum router construction.
//!
//! Builds the application router with all routes and middleware layers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::{request_id_middleware, X_REQUEST_ID};
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = cors_layer(&ctx.config.server.cors_origins);
    let upload_limit = DefaultBodyLimit::max(ctx.config.server.max_upload_bytes);

    let api = Router::new()
        .route("/hello", get(routes::health::hello))
        .route("/dwg2dxf", post(routes::convert::dwg2dxf).layer(upload_limit))
        .route("/tools", get(routes::tools::tools));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// CORS policy for the configured browser origins. Origins that are not
/// valid header values are logged and skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_DISPOSITION, X_REQUEST_ID.clone()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use std::path::PathBuf;

    use dr_convert::{Converter, ConverterRun, JobRunner, ToolInfo};
    use dr_core::config::Config;

    struct EchoConverter;

    #[async_trait::async_trait]
    impl Converter for EchoConverter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn convert(&self, input: &Path) -> dr_core::Result<ConverterRun> {
            tokio::fs::copy(input, input.with_extension("dxf")).await?;
            Ok(ConverterRun::default())
        }
    }

    fn converter_tool() -> ToolInfo {
        ToolInfo {
            name: "dwg2dxf".into(),
            available: true,
            version: Some("dwg2dxf 0.13.3".into()),
            path: Some(PathBuf::from("/opt/libredwg/bin/dwg2dxf")),
        }
    }

    fn app(root: &Path) -> Router {
        let runner = Arc::new(JobRunner::new(
            Arc::new(EchoConverter),
            Some(root.to_path_buf()),
            2,
        ));
        build_router(AppContext::new(Config::default(), runner, converter_tool()))
    }

    fn multipart(field: &str, filename: &str, data: &str) -> Request<Body> {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{data}\r\n--{boundary}--\r\n"
        );
        Request::post("/api/dwg2dxf")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn hello_returns_greeting() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(Request::get("/api/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "Test with FastAPI");
    }

    #[tokio::test]
    async fn tools_serves_startup_info() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(Request::get("/api/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["tools"][0]["version"], "dwg2dxf 0.13.3");
        assert_eq!(json["tools"][0]["path"], "/opt/libredwg/bin/dwg2dxf");
        assert_eq!(json["max_concurrent_jobs"], 2);
    }

    #[tokio::test]
    async fn converts_upload() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(multipart("file", "Site.DWG", "drawing-bytes"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Site.dxf\""
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), b"drawing-bytes");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn accepts_other_field_name_with_filename() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(multipart("upload", "a.dwg", "x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_wrong_extension() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(multipart("file", "a.pdf", "x"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn rejects_non_multipart_body() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(
                Request::post("/api/dwg2dxf")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(
                Request::get("/api/hello")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn cors_ignores_unknown_origin() {
        let root = tempfile::tempdir().unwrap();
        let response = app(root.path())
            .oneshot(
                Request::get("/api/hello")
                    .header(header::ORIGIN, "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
