//! HTTP API for PDF plan extraction.
//!
//! - `GET /api/health`: provider availability
//! - `POST /api/extract`: multipart PDF upload, returns the report
//! - `POST /api/export?format=json|csv`: render a report for download

mod handlers;
mod routes;

pub use handlers::ApiError;
pub use routes::create_router;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::ExtractorConfig;
use crate::extraction::Extractor;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub config: Arc<ExtractorConfig>,
}

impl AppState {
    pub fn new(config: ExtractorConfig) -> Self {
        let extractor = Extractor::from_config(&config);
        Self {
            extractor: Arc::new(extractor),
            config: Arc::new(config),
        }
    }
}

/// Bind a listener; `host` may be an IP address or a hostname.
pub async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}

/// Start the web server.
pub async fn serve(config: ExtractorConfig, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(config);
    let app = create_router(state);

    let listener = bind(host, port).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::extraction::{finalize, Metadata};
    use crate::llm::{GenerationOptions, LlmProvider, ProviderError, ProviderKind};

    const BOUNDARY: &str = "wsx-test-boundary";

    struct Canned;

    #[async_trait]
    impl LlmProvider for Canned {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        fn model(&self) -> &str {
            "canned"
        }

        async fn invoke(&self, _prompt: &str, _options: GenerationOptions) -> Result<Value, ProviderError> {
            Ok(json!({"goals": []}))
        }
    }

    fn setup_test_app(providers: Vec<Arc<dyn LlmProvider>>, max_upload_bytes: usize) -> axum::Router {
        let config = ExtractorConfig {
            max_upload_bytes,
            ..Default::default()
        };
        let extractor = Extractor::with_providers(providers).with_max_upload_bytes(max_upload_bytes);
        create_router(AppState {
            extractor: Arc::new(extractor),
            config: Arc::new(config),
        })
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, file_name, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(f) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                        name, f
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/extract")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_bind_accepts_hostname() {
        let listener = bind("localhost", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());

        let listener = bind("127.0.0.1", 0).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_health() {
        let app = setup_test_app(vec![Arc::new(Canned)], 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["providers"][0]["provider"], "openai");
        assert_eq!(json["providers"][0]["configured"], true);
    }

    #[tokio::test]
    async fn test_health_without_providers() {
        let app = setup_test_app(vec![], 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = json_body(response).await;
        assert_eq!(json["status"], "degraded");
    }

    #[tokio::test]
    async fn test_extract_rejects_non_pdf() {
        let app = setup_test_app(vec![Arc::new(Canned)], 1024 * 1024);

        let response = app
            .oneshot(multipart_request(&[("file", Some("notes.txt"), b"just some notes")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Not a PDF file");
    }

    #[tokio::test]
    async fn test_extract_rejects_encrypted() {
        let app = setup_test_app(vec![Arc::new(Canned)], 1024 * 1024);
        let pdf = b"%PDF-1.7\ntrailer << /Encrypt 5 0 R >>\n%%EOF";

        let response = app
            .oneshot(multipart_request(&[("file", Some("locked.pdf"), pdf)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_extract_rejects_oversized() {
        let app = setup_test_app(vec![Arc::new(Canned)], 64);
        let pdf = [b"%PDF-1.4\n".as_slice(), &[b'x'; 200]].concat();

        let response = app
            .oneshot(multipart_request(&[("file", Some("big.pdf"), &pdf)]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_extract_requires_file() {
        let app = setup_test_app(vec![Arc::new(Canned)], 1024);

        let response = app
            .oneshot(multipart_request(&[("provider", None, b"openai")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Missing 'file' field");
    }

    #[tokio::test]
    async fn test_extract_rejects_unknown_provider() {
        let app = setup_test_app(vec![Arc::new(Canned)], 1024);

        let response = app
            .oneshot(multipart_request(&[
                ("provider", None, b"gemini"),
                ("file", Some("plan.pdf"), b"%PDF-1.4\n"),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = setup_test_app(vec![], 1024);
        let report = finalize(
            &json!({"goals": [{"id": "goal-1", "title": "Restore wetlands", "status": "completed"}]}),
            Metadata {
                file_name: "Upper Basin Plan.pdf".to_string(),
                file_size: 100,
                extracted_at: chrono::Utc::now(),
                processing_method: "OpenAI (gpt-4o)".to_string(),
            },
            10,
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/export?format=csv")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&report).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Upper_Basin_Plan-extraction.csv\""
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let csv = String::from_utf8(body.to_vec()).unwrap();
        assert!(csv.contains("goal-1,Restore wetlands,Not specified,,completed,medium"));
    }

    #[tokio::test]
    async fn test_export_rejects_unknown_format() {
        let app = setup_test_app(vec![], 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/export?format=xlsx")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
