pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/upload", post(handlers::handle_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::{DocumentKind, ExtractedText, ExtractionError, TextExtractor};
    use crate::llm_client::{ModelError, ModelGateway};

    const BOUNDARY: &str = "X-RESUME-TEST-BOUNDARY";

    /// Answers by prompt type so call order does not matter here.
    struct CannedGateway {
        profile_reply: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelGateway for CannedGateway {
        async fn invoke(&self, prompt: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = if prompt.contains("suggested_job_titles") {
                self.profile_reply
            } else if prompt.contains("job recommender") {
                "no jobs today"
            } else {
                "Weak\n- Add contact details"
            };
            Ok(reply.to_string())
        }
    }

    struct StubExtractor;

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(
            &self,
            path: &Path,
            kind: DocumentKind,
        ) -> Result<ExtractedText, ExtractionError> {
            assert_eq!(kind, DocumentKind::Pdf);
            let bytes = tokio::fs::read(path).await?;
            Ok(ExtractedText::new(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }

    fn test_config(upload_dir: PathBuf) -> Config {
        Config {
            port: 0,
            ollama_url: "http://127.0.0.1:9".to_string(),
            model_timeout: Duration::from_secs(1),
            model_max_attempts: 1,
            upload_dir,
            max_upload_bytes: 1024 * 1024,
            rust_log: "info".to_string(),
        }
    }

    fn test_app(upload_dir: &Path, profile_reply: &'static str) -> (Router, Arc<CannedGateway>) {
        test_app_with_config(test_config(upload_dir.to_path_buf()), profile_reply)
    }

    fn test_app_with_config(
        config: Config,
        profile_reply: &'static str,
    ) -> (Router, Arc<CannedGateway>) {
        let gateway = Arc::new(CannedGateway {
            profile_reply,
            calls: AtomicUsize::new(0),
        });
        let state = AppState {
            gateway: gateway.clone(),
            extractor: Arc::new(StubExtractor),
            config,
        };
        (build_router(state), gateway)
    }

    fn upload_request(field: &str, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    const PROFILE_REPLY: &str = r#"{"experience_level": "Junior", "country": "Ireland",
        "skills": ["Python", "C++"], "suggested_job_titles": ["Data Analyst", "QA Engineer", "Support Engineer"]}"#;

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), PROFILE_REPLY);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_returns_analysis_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (app, gateway) = test_app(dir.path(), PROFILE_REPLY);

        let response = app
            .oneshot(upload_request("resume", "cv.pdf", "Jane Roe, Dublin, Python"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["message"], "Resume analyzed successfully");
        assert_eq!(body["experience_level"], "Junior");
        assert_eq!(body["country"], "Ireland");
        assert_eq!(
            body["course_recommendations"][1]["coursera_url"],
            "https://www.coursera.org/search?query=C%2B%2B"
        );
        assert_eq!(body["job_results"].as_array().unwrap().len(), 3);
        assert_eq!(body["job_results"][0]["location"], "Ireland");
        assert_eq!(body["cv_strength"], "Weak");
        assert_eq!(body["improvement_suggestions"][0], "- Add contact details");

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_unsupported_type_rejected_before_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let (app, gateway) = test_app(dir.path(), PROFILE_REPLY);

        let response = app
            .oneshot(upload_request("resume", "cv.docx", "whatever"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"]["message"],
            "Only PDF or image files allowed."
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_missing_resume_field_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = test_app(dir.path(), PROFILE_REPLY);

        let response = app
            .oneshot(upload_request("avatar", "cv.pdf", "text"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unparseable_profile_is_bad_gateway_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (app, gateway) = test_app(dir.path(), "Sorry, I can't help with that.");

        let response = app
            .oneshot(upload_request("resume", "cv.pdf", "Jane Roe"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["error"]["code"], "LLM_ERROR");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_payload_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            max_upload_bytes: 256,
            ..test_config(dir.path().to_path_buf())
        };
        let (app, gateway) = test_app_with_config(config, PROFILE_REPLY);

        let response = app
            .oneshot(upload_request("resume", "cv.pdf", &"x".repeat(4096)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(dir_is_empty(dir.path()));
    }
}
