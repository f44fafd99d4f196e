use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    response::Json,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    docs::ApiDoc,
    err_response,
    handlers::{
        AppState, database_health, generate_report, get_dashboard_stats, get_report,
        get_session_report, health_check, list_reports, pdf_to_json, system_info,
    },
    response::{ErrorBody, ResponseCode},
};

/// multipart 边界与表单头的余量
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// 创建API路由（均需登录）
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pdf-to-json", post(pdf_to_json)) // 上传PDF并提取文本
        .route("/api/report-generation", post(generate_report)) // 模型分析并保存
        .route("/api/data", get(list_reports)) // 报告列表
        .route("/api/dashboard/stats", get(get_dashboard_stats)) // 仪表盘统计
        .route("/api/reports/{id}", get(get_report)) // 报告详情
        .route("/api/report/{session_id}", get(get_session_report)) // 按会话查询报告
}

/// 公开路由：健康检查、系统信息与接口文档
pub fn create_public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health/db", get(database_health))
        .route("/api/system/info", get(system_info))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
}

/// 组装完整应用
pub fn build_app(app_state: AppState) -> Router {
    let body_limit = app_state.config.file.max_size as usize + MULTIPART_OVERHEAD;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(create_public_routes())
        .merge(create_api_routes())
        .fallback(route_not_found)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn route_not_found() -> ErrorBody {
    err_response!(ResponseCode::NOT_FOUND, "接口不存在")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        file_processing::{FileProcessingConfig, FileProcessor, extractor::tests::sample_pdf},
        repositories::{MemoryReportStore, ReportStore},
        services::{
            ReportAnalyzer, StaticAuthenticator, demo_data,
            report_analyzer::tests::CannedModel,
        },
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const POSITIVE_REPLY: &str = r#"```json
{"analysisResults":"Cancer Positive","confidence":"92%","evidence":"Malignant cells in biopsy"}
```"#;

    fn test_state(store: Option<Arc<dyn ReportStore>>, reply: Option<&str>) -> AppState {
        let authenticator = StaticAuthenticator::default()
            .with_token("t1", "user_1")
            .with_token("t2", "user_2");

        AppState {
            store,
            analyzer: reply.map(|r| ReportAnalyzer::new(Arc::new(CannedModel::new(r)))),
            authenticator: Arc::new(authenticator),
            file_processor: FileProcessor::new(FileProcessingConfig::default()),
            config: Config::default(),
        }
    }

    fn memory_state() -> AppState {
        test_state(Some(Arc::new(MemoryReportStore::new())), Some(POSITIVE_REPLY))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_as(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn generate_as(token: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/report-generation")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_upload(field: &str, content: &[u8]) -> Request<Body> {
        let boundary = "X-ONCOSCAN-BOUNDARY";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"{f}\"; filename=\"report.pdf\"\r\nContent-Type: application/pdf\r\n\r\n",
                b = boundary,
                f = field
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/pdf-to-json")
            .header(header::AUTHORIZATION, "Bearer t1")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_protected_routes_require_login() {
        let app = build_app(memory_state());

        for uri in ["/api/data?sessionId=all", "/api/dashboard/stats", "/api/reports/1"] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (status, body) = send(&app, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }

        let (status, _) = send(&app, get_as("/api/data", "wrong-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_public_routes() {
        let app = build_app(memory_state());

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let request = Request::builder().uri("/api/health/db").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["backend"], "memory");

        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/report-generation"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = build_app(memory_state());
        let request = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], ResponseCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pdf_upload_rejections() {
        let app = build_app(memory_state());

        let (status, _) = send(&app, multipart_upload("pdf", b"plain text, not a pdf")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, _) = send(&app, multipart_upload("file", b"%PDF-1.4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pdf_upload_extracts_pages() {
        let app = build_app(memory_state());
        let pdf = sample_pdf(&["Biopsy carcinoma", "Second page text", "Third page"]);

        let (status, body) = send(&app, multipart_upload("pdf", &pdf)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["pages"], 3);
        assert_eq!(body["fileName"], "report.pdf");
        assert_eq!(body["sha256"].as_str().unwrap().len(), 64);

        let text = body["text"].as_object().unwrap();
        let keys: Vec<_> = text.keys().cloned().collect();
        assert_eq!(keys, ["page_1", "page_2", "page_3"]);
        let page = |key: &str| {
            text[key]
                .as_array()
                .unwrap()
                .iter()
                .map(|line| line.as_str().unwrap())
                .collect::<Vec<_>>()
                .join(" ")
        };
        assert!(page("page_1").contains("Biopsy carcinoma"));
        assert!(page("page_2").contains("Second page text"));
        assert!(page("page_3").contains("Third page"));

        let extracted = body["extractedText"].as_str().unwrap();
        let first = extracted.find("Biopsy").unwrap();
        let second = extracted.find("Second page").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_pdf_upload_too_large() {
        let mut state = memory_state();
        state.config.file.max_size = 1024;
        state.file_processor = FileProcessor::new(FileProcessingConfig::from(&state.config.file));
        let app = build_app(state);

        // 超过文件大小限制
        let mut content = b"%PDF-1.4\n".to_vec();
        content.resize(2048, b' ');
        let (status, body) = send(&app, multipart_upload("pdf", &content)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], ResponseCode::FILE_TOO_LARGE);

        // 超过请求体限制
        content.resize(1024 + MULTIPART_OVERHEAD + 1, b' ');
        let (status, _) = send(&app, multipart_upload("pdf", &content)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_upload_then_generate() {
        let app = build_app(memory_state());
        let pdf = sample_pdf(&["Biopsy carcinoma", "Second page text"]);

        let (status, upload) = send(&app, multipart_upload("pdf", &pdf)).await;
        assert_eq!(status, StatusCode::OK);

        // 上传页面将 pdf-to-json 的完整响应作为 pdfContent 提交
        let (status, body) = send(
            &app,
            generate_as(
                "t1",
                json!({
                    "sessionId": "1757000000000",
                    "createdAt": "2025-09-04T08:00:00.000Z",
                    "pdfContent": upload
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["sessionId"], "1757000000000");
        assert_eq!(body["analysisResults"], "Cancer Positive");
        let extracted = body["extractedText"].as_str().unwrap();
        assert!(extracted.contains("Biopsy"));
        assert!(extracted.contains("Second page"));

        let (_, list) = send(&app, get_as("/api/data?sessionId=1757000000000", "t1")).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_session_report() {
        let store = MemoryReportStore::seeded(demo_data::sample_reports("user_1")).await;
        let app = build_app(test_state(Some(Arc::new(store)), None));

        let (status, body) = send(&app, get_as("/api/report/1726566400000", "t1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["report"]["id"], "2");
        assert_eq!(body["report"]["sessionId"], "1726566400000");
        assert_eq!(body["report"]["analysisResults"], "Cancer Negative");
        assert!(body["timestamp"].is_string());

        let (status, body) = send(&app, get_as("/api/report/1726566400000", "t2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, get_as("/api/report/unknown", "t1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let request = Request::builder()
            .uri("/api/report/1726566400000")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_generate_then_list() {
        let app = build_app(memory_state());

        for session_id in ["1726480000000", "1726566400000"] {
            let (status, body) = send(
                &app,
                generate_as(
                    "t1",
                    json!({
                        "sessionId": session_id,
                        "extractedText": "Biopsy: invasive ductal carcinoma",
                        "createdAt": "2025-09-16T10:30:00.000Z"
                    }),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["sessionId"], session_id);
            assert_eq!(body["analysisResults"], "Cancer Positive");
            assert_eq!(body["confidence"], "92%");
            assert_eq!(body.as_object().unwrap().len(), 6);
        }

        let (status, body) = send(&app, get_as("/api/data?sessionId=all", "t1")).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["sessionId"], "1726566400000");
        assert_eq!(list[0]["filename"], "report-2.pdf");
        assert_eq!(list[1]["id"], "1");

        let (_, body) = send(&app, get_as("/api/data?sessionId=1726480000000", "t1")).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        // 其他用户看不到
        let (_, body) = send(&app, get_as("/api/data", "t2")).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_session_conflict() {
        let app = build_app(memory_state());
        let payload = json!({"sessionId": "42", "extractedText": "normal CBC"});

        let (status, _) = send(&app, generate_as("t1", payload.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, generate_as("t1", payload.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], ResponseCode::CONFLICT);

        // 另一个用户使用相同 sessionId 同样冲突（全局唯一）
        let (status, _) = send(&app, generate_as("t2", payload)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_body_and_unparseable_reply() {
        let app = build_app(memory_state());
        let request = Request::builder()
            .method("POST")
            .uri("/api/report-generation")
            .header(header::AUTHORIZATION, "Bearer t1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let app = build_app(test_state(
            Some(Arc::new(MemoryReportStore::new())),
            Some("sorry, I can't"),
        ));
        let (status, body) = send(&app, generate_as("t1", json!({"extractedText": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], ResponseCode::CLASSIFIER_ERROR);
    }

    #[tokio::test]
    async fn test_degraded_services_return_503() {
        let app = build_app(test_state(None, None));

        let (status, _) = send(&app, get_as("/api/data", "t1")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(&app, generate_as("t1", json!({"extractedText": "x"}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let request = Request::builder().uri("/api/health/db").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let request = Request::builder()
            .uri("/api/system/info")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"], "unavailable");
        assert_eq!(body["llmAvailable"], false);
    }

    #[tokio::test]
    async fn test_report_detail_by_id_or_session() {
        let store = MemoryReportStore::seeded(demo_data::sample_reports("user_1")).await;
        let app = build_app(test_state(Some(Arc::new(store)), None));

        let (status, by_id) = send(&app, get_as("/api/reports/1", "t1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_id["uploadDate"], "September 16, 2025");
        assert_eq!(by_id["confidence"], "92%");

        let (_, by_session) = send(&app, get_as("/api/reports/1726480000000", "t1")).await;
        assert_eq!(by_session["id"], "1");

        // 重复读取结果一致
        let (_, again) = send(&app, get_as("/api/reports/1", "t1")).await;
        assert_eq!(by_id, again);

        let (status, _) = send(&app, get_as("/api/reports/999", "t1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, get_as("/api/reports/1", "t2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let store = MemoryReportStore::seeded(demo_data::sample_reports("user_1")).await;
        let app = build_app(test_state(Some(Arc::new(store)), None));

        let (status, body) = send(&app, get_as("/api/dashboard/stats", "t1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalReports"], 2);
        assert_eq!(body["cancerPositive"], 1);
        assert_eq!(body["averageConfidence"], 90.5);
        assert_eq!(body["positiveAverageConfidence"], 92.0);

        let (_, body) = send(&app, get_as("/api/dashboard/stats", "t2")).await;
        assert_eq!(body["totalReports"], 0);
        assert_eq!(body["averageConfidence"], 0.0);
    }
}
