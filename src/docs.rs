use crate::{
    handlers::{
        pdf::PdfToJsonResponse,
        report_query::SessionReportResponse,
        system::{DatabaseHealthResponse, HealthResponse, SystemInfo},
    },
    models::{AnalysisResult, DashboardStats, ReportDetail, ReportSummary},
    response::ErrorBody,
    services::AnalysisReport,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // 报告API
        crate::handlers::pdf::pdf_to_json,
        crate::handlers::report_generation::generate_report,
        crate::handlers::report_query::list_reports,
        crate::handlers::report_query::get_report,
        crate::handlers::report_query::get_session_report,
        crate::handlers::dashboard::get_dashboard_stats,
        // 系统API
        crate::handlers::system::health_check,
        crate::handlers::system::database_health,
        crate::handlers::system::system_info,
    ),
    components(
        schemas(
            PdfToJsonResponse,
            AnalysisReport,
            AnalysisResult,
            ReportSummary,
            ReportDetail,
            SessionReportResponse,
            DashboardStats,
            HealthResponse,
            DatabaseHealthResponse,
            SystemInfo,
            ErrorBody,
        )
    ),
    tags(
        (name = "报告管理", description = "PDF解析、报告分析与查询（需登录）"),
        (name = "系统", description = "健康检查与系统信息")
    ),
    info(
        title = "OncoScan API",
        version = "0.1.0",
        description = "医疗报告癌症筛查后端：PDF文本提取、模型分析与报告管理"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_all_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/pdf-to-json",
            "/api/report-generation",
            "/api/data",
            "/api/reports/{id}",
            "/api/report/{session_id}",
            "/api/dashboard/stats",
            "/health",
            "/api/health/db",
            "/api/system/info",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_openapi_request_bodies() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = &doc["paths"];
        assert!(
            paths["/api/pdf-to-json"]["post"]["requestBody"]["content"]["multipart/form-data"]
                .is_object()
        );
        assert!(
            paths["/api/report-generation"]["post"]["requestBody"]["content"]["application/json"]
                .is_object()
        );
    }
}
