use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    handlers::AppState,
    models::{ReportDetail, ReportSummary},
    services::AuthUser,
};

/// 报告列表查询参数
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportListQuery {
    /// `all` 或省略返回全部报告，否则按会话ID过滤
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// 按会话查询报告的响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionReportResponse {
    pub success: bool,
    pub report: ReportDetail,
    pub timestamp: String,
}

/// 列出当前用户的报告
#[utoipa::path(
    get,
    path = "/api/data",
    tag = "报告管理",
    params(ReportListQuery),
    responses(
        (status = 200, description = "查询成功，按ID倒序", body = [ReportSummary]),
        (status = 401, description = "未登录"),
        (status = 503, description = "数据库服务不可用")
    )
)]
pub async fn list_reports(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<Vec<ReportSummary>>, AppError> {
    let store = app_state.store()?;

    let reports = match query.session_id.as_deref().map(str::trim) {
        None | Some("") | Some("all") => store.list_for_user(&user.id).await?,
        Some(session_id) => store
            .find_by_session_id(&user.id, session_id)
            .await?
            .into_iter()
            .collect(),
    };

    tracing::debug!(user_id = %user.id, count = reports.len(), "查询报告列表");

    Ok(Json(
        reports
            .iter()
            .map(|r| ReportSummary::from_report(r, &user.id))
            .collect(),
    ))
}

/// 获取报告详情
///
/// 路径参数先按数字ID查找，找不到再按会话ID查找。
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "报告管理",
    params(
        ("id" = String, Path, description = "报告数字ID或会话ID")
    ),
    responses(
        (status = 200, description = "查询成功", body = ReportDetail),
        (status = 401, description = "未登录"),
        (status = 404, description = "报告不存在"),
        (status = 503, description = "数据库服务不可用")
    )
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ReportDetail>, AppError> {
    let store = app_state.store()?;

    let by_id = match id.parse::<i64>() {
        Ok(numeric_id) => store.find_by_id(&user.id, numeric_id).await?,
        Err(_) => None,
    };

    let report = match by_id {
        Some(report) => report,
        None => store
            .find_by_session_id(&user.id, &id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("报告 {}", id)))?,
    };

    Ok(Json(ReportDetail::from(&report)))
}

/// 按会话ID获取报告
#[utoipa::path(
    get,
    path = "/api/report/{session_id}",
    tag = "报告管理",
    params(
        ("session_id" = String, Path, description = "会话ID")
    ),
    responses(
        (status = 200, description = "查询成功", body = SessionReportResponse),
        (status = 401, description = "未登录"),
        (status = 404, description = "该会话没有报告"),
        (status = 503, description = "数据库服务不可用")
    )
)]
pub async fn get_session_report(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionReportResponse>, AppError> {
    let store = app_state.store()?;

    let report = store
        .find_by_session_id(&user.id, session_id.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("会话 {} 的报告", session_id)))?;

    Ok(Json(SessionReportResponse {
        success: true,
        report: ReportDetail::from(&report),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
