use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};

use crate::{
    error::AppError,
    handlers::AppState,
    services::{AnalysisReport, AnalysisRequest, AuthUser},
};

/// 分析报告文本并保存结果
#[utoipa::path(
    post,
    path = "/api/report-generation",
    tag = "报告管理",
    request_body(content = serde_json::Value, content_type = "application/json", description = "报告JSON：sessionId、extractedText 或 pdfContent、createdAt，其余字段原样提交给模型"),
    responses(
        (status = 200, description = "分析完成", body = AnalysisReport),
        (status = 400, description = "请求体无效或缺少报告文本"),
        (status = 401, description = "未登录"),
        (status = 409, description = "sessionId 已存在"),
        (status = 502, description = "模型调用或结果解析失败"),
        (status = 503, description = "数据库或模型服务不可用")
    )
)]
pub async fn generate_report(
    State(app_state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::bad_request(format!("请求体无效: {}", e.body_text())))?;

    let store = app_state.store()?;
    let analyzer = app_state.analyzer()?;

    // 已存在的会话不再调用模型
    if let Some(session_id) = request.session_id.as_deref().map(str::trim) {
        if !session_id.is_empty()
            && store
                .find_by_session_id(&user.id, session_id)
                .await?
                .is_some()
        {
            return Err(AppError::conflict(format!("会话 {} 已存在", session_id)));
        }
    }

    let report = analyzer.analyze(request).await?;
    let saved = store.insert(report.clone().into_new_report(&user.id)).await?;

    tracing::info!(
        user_id = %user.id,
        report_id = saved.id,
        session_id = %saved.session_id,
        result = %report.analysis_results,
        "报告已保存"
    );

    Ok(Json(report))
}
