use axum::{extract::State, response::Json};

use crate::{error::AppError, handlers::AppState, models::DashboardStats, services::AuthUser};

/// 仪表盘统计
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "报告管理",
    responses(
        (status = 200, description = "统计成功", body = DashboardStats),
        (status = 401, description = "未登录"),
        (status = 503, description = "数据库服务不可用")
    )
)]
pub async fn get_dashboard_stats(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardStats>, AppError> {
    let reports = app_state.store()?.list_for_user(&user.id).await?;
    Ok(Json(DashboardStats::from_reports(&reports)))
}
