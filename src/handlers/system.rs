use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, handlers::AppState};

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// 存储健康检查响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealthResponse {
    pub status: String,
    pub backend: String,
    pub timestamp: String,
}

/// 系统信息
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub name: String,
    pub version: String,
    /// 存储类型：postgres、memory 或 unavailable
    pub store: String,
    pub llm_model: String,
    pub llm_available: bool,
    pub demo_mode: bool,
    pub max_file_size: u64,
}

/// 服务存活检查
#[utoipa::path(
    get,
    path = "/health",
    tag = "系统",
    responses((status = 200, description = "服务运行中", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// 数据库健康检查
#[utoipa::path(
    get,
    path = "/api/health/db",
    tag = "系统",
    responses(
        (status = 200, description = "存储可用", body = DatabaseHealthResponse),
        (status = 503, description = "存储不可用")
    )
)]
pub async fn database_health(
    State(app_state): State<AppState>,
) -> Result<Json<DatabaseHealthResponse>, AppError> {
    let store = app_state.store()?;

    match store.health_check().await {
        Ok(true) => Ok(Json(DatabaseHealthResponse {
            status: "healthy".to_string(),
            backend: store.backend_name().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })),
        Ok(false) => Err(AppError::service_unavailable("数据库健康检查未通过")),
        Err(e) => {
            tracing::warn!("数据库健康检查失败: {}", e);
            Err(AppError::service_unavailable("数据库连接失败"))
        }
    }
}

/// 系统信息
#[utoipa::path(
    get,
    path = "/api/system/info",
    tag = "系统",
    responses((status = 200, description = "查询成功", body = SystemInfo))
)]
pub async fn system_info(State(app_state): State<AppState>) -> Json<SystemInfo> {
    let store = app_state
        .store
        .as_ref()
        .map(|s| s.backend_name())
        .unwrap_or("unavailable");

    Json(SystemInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
        llm_model: app_state.config.llm.model.clone(),
        llm_available: app_state.analyzer.is_some(),
        demo_mode: app_state.config.demo.enabled,
        max_file_size: app_state.file_processor.config().max_file_size,
    })
}
