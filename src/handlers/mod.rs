pub mod dashboard;
pub mod pdf;
pub mod report_generation;
pub mod report_query;
pub mod system;

pub use dashboard::get_dashboard_stats;
pub use pdf::pdf_to_json;
pub use report_generation::generate_report;
pub use report_query::{get_report, get_session_report, list_reports};
pub use system::{database_health, health_check, system_info};

use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    file_processing::FileProcessor,
    repositories::ReportStore,
    services::{Authenticator, ReportAnalyzer},
};

/// 应用状态
///
/// 数据库或模型不可用时对应字段为 None，依赖它们的接口返回 503。
#[derive(Clone)]
pub struct AppState {
    pub store: Option<Arc<dyn ReportStore>>,
    pub analyzer: Option<ReportAnalyzer>,
    pub authenticator: Arc<dyn Authenticator>,
    pub file_processor: FileProcessor,
    pub config: Config,
}

impl AppState {
    pub fn store(&self) -> AppResult<&Arc<dyn ReportStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| AppError::service_unavailable("数据库服务不可用"))
    }

    pub fn analyzer(&self) -> AppResult<&ReportAnalyzer> {
        self.analyzer
            .as_ref()
            .ok_or_else(|| AppError::service_unavailable("模型服务未配置"))
    }
}
