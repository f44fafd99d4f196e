pub mod memory;
pub mod report;

pub use memory::MemoryReportStore;
pub use report::PgReportRepository;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{NewReport, Report},
};

/// 报告存储接口
///
/// 所有查询都按用户隔离。
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// 插入报告；同一 session_id 重复时返回 Conflict
    async fn insert(&self, report: NewReport) -> AppResult<Report>;

    /// 列出用户的全部报告，按 id 倒序
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Report>>;

    async fn find_by_id(&self, user_id: &str, id: i64) -> AppResult<Option<Report>>;

    async fn find_by_session_id(&self, user_id: &str, session_id: &str) -> AppResult<Option<Report>>;

    /// 存储健康检查
    async fn health_check(&self) -> AppResult<bool>;

    /// 存储类型（用于日志和系统信息）
    fn backend_name(&self) -> &'static str;
}
