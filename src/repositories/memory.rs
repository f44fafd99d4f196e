use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ReportStore;
use crate::{
    error::{AppError, AppResult},
    models::{NewReport, Report},
};

/// 内存报告存储（演示模式与测试使用）
#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: RwLock<Vec<Report>>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并预置报告，重复的 session_id 会被忽略
    pub async fn seeded(reports: Vec<NewReport>) -> Self {
        let store = Self::new();
        for report in reports {
            if let Err(e) = store.insert(report).await {
                tracing::warn!("预置报告失败: {}", e);
            }
        }
        store
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(&self, report: NewReport) -> AppResult<Report> {
        let mut reports = self.reports.write().await;
        if reports.iter().any(|r| r.session_id == report.session_id) {
            return Err(AppError::conflict(format!(
                "会话 {} 已存在",
                report.session_id
            )));
        }

        let id = reports.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let report = report.into_report(id);
        reports.push(report.clone());
        Ok(report)
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Report>> {
        let reports = self.reports.read().await;
        let mut owned: Vec<Report> = reports
            .iter()
            .filter(|r| r.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(owned)
    }

    async fn find_by_id(&self, user_id: &str, id: i64) -> AppResult<Option<Report>> {
        let reports = self.reports.read().await;
        Ok(reports
            .iter()
            .find(|r| r.id == id && r.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn find_by_session_id(&self, user_id: &str, session_id: &str) -> AppResult<Option<Report>> {
        let reports = self.reports.read().await;
        Ok(reports
            .iter()
            .find(|r| r.session_id == session_id && r.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
