use async_trait::async_trait;

use super::ReportStore;
use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{NewReport, Report},
};

const REPORT_COLUMNS: &str = r#"
    id, session_id, user_id, analysis_results, confidence, evidence,
    extracted_text, conversation, notes, created_at
"#;

/// 报告仓库（PostgreSQL）
#[derive(Clone)]
pub struct PgReportRepository {
    db: Database,
}

impl PgReportRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReportStore for PgReportRepository {
    async fn insert(&self, report: NewReport) -> AppResult<Report> {
        let session_id = report.session_id.clone();

        sqlx::query_as::<_, Report>(&format!(
            r#"
            INSERT INTO session_reports (
                session_id, user_id, analysis_results, confidence,
                evidence, extracted_text, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        ))
        .bind(report.session_id)
        .bind(report.user_id)
        .bind(report.analysis_results.as_str())
        .bind(report.confidence.to_string())
        .bind(report.evidence)
        .bind(report.extracted_text)
        .bind(report.created_at)
        .fetch_one(self.db.pool())
        .await
        .map_err(|e| AppError::from_insert_error(e, &format!("会话 {}", session_id)))
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM session_reports WHERE user_id = $1 ORDER BY id DESC",
            REPORT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(reports)
    }

    async fn find_by_id(&self, user_id: &str, id: i64) -> AppResult<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM session_reports WHERE id = $1 AND user_id = $2",
            REPORT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(report)
    }

    async fn find_by_session_id(&self, user_id: &str, session_id: &str) -> AppResult<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(&format!(
            "SELECT {} FROM session_reports WHERE session_id = $1 AND user_id = $2",
            REPORT_COLUMNS
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(report)
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.db.health_check().await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
