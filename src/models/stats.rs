use super::Report;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 仪表盘统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// 报告总数
    pub total_reports: i64,
    /// 阳性报告数
    pub cancer_positive: i64,
    /// 全部报告的平均置信度（百分比数值）
    pub average_confidence: f64,
    /// 阳性报告的平均置信度
    pub positive_average_confidence: f64,
    /// 统计时间
    pub timestamp: String,
}

impl DashboardStats {
    /// 基于报告列表计算统计值
    ///
    /// 无法解析的置信度（历史数据中的 "N/A"）不参与平均值计算，但计入总数。
    pub fn from_reports(reports: &[Report]) -> Self {
        let total_reports = reports.len() as i64;
        let cancer_positive = reports.iter().filter(|r| r.is_positive()).count() as i64;

        let average_confidence = mean(reports.iter().filter_map(|r| r.confidence_value()));
        let positive_average_confidence = mean(
            reports
                .iter()
                .filter(|r| r.is_positive())
                .filter_map(|r| r.confidence_value()),
        );

        Self {
            total_reports,
            cancer_positive,
            average_confidence,
            positive_average_confidence,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn mean(values: impl Iterator<Item = super::Confidence>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), c| (sum + c.value(), count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(id: i64, verdict: &str, confidence: &str) -> Report {
        Report {
            id,
            session_id: id.to_string(),
            user_id: Some("user_1".to_string()),
            analysis_results: Some(verdict.to_string()),
            confidence: Some(confidence.to_string()),
            evidence: None,
            extracted_text: None,
            conversation: None,
            notes: None,
            created_at: "2025-09-16T10:30:00Z".to_string(),
        }
    }

    #[test]
    fn test_empty_stats_are_zero() {
        let stats = DashboardStats::from_reports(&[]);
        assert_eq!(stats.total_reports, 0);
        assert_eq!(stats.cancer_positive, 0);
        assert_eq!(stats.average_confidence, 0.0);
        assert_eq!(stats.positive_average_confidence, 0.0);
    }

    #[test]
    fn test_means() {
        let reports = vec![
            report(1, "Cancer Positive", "92%"),
            report(2, "Cancer Negative", "89%"),
            report(3, "Cancer Positive", "80%"),
        ];
        let stats = DashboardStats::from_reports(&reports);
        assert_eq!(stats.total_reports, 3);
        assert_eq!(stats.cancer_positive, 2);
        assert!((stats.average_confidence - (92.0 + 89.0 + 80.0) / 3.0).abs() < 1e-9);
        assert!((stats.positive_average_confidence - 86.0).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_confidence_excluded_from_mean() {
        let reports = vec![
            report(1, "Processing", "N/A"),
            report(2, "Cancer Negative", "90%"),
        ];
        let stats = DashboardStats::from_reports(&reports);
        assert_eq!(stats.total_reports, 2);
        assert_eq!(stats.average_confidence, 90.0);
        assert_eq!(stats.positive_average_confidence, 0.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(DashboardStats::from_reports(&[])).unwrap();
        for key in [
            "totalReports",
            "cancerPositive",
            "averageConfidence",
            "positiveAverageConfidence",
            "timestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }
}
