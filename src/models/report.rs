use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// 分析结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AnalysisResult {
    /// 阳性
    #[serde(rename = "Cancer Positive")]
    CancerPositive,
    /// 阴性
    #[serde(rename = "Cancer Negative")]
    CancerNegative,
    /// 尚未得出结论（仅出现在历史数据中）
    Processing,
}

impl AnalysisResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisResult::CancerPositive => "Cancer Positive",
            AnalysisResult::CancerNegative => "Cancer Negative",
            AnalysisResult::Processing => "Processing",
        }
    }

    /// 是否为最终结论
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnalysisResult::Processing)
    }

    /// 宽松解析：忽略大小写、多余空白以及下划线/连字符
    pub fn parse_loose(value: &str) -> Option<Self> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect();

        match normalized.as_str() {
            "cancerpositive" => Some(AnalysisResult::CancerPositive),
            "cancernegative" => Some(AnalysisResult::CancerNegative),
            "processing" => Some(AnalysisResult::Processing),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| format!("未知的分析结论: {}", s))
    }
}

/// 置信度（百分比，0-100）
///
/// 数据库与接口中均以 `"92%"` 形式的字符串出现。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);

    /// 由数值创建，超出范围的值会被截断到 [0, 100]
    pub fn from_value(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        // +0.0 消除 -0.0
        Some(Self(value.clamp(0.0, 100.0) + 0.0))
    }

    /// 解析 "92%"、"92"、"92.5 %" 等形式
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        if number.is_empty() {
            return None;
        }
        number.parse::<f64>().ok().and_then(Self::from_value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 最多保留两位小数，f64 的 Display 不会输出多余的 0
        let rounded = (self.0 * 100.0).round() / 100.0;
        write!(f, "{}%", rounded)
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Confidence::parse(&text),
            Raw::Number(value) => Confidence::from_value(value),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("无效的置信度"))
    }
}

/// 报告记录（session_reports 表的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 自增主键
    pub id: i64,
    /// 客户端生成的会话ID（时间戳字符串）
    pub session_id: String,
    /// 所属用户（历史数据可能为空）
    pub user_id: Option<String>,
    /// 分析结论原始文本
    pub analysis_results: Option<String>,
    /// 置信度原始文本，如 "92%"
    pub confidence: Option<String>,
    /// 结论依据
    pub evidence: Option<String>,
    /// 提交给模型的PDF文本
    pub extracted_text: Option<String>,
    pub conversation: Option<serde_json::Value>,
    pub notes: Option<String>,
    /// 创建时间（RFC 3339 字符串）
    pub created_at: String,
}

impl Report {
    /// 结论；缺失或无法识别时视为 Processing
    pub fn verdict(&self) -> AnalysisResult {
        self.analysis_results
            .as_deref()
            .and_then(AnalysisResult::parse_loose)
            .unwrap_or(AnalysisResult::Processing)
    }

    pub fn is_positive(&self) -> bool {
        self.verdict() == AnalysisResult::CancerPositive
    }

    /// 可解析的置信度
    pub fn confidence_value(&self) -> Option<Confidence> {
        self.confidence.as_deref().and_then(Confidence::parse)
    }

    /// 对外展示的文件名
    pub fn filename(&self) -> String {
        format!("report-{}.pdf", self.id)
    }
}

/// 新建报告
#[derive(Debug, Clone)]
pub struct NewReport {
    pub session_id: String,
    pub user_id: String,
    pub analysis_results: AnalysisResult,
    pub confidence: Confidence,
    pub evidence: String,
    pub extracted_text: String,
    pub created_at: String,
}

impl NewReport {
    /// 转换为带主键的记录（内存存储使用）
    pub fn into_report(self, id: i64) -> Report {
        Report {
            id,
            session_id: self.session_id,
            user_id: Some(self.user_id),
            analysis_results: Some(self.analysis_results.to_string()),
            confidence: Some(self.confidence.to_string()),
            evidence: Some(self.evidence),
            extracted_text: Some(self.extracted_text),
            conversation: None,
            notes: None,
            created_at: self.created_at,
        }
    }
}

/// 报告列表项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub filename: String,
    pub created_at: String,
    pub analysis_results: String,
    pub confidence: String,
    pub evidence: String,
    pub extracted_text: String,
    pub session_id: String,
    pub user_id: String,
}

impl ReportSummary {
    pub fn from_report(report: &Report, user_id: &str) -> Self {
        Self {
            id: report.id.to_string(),
            filename: report.filename(),
            created_at: report.created_at.clone(),
            analysis_results: report.verdict().to_string(),
            confidence: display_confidence(report),
            evidence: report.evidence.clone().unwrap_or_default(),
            extracted_text: report.extracted_text.clone().unwrap_or_default(),
            session_id: report.session_id.clone(),
            user_id: report
                .user_id
                .clone()
                .unwrap_or_else(|| user_id.to_string()),
        }
    }
}

/// 报告详情
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    pub id: String,
    pub session_id: String,
    pub filename: String,
    /// 形如 "September 16, 2025"
    pub upload_date: String,
    pub analysis_results: String,
    pub confidence: String,
    pub evidence: String,
    pub extracted_text: String,
    pub created_at: String,
    pub notes: Option<String>,
    pub conversation: Option<serde_json::Value>,
}

impl From<&Report> for ReportDetail {
    fn from(report: &Report) -> Self {
        Self {
            id: report.id.to_string(),
            session_id: report.session_id.clone(),
            filename: report.filename(),
            upload_date: format_upload_date(&report.created_at),
            analysis_results: report.verdict().to_string(),
            confidence: display_confidence(report),
            evidence: report.evidence.clone().unwrap_or_default(),
            extracted_text: report.extracted_text.clone().unwrap_or_default(),
            created_at: report.created_at.clone(),
            notes: report.notes.clone(),
            conversation: report.conversation.clone(),
        }
    }
}

fn display_confidence(report: &Report) -> String {
    match report.confidence_value() {
        Some(confidence) => confidence.to_string(),
        None => "N/A".to_string(),
    }
}

/// 将 RFC 3339 时间格式化为 "September 16, 2025"，无法解析时原样返回
pub fn format_upload_date(created_at: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(created_at) {
        Ok(dt) => dt.format("%B %-d, %Y").to_string(),
        Err(_) => created_at.to_string(),
    }
}
