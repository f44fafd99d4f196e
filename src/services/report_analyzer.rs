use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    file_processing::PageTexts,
    models::{AnalysisResult, Confidence, NewReport},
    services::llm_client::ChatModel,
};

/// 癌症筛查系统提示词
pub const ANALYSIS_PROMPT: &str = r#"You are an advanced AI medical analysis agent tasked with analyzing a comprehensive JSON medical report to determine the likelihood of cancer. The JSON report contains fields such as patient notes, symptoms, conversation, diagnostic data, imaging results, and laboratory findings. Use all available methodologies, including keyword analysis, pattern recognition, and contextual understanding, to ensure high accuracy in your assessment.

Instructions:

1. Analyze the JSON input for medical indicators of cancer, including but not limited to:
    - Keywords: "tumor," "carcinoma," "malignant," "metastasis," "abnormal growth," "abnormal WBC," "blast cells," "suspicious MRI findings," "lesion," "neoplasm," "oncogenic markers."
    - Laboratory data: Abnormal blood counts, genetic markers (e.g., translocations, mutations), elevated tumor markers (e.g., CA-125, PSA).
    - Imaging results: Suspicious findings in MRI, CT, PET scans, or X-rays.
    - Pathology reports: Biopsy results, histopathological findings.

2. If the report contains strong evidence suggesting cancer (e.g., explicit mentions of cancer, abnormal cell counts, imaging findings, or genetic markers), set "analysisResults" to "Cancer Positive."

3. If no evidence of cancer is found, set "analysisResults" to "Cancer Negative."

4. Assign a "confidence" percentage as a string (e.g., "98%") based on the strength, clarity, and consistency of the evidence:
    - Use higher percentages for explicit cancer diagnoses or strong indicators (e.g., biopsy-confirmed malignancy, clear imaging findings).
    - Use lower percentages for ambiguous or inconclusive findings.

5. Provide an "evidence" field with a concise explanation of the decision, referencing specific findings in the report (e.g., "Presence of malignant cells in biopsy and suspicious lesion in MRI").

6. Include the "extractedText" field from the input JSON, if available. If not provided, use a summary of relevant report data or an empty string if no relevant text is found.

7. Preserve the original "sessionId" and "createdAt" fields from the input JSON.

Output JSON format:
{
  "sessionId": "string",
  "analysisResults": "Cancer Positive" | "Cancer Negative",
  "confidence": "string",
  "evidence": "string",
  "extractedText": "string",
  "createdAt": "ISO Date string"
}

Constraints:
- Return only valid JSON.
- Do not include explanations, commentary, or any text outside the JSON output.
- Ensure the "confidence" field is a percentage string (e.g., "98%").
- Use all available data and methodologies to maximize accuracy in the analysis.
- If specific cancer-related terms or findings are ambiguous, base the decision on the overall context of the report."#;

const DEFAULT_EVIDENCE: &str = "No significant findings";
const MAX_SESSION_ID_LEN: usize = 255;

/// 报告生成请求
///
/// `pdfContent` 通常是 `/api/pdf-to-json` 的完整响应，也可以只是分页对象。
/// 未识别的字段与 `pdfContent` 均原样转发给模型。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub session_id: Option<String>,
    pub extracted_text: Option<String>,
    pub pdf_content: Option<Value>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 模型分析结果（固定六个字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub session_id: String,
    pub analysis_results: AnalysisResult,
    #[schema(value_type = String, example = "92%")]
    pub confidence: Confidence,
    pub evidence: String,
    pub extracted_text: String,
    pub created_at: String,
}

impl AnalysisReport {
    /// 转换为待入库记录
    pub fn into_new_report(self, user_id: &str) -> NewReport {
        NewReport {
            session_id: self.session_id,
            user_id: user_id.to_string(),
            analysis_results: self.analysis_results,
            confidence: self.confidence,
            evidence: self.evidence,
            extracted_text: self.extracted_text,
            created_at: self.created_at,
        }
    }
}

/// 已补全的请求上下文
#[derive(Debug, Clone)]
struct ResolvedRequest {
    session_id: String,
    created_at: String,
    extracted_text: String,
    pdf_content: Option<Value>,
    extra: Map<String, Value>,
}

impl ResolvedRequest {
    fn resolve(request: AnalysisRequest) -> AppResult<Self> {
        let extracted_text = request
            .extracted_text
            .filter(|text| !text.trim().is_empty())
            .or_else(|| request.pdf_content.as_ref().and_then(pdf_content_text))
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::validation("缺少可分析的报告文本"))?;

        let session_id = match request.session_id.map(|s| s.trim().to_string()) {
            Some(id) if !id.is_empty() => id,
            _ => chrono::Utc::now().timestamp_millis().to_string(),
        };
        if session_id.len() > MAX_SESSION_ID_LEN {
            return Err(AppError::validation("sessionId 过长，最大支持255个字符"));
        }

        let created_at = request
            .created_at
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());

        Ok(Self {
            session_id,
            created_at,
            extracted_text,
            pdf_content: request.pdf_content,
            extra: request.extra,
        })
    }

    /// 发送给模型的JSON报告
    fn payload(&self) -> Value {
        let mut payload = self.extra.clone();
        payload.insert("sessionId".into(), Value::String(self.session_id.clone()));
        payload.insert("createdAt".into(), Value::String(self.created_at.clone()));
        payload.insert(
            "extractedText".into(),
            Value::String(self.extracted_text.clone()),
        );
        if let Some(content) = &self.pdf_content {
            payload.insert("pdfContent".into(), content.clone());
        }
        Value::Object(payload)
    }
}

/// 从 pdfContent 中取出报告文本
///
/// 完整响应优先使用其中的分页 `text`，其次 `extractedText`；
/// 否则按分页对象或纯文本处理。
fn pdf_content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => {
            let pages = map
                .get("text")
                .and_then(|text| PageTexts::deserialize(text).ok())
                .filter(PageTexts::has_text);
            if let Some(pages) = pages {
                return Some(pages.joined());
            }
            if let Some(text) = map.get("extractedText").and_then(Value::as_str) {
                return Some(text.to_string());
            }
            PageTexts::deserialize(content).ok().map(|pages| pages.joined())
        }
        _ => None,
    }
}

/// 报告分析服务：组装提示词、调用模型、规范化结果
#[derive(Clone)]
pub struct ReportAnalyzer {
    model: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for ReportAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportAnalyzer")
            .field("model", &self.model.model_name())
            .finish()
    }
}

impl ReportAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// 分析一份报告（单次同步调用，不重试）
    pub async fn analyze(&self, request: AnalysisRequest) -> AppResult<AnalysisReport> {
        let resolved = ResolvedRequest::resolve(request)?;

        let user_message = format!(
            "Analyze the following medical report JSON and provide the output strictly in the specified JSON format: {}",
            resolved.payload()
        );

        info!(
            session_id = %resolved.session_id,
            text_len = resolved.extracted_text.len(),
            model = self.model.model_name(),
            "提交报告分析"
        );

        let raw = self.model.complete(ANALYSIS_PROMPT, &user_message).await?;
        let output = parse_model_output(&raw)?;
        let report = normalize_report(output, &resolved)?;

        info!(
            session_id = %report.session_id,
            result = %report.analysis_results,
            confidence = %report.confidence,
            "报告分析完成"
        );

        Ok(report)
    }
}

/// 去除模型回复中的 markdown 代码块标记
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // 去掉语言标记，如 ```json
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// 解析模型输出为JSON对象
fn parse_model_output(raw: &str) -> AppResult<Map<String, Value>> {
    let text = strip_code_fences(raw);

    let parsed = serde_json::from_str::<Value>(text).or_else(|first_err| {
        // 模型偶尔在JSON前后附带说明文字
        match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<Value>(&text[start..=end]).map_err(|_| first_err)
            }
            _ => Err(first_err),
        }
    });

    match parsed {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::classification("模型输出不是JSON对象")),
        Err(e) => {
            let preview = text.chars().take(200).collect::<String>();
            warn!(preview = %preview, "无法解析模型输出");
            Err(AppError::classification(format!("无法解析模型输出: {}", e)))
        }
    }
}

/// 将模型输出规范化为固定结构
fn normalize_report(output: Map<String, Value>, request: &ResolvedRequest) -> AppResult<AnalysisReport> {
    let analysis_results = match output.get("analysisResults") {
        None | Some(Value::Null) => AnalysisResult::CancerNegative,
        Some(Value::String(s)) => match AnalysisResult::parse_loose(s) {
            Some(result) if result.is_terminal() => result,
            _ => {
                return Err(AppError::classification(format!(
                    "模型返回了无效的分析结论: {}",
                    s
                )));
            }
        },
        Some(other) => {
            return Err(AppError::classification(format!(
                "模型返回了无效的分析结论: {}",
                other
            )));
        }
    };

    let confidence = match output.get("confidence") {
        Some(Value::String(s)) => Confidence::parse(s),
        Some(Value::Number(n)) => n.as_f64().and_then(Confidence::from_value),
        _ => None,
    }
    .unwrap_or(Confidence::ZERO);

    let evidence = non_empty_str(&output, "evidence").unwrap_or(DEFAULT_EVIDENCE);
    let extracted_text =
        non_empty_str(&output, "extractedText").unwrap_or(&request.extracted_text);

    Ok(AnalysisReport {
        // 会话与时间始终以请求为准
        session_id: request.session_id.clone(),
        analysis_results,
        confidence,
        evidence: evidence.to_string(),
        extracted_text: extracted_text.to_string(),
        created_at: request.created_at.clone(),
    })
}

fn non_empty_str<'a>(output: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    output
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
