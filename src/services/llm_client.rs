use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::{
    config::llm::LlmConfig,
    error::{AppError, AppResult},
};

/// 对话模型接口
///
/// 只负责一次请求/响应，提示词与结果解析由上层负责。
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 发送系统提示词与用户消息，返回模型回复的原始文本
    async fn complete(&self, system_prompt: &str, user_message: &str) -> AppResult<String>;

    /// 模型名称（用于日志）
    fn model_name(&self) -> &str;
}

/// Chat Completions 请求体
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat Completions 响应体（只解析用到的字段）
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI 兼容接口客户端（OpenRouter 等）
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    http: Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    pub fn new(config: LlmConfig) -> AppResult<Self> {
        if !config.is_configured() {
            return Err(AppError::config("未配置模型 API 密钥"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("创建HTTP客户端失败: {}", e)))?;

        info!(
            "模型客户端初始化完成: base_url={}, model={}",
            config.base_url, config.model
        );

        Ok(Self { http, config })
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> AppResult<String> {
        let url = self.config.get_api_url("/chat/completions");
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
        };

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if let Some(site_url) = &self.config.site_url {
            request = request.header("HTTP-Referer", site_url);
        }
        if let Some(site_name) = &self.config.site_name {
            request = request.header("X-Title", site_name);
        }

        debug!("请求模型: {}", url);
        let response = request
            .send()
            .await
            .map_err(|e| AppError::classification(format!("请求模型服务失败: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::classification(format!("读取模型响应失败: {}", e)))?;

        if !status.is_success() {
            let preview = text.chars().take(200).collect::<String>();
            error!(%status, preview = %preview, "模型服务返回错误");
            return Err(AppError::classification(format!(
                "模型服务返回错误: status={}, body_preview={}",
                status, preview
            )));
        }

        extract_message_content(&text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// 从 Chat Completions 响应中取出第一条回复内容
fn extract_message_content(body: &str) -> AppResult<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| AppError::classification(format!("模型响应格式无效: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AppError::classification("模型未返回内容"))
}
