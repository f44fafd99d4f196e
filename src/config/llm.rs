use serde::{Deserialize, Serialize};

/// 大模型（OpenAI 兼容 Chat Completions）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API 基础URL（如 https://openrouter.ai/api/v1）
    pub base_url: String,
    /// API 密钥，留空时可通过 OPEN_ROUTER_API_KEY 环境变量提供
    #[serde(default)]
    pub api_key: String,
    /// 模型名称
    pub model: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 作为 HTTP-Referer 头发送的站点地址
    pub site_url: Option<String>,
    /// 作为 X-Title 头发送的站点名称
    pub site_name: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "openai/gpt-oss-120b".to_string(),
            timeout_secs: 120,
            site_url: None,
            site_name: None,
        }
    }
}

impl LlmConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("模型 base_url 不能为空".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("模型 base_url 必须以 http:// 或 https:// 开头".to_string());
        }

        if self.model.trim().is_empty() {
            return Err("模型名称不能为空".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("请求超时必须大于0".to_string());
        }

        Ok(())
    }

    /// 是否已配置密钥
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// 获取完整的API URL
    pub fn get_api_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        format!("{}/{}", base, endpoint)
    }
}
