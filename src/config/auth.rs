use serde::{Deserialize, Serialize};

/// 身份提供方类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProviderKind {
    /// 调用托管身份服务的 userinfo 接口校验会话
    Remote,
    /// 使用配置文件中的固定 token（开发环境）
    Static,
}

/// 固定 token 与用户的映射
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
    pub email: Option<String>,
}

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub provider: AuthProviderKind,
    /// OIDC 风格 userinfo 地址
    pub userinfo_url: String,
    /// 会话 cookie 名称
    pub session_cookie: String,
    /// userinfo 请求超时（秒）
    pub timeout_secs: u64,
    #[serde(default)]
    pub static_tokens: Vec<StaticToken>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            provider: AuthProviderKind::Remote,
            userinfo_url: "https://auth.example.com/oauth/userinfo".to_string(),
            session_cookie: "__session".to_string(),
            timeout_secs: 10,
            static_tokens: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.session_cookie.trim().is_empty() {
            return Err("会话 cookie 名称不能为空".to_string());
        }

        match self.provider {
            AuthProviderKind::Remote => {
                if !self.userinfo_url.starts_with("http://")
                    && !self.userinfo_url.starts_with("https://")
                {
                    return Err("userinfo_url 必须以 http:// 或 https:// 开头".to_string());
                }
                if self.timeout_secs == 0 {
                    return Err("认证请求超时必须大于0".to_string());
                }
            }
            AuthProviderKind::Static => {
                if self.static_tokens.iter().any(|t| t.token.trim().is_empty()) {
                    return Err("固定 token 不能为空".to_string());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_rejects_blank_token() {
        let config = AuthConfig {
            provider: AuthProviderKind::Static,
            static_tokens: vec![StaticToken {
                token: "".to_string(),
                user_id: "u1".to_string(),
                email: None,
            }],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_provider_kind_serde() {
        let kind: AuthProviderKind = serde_json::from_str("\"static\"").unwrap();
        assert_eq!(kind, AuthProviderKind::Static);
    }
}
