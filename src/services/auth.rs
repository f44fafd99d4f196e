use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use reqwest::Client;
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use tracing::{debug, warn};

use crate::{
    config::auth::{AuthConfig, StaticToken},
    error::{AppError, AppResult},
    handlers::AppState,
};

/// 已认证用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// 身份校验接口
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// 校验会话 token；无效返回 `Ok(None)`，身份服务不可用返回错误
    async fn authenticate(&self, token: &str) -> AppResult<Option<AuthUser>>;
}

/// 从请求头中取出会话 token：优先 `Authorization: Bearer`，其次会话 cookie
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// userinfo 响应（兼容 `sub` 与 `id` 两种字段）
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: Option<String>,
    id: Option<String>,
    email: Option<String>,
}

/// 托管身份服务校验
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    http: Client,
    userinfo_url: String,
}

impl RemoteAuthenticator {
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::config(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            http,
            userinfo_url: config.userinfo_url.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn authenticate(&self, token: &str) -> AppResult<Option<AuthUser>> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::auth_provider(format!("请求身份服务失败: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(%status, "身份服务拒绝会话");
            return Ok(None);
        }
        if !status.is_success() {
            warn!(%status, "身份服务返回错误");
            return Err(AppError::auth_provider(format!(
                "身份服务返回错误: status={}",
                status
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AppError::auth_provider(format!("身份服务响应格式无效: {}", e)))?;

        Ok(info
            .sub
            .or(info.id)
            .filter(|id| !id.is_empty())
            .map(|id| AuthUser {
                id,
                email: info.email,
            }))
    }
}

/// 固定 token 校验（开发环境与演示模式）
#[derive(Debug, Clone, Default)]
pub struct StaticAuthenticator {
    tokens: HashMap<String, AuthUser>,
}

impl StaticAuthenticator {
    pub fn new(tokens: &[StaticToken]) -> Self {
        let tokens = tokens
            .iter()
            .map(|t| {
                (
                    t.token.clone(),
                    AuthUser {
                        id: t.user_id.clone(),
                        email: t.email.clone(),
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(
            token.to_string(),
            AuthUser {
                id: user_id.to_string(),
                email: None,
            },
        );
        self
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> AppResult<Option<AuthUser>> {
        Ok(self.tokens.get(token).cloned())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers, &state.config.auth.session_cookie)
            .ok_or_else(AppError::unauthorized)?;

        match state.authenticator.authenticate(&token).await? {
            Some(user) => Ok(user),
            None => Err(AppError::unauthorized()),
        }
    }
}
