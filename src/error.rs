use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::response::{ErrorBody, ResponseCode};

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("PDF解析失败: {0}")]
    PdfExtraction(String),

    #[error("模型分析失败: {0}")]
    Classification(String),

    #[error("身份认证服务错误: {0}")]
    AuthProvider(String),

    #[error("文件过大: 最大允许大小 {max_size} 字节")]
    FileTooLarge { max_size: u64 },

    #[error("不支持的文件类型: {file_type}")]
    UnsupportedFileType { file_type: String },

    #[error("未登录或会话已失效")]
    Unauthorized,

    #[error("资源冲突: {0}")]
    Conflict(String),

    #[error("服务不可用: {0}")]
    ServiceUnavailable(String),

    #[error("内部错误: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("资源不存在: {resource}")]
    NotFound { resource: String },
}

impl AppError {
    /// 业务响应码与对外消息
    pub fn code_and_message(&self) -> (i32, String) {
        match self {
            AppError::Database(_) => (ResponseCode::DATABASE_ERROR, "数据库错误".to_string()),
            AppError::Serialization(_) => {
                (ResponseCode::INTERNAL_ERROR, "数据序列化错误".to_string())
            }
            AppError::Io(_) => (ResponseCode::INTERNAL_ERROR, "文件IO错误".to_string()),
            AppError::Config(_) => (ResponseCode::INTERNAL_ERROR, "配置错误".to_string()),
            AppError::Validation(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::PdfExtraction(_) => (ResponseCode::PDF_EXTRACTION_ERROR, self.to_string()),
            AppError::Classification(_) => (ResponseCode::CLASSIFIER_ERROR, self.to_string()),
            AppError::AuthProvider(_) => (ResponseCode::AUTH_PROVIDER_ERROR, self.to_string()),
            AppError::FileTooLarge { max_size } => (
                ResponseCode::FILE_TOO_LARGE,
                format!("文件过大，最大允许大小: {} MB", max_size / 1024 / 1024),
            ),
            AppError::UnsupportedFileType { file_type } => (
                ResponseCode::UNSUPPORTED_FILE_TYPE,
                format!("不支持的文件类型: {}", file_type),
            ),
            AppError::Unauthorized => (ResponseCode::UNAUTHORIZED, self.to_string()),
            AppError::Conflict(msg) => (ResponseCode::CONFLICT, msg.clone()),
            AppError::ServiceUnavailable(msg) => (ResponseCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(_) => (ResponseCode::INTERNAL_ERROR, "服务器内部错误".to_string()),
            AppError::BadRequest(msg) => (ResponseCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { resource } => {
                (ResponseCode::NOT_FOUND, format!("资源不存在: {}", resource))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = self.code_and_message();

        // 客户端错误不需要 error 级别
        if code >= 500 {
            tracing::error!("应用错误: {}", self);
        } else {
            tracing::warn!("请求被拒绝: {}", self);
        }

        ErrorBody::new(code, message).into_response()
    }
}

/// 应用程序Result类型别名
pub type AppResult<T> = Result<T, AppError>;

/// 错误构造辅助函数
impl AppError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found<T: Into<String>>(resource: T) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn service_unavailable<T: Into<String>>(msg: T) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn file_too_large(max_size: u64) -> Self {
        Self::FileTooLarge { max_size }
    }

    pub fn unsupported_file_type<T: Into<String>>(file_type: T) -> Self {
        Self::UnsupportedFileType {
            file_type: file_type.into(),
        }
    }

    pub fn pdf_extraction<T: Into<String>>(msg: T) -> Self {
        Self::PdfExtraction(msg.into())
    }

    pub fn classification<T: Into<String>>(msg: T) -> Self {
        Self::Classification(msg.into())
    }

    pub fn auth_provider<T: Into<String>>(msg: T) -> Self {
        Self::AuthProvider(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    /// 将唯一约束冲突转换为 Conflict，其余数据库错误原样保留
    pub fn from_insert_error(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::conflict(format!("{} 已存在", what));
            }
        }
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_creation() {
        let err = AppError::validation("测试验证错误");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.to_string(), "验证错误: 测试验证错误");
    }

    #[test]
    fn test_file_too_large_error() {
        let err = AppError::file_too_large(10 * 1024 * 1024);
        let (code, msg) = err.code_and_message();
        assert_eq!(code, ResponseCode::FILE_TOO_LARGE);
        assert_eq!(msg, "文件过大，最大允许大小: 10 MB");
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let response = AppError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_classification_maps_to_bad_gateway() {
        let response = AppError::classification("无法解析模型输出").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_database_error_hides_details() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        let (code, msg) = err.code_and_message();
        assert_eq!(code, ResponseCode::DATABASE_ERROR);
        assert_eq!(msg, "数据库错误");
    }

    #[test]
    fn test_non_unique_insert_error_stays_database() {
        let err = AppError::from_insert_error(sqlx::Error::RowNotFound, "会话");
        assert!(matches!(err, AppError::Database(_)));
    }
}
