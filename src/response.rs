use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 统一错误响应格式
///
/// 成功响应直接返回业务JSON（前端按原始结构消费），失败时统一返回此结构。
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// 固定为 false
    pub success: bool,
    /// 错误信息
    pub error: String,
    /// 业务响应码
    pub code: i32,
}

impl ErrorBody {
    /// 创建错误响应
    pub fn new(code: i32, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code,
        }
    }

    /// 使用响应码的默认消息创建错误响应
    pub fn from_code(code: i32) -> Self {
        Self::new(code, ResponseCode::get_message(code))
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        (ResponseCode::status_of(self.code), Json(self)).into_response()
    }
}

/// 业务响应码常量
pub struct ResponseCode;

impl ResponseCode {
    /// 成功响应码
    pub const SUCCESS: i32 = 200;

    /// 客户端错误 4xx
    pub const BAD_REQUEST: i32 = 400;
    pub const UNAUTHORIZED: i32 = 401;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const FILE_TOO_LARGE: i32 = 413;
    pub const UNSUPPORTED_FILE_TYPE: i32 = 415;

    /// 服务器错误 5xx
    pub const INTERNAL_ERROR: i32 = 500;
    pub const DATABASE_ERROR: i32 = 501;
    pub const PDF_EXTRACTION_ERROR: i32 = 502;
    pub const CLASSIFIER_ERROR: i32 = 503;
    pub const AUTH_PROVIDER_ERROR: i32 = 504;
    pub const SERVICE_UNAVAILABLE: i32 = 505;
}

impl ResponseCode {
    /// 响应码对应的默认消息
    pub fn get_message(code: i32) -> &'static str {
        match code {
            Self::SUCCESS => "操作成功",
            Self::BAD_REQUEST => "请求参数错误",
            Self::UNAUTHORIZED => "未登录或会话已失效",
            Self::NOT_FOUND => "资源不存在",
            Self::CONFLICT => "资源已存在",
            Self::FILE_TOO_LARGE => "文件过大",
            Self::UNSUPPORTED_FILE_TYPE => "不支持的文件类型",
            Self::INTERNAL_ERROR => "服务器内部错误",
            Self::DATABASE_ERROR => "数据库错误",
            Self::PDF_EXTRACTION_ERROR => "PDF解析失败",
            Self::CLASSIFIER_ERROR => "模型分析失败",
            Self::AUTH_PROVIDER_ERROR => "身份认证服务错误",
            Self::SERVICE_UNAVAILABLE => "服务不可用",
            _ => "未知错误",
        }
    }

    /// 根据业务响应码确定HTTP状态码
    pub fn status_of(code: i32) -> StatusCode {
        match code {
            Self::SUCCESS => StatusCode::OK,
            Self::BAD_REQUEST => StatusCode::BAD_REQUEST,
            Self::UNAUTHORIZED => StatusCode::UNAUTHORIZED,
            Self::NOT_FOUND => StatusCode::NOT_FOUND,
            Self::CONFLICT => StatusCode::CONFLICT,
            Self::FILE_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UNSUPPORTED_FILE_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            // 上游（模型、身份认证）失败
            Self::CLASSIFIER_ERROR | Self::AUTH_PROVIDER_ERROR => StatusCode::BAD_GATEWAY,
            Self::SERVICE_UNAVAILABLE => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 便捷的错误响应构造宏
#[macro_export]
macro_rules! err_response {
    ($code:expr) => {
        $crate::response::ErrorBody::from_code($code)
    };
    ($code:expr, $msg:expr) => {
        $crate::response::ErrorBody::new($code, $msg.to_string())
    };
}
