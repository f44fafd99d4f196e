use axum::{
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    file_processing::PageTexts,
    handlers::AppState,
    services::AuthUser,
};

/// 上传表单中的 PDF 字段名
const PDF_FIELD: &str = "pdf";

/// PDF 转 JSON 响应
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PdfToJsonResponse {
    pub success: bool,
    /// 按页的文本行，键为 page_1、page_2 ...
    #[schema(value_type = Object)]
    pub text: PageTexts,
    /// 全部页面拼接后的文本
    pub extracted_text: String,
    /// 页数
    pub pages: usize,
    pub file_name: String,
    pub sha256: String,
}

/// 上传PDF并按页提取文本
#[utoipa::path(
    post,
    path = "/api/pdf-to-json",
    tag = "报告管理",
    request_body(content = String, content_type = "multipart/form-data", description = "表单字段 pdf：待解析的PDF文件"),
    responses(
        (status = 200, description = "解析成功", body = PdfToJsonResponse),
        (status = 400, description = "缺少 pdf 字段"),
        (status = 401, description = "未登录"),
        (status = 413, description = "文件过大"),
        (status = 415, description = "不是PDF文件"),
        (status = 500, description = "PDF解析失败")
    )
)]
pub async fn pdf_to_json(
    State(app_state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<PdfToJsonResponse>, AppError> {
    let max_size = app_state.file_processor.config().max_file_size;

    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some(PDF_FIELD) {
            continue;
        }

        // 部分浏览器会带上客户端路径
        filename = field
            .file_name()
            .and_then(|name| name.rsplit(['/', '\\']).next())
            .map(|name| name.to_string());
        file_data = Some(
            field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, max_size))?
                .to_vec(),
        );
    }

    let file_data = file_data.ok_or_else(|| AppError::bad_request("缺少 pdf 文件字段"))?;
    let filename = filename.unwrap_or_else(|| "upload.pdf".to_string());

    let result = app_state
        .file_processor
        .process_pdf(&file_data, &filename)
        .await?;

    tracing::info!(
        user_id = %user.id,
        file = %result.file_name,
        size = result.file_size,
        pages = result.pages.len(),
        "PDF解析完成"
    );

    Ok(Json(PdfToJsonResponse {
        success: true,
        extracted_text: result.pages.joined(),
        pages: result.pages.len(),
        text: result.pages,
        file_name: result.file_name,
        sha256: result.sha256,
    }))
}

/// 将 multipart 错误转换为业务错误，请求体超限视为文件过大
fn multipart_error(e: MultipartError, max_size: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::file_too_large(max_size)
    } else {
        AppError::bad_request(format!("文件上传格式不正确: {}", e.body_text()))
    }
}
