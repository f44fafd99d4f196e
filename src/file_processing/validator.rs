use super::FileProcessingConfig;
use crate::error::{AppError, AppResult};

/// PDF 文件签名
const PDF_MAGIC: &[u8] = b"%PDF-";

/// 上传文件验证器
pub struct FileValidator {
    config: FileProcessingConfig,
}

impl FileValidator {
    /// 创建新的文件验证器
    pub fn new(config: &FileProcessingConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// 验证上传的PDF是否符合要求
    pub fn validate_pdf(&self, file_data: &[u8], filename: &str) -> AppResult<()> {
        // 1. 检查文件大小
        self.validate_file_size(file_data)?;

        // 2. 检查文件名
        self.validate_filename(filename)?;

        // 3. 检查文件类型
        self.validate_pdf_content(file_data)?;

        Ok(())
    }

    /// 验证文件大小
    fn validate_file_size(&self, file_data: &[u8]) -> AppResult<()> {
        let file_size = file_data.len() as u64;

        if file_size == 0 {
            return Err(AppError::Validation("文件不能为空".to_string()));
        }

        if file_size > self.config.max_file_size {
            return Err(AppError::FileTooLarge {
                max_size: self.config.max_file_size,
            });
        }

        Ok(())
    }

    /// 验证文件名
    fn validate_filename(&self, filename: &str) -> AppResult<()> {
        if filename.is_empty() {
            return Err(AppError::Validation("文件名不能为空".to_string()));
        }

        if filename.len() > 255 {
            return Err(AppError::Validation(
                "文件名过长，最大支持255个字符".to_string(),
            ));
        }

        let dangerous_chars = ['/', '\\', '*', '?', '"', '<', '>', '|'];
        if filename.chars().any(|c| dangerous_chars.contains(&c) || c.is_control()) {
            return Err(AppError::Validation("文件名包含非法字符".to_string()));
        }

        Ok(())
    }

    /// 检查文件头与MIME类型
    fn validate_pdf_content(&self, file_data: &[u8]) -> AppResult<()> {
        let mime_type = detect_mime_type(file_data);
        if mime_type == "application/pdf" {
            return Ok(());
        }

        Err(AppError::unsupported_file_type(mime_type))
    }
}

/// 检测文件MIME类型
pub fn detect_mime_type(file_data: &[u8]) -> String {
    // 部分生成器会在签名前写入空白或BOM，infer 只检查偏移0
    if file_data.starts_with(PDF_MAGIC) || find_pdf_magic(file_data) {
        return "application/pdf".to_string();
    }

    match infer::get(file_data) {
        Some(kind) => kind.mime_type().to_string(),
        None => "application/octet-stream".to_string(),
    }
}

/// PDF 规范允许签名出现在前 1024 字节内
fn find_pdf_magic(file_data: &[u8]) -> bool {
    let head = &file_data[..file_data.len().min(1024)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}
