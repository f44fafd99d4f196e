pub mod extractor;
pub mod hasher;
pub mod validator;

pub use extractor::{PageTexts, PdfTextExtractor, split_pages};
pub use hasher::FileHasher;
pub use validator::FileValidator;

use crate::error::AppResult;

/// PDF 处理结果
#[derive(Debug, Clone)]
pub struct PdfProcessingResult {
    /// 上传文件名
    pub file_name: String,
    /// 文件大小（字节）
    pub file_size: u64,
    /// 文件SHA256
    pub sha256: String,
    /// 按页提取的文本
    pub pages: PageTexts,
}

/// 文件处理配置
#[derive(Debug, Clone)]
pub struct FileProcessingConfig {
    /// 最大文件大小（字节）
    pub max_file_size: u64,
}

impl Default for FileProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl From<&crate::config::FileConfig> for FileProcessingConfig {
    fn from(config: &crate::config::FileConfig) -> Self {
        Self {
            max_file_size: config.max_size,
        }
    }
}

/// 文件处理器主接口
pub struct FileProcessor {
    config: FileProcessingConfig,
    extractor: PdfTextExtractor,
    hasher: FileHasher,
    validator: FileValidator,
}

impl std::fmt::Debug for FileProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileProcessor")
            .field("config", &self.config)
            .finish()
    }
}

impl Clone for FileProcessor {
    fn clone(&self) -> Self {
        Self::new(self.config.clone())
    }
}

impl FileProcessor {
    /// 创建新的文件处理器
    pub fn new(config: FileProcessingConfig) -> Self {
        Self {
            extractor: PdfTextExtractor::new(),
            hasher: FileHasher::new(),
            validator: FileValidator::new(&config),
            config,
        }
    }

    /// 处理上传的PDF：验证、计算指纹、提取文本
    pub async fn process_pdf(&self, file_data: &[u8], filename: &str) -> AppResult<PdfProcessingResult> {
        // 1. 验证文件
        self.validator.validate_pdf(file_data, filename)?;

        // 2. 计算文件指纹
        let sha256 = self.hasher.sha256(file_data).await?;

        // 3. 提取文本
        let pages = self.extractor.extract(file_data).await?;

        tracing::debug!(
            file = %filename,
            sha256 = %sha256,
            pages = pages.len(),
            "PDF文本提取完成"
        );

        Ok(PdfProcessingResult {
            file_name: filename.to_string(),
            file_size: file_data.len() as u64,
            sha256,
            pages,
        })
    }

    /// 获取配置
    pub fn config(&self) -> &FileProcessingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_process_pdf_validates_before_extracting() {
        let processor = FileProcessor::new(FileProcessingConfig { max_file_size: 16 });

        let err = processor
            .process_pdf(b"%PDF-1.4 but far too long for the limit", "big.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FileTooLarge { .. }));

        let err = processor.process_pdf(b"hello", "a.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFileType { .. }));
    }

    #[test]
    fn test_config_from_file_config() {
        let file_config = crate::config::FileConfig { max_size: 42 };
        let config = FileProcessingConfig::from(&file_config);
        assert_eq!(config.max_file_size, 42);
    }
}
