use crate::error::{AppError, AppResult};
use sha2::{Digest, Sha256};
use tokio::task;

/// 文件指纹计算器
pub struct FileHasher;

impl FileHasher {
    /// 创建新的文件哈希计算器
    pub fn new() -> Self {
        Self
    }

    /// 在后台线程计算SHA256，避免阻塞异步运行时
    pub async fn sha256(&self, data: &[u8]) -> AppResult<String> {
        let data = data.to_vec();

        task::spawn_blocking(move || Self::calculate_sha256(&data))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
    }

    /// 计算SHA256哈希值
    pub fn calculate_sha256(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}

impl Default for FileHasher {
    fn default() -> Self {
        Self::new()
    }
}
