use crate::error::{AppError, AppResult};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as _,
    ser::SerializeMap,
};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use tokio::task;

/// 分页符，pdf 文本提取器在页与页之间输出
const FORM_FEED: char = '\x0C';

/// 按页组织的PDF文本
///
/// 序列化为 `{"page_1": [...], "page_2": [...]}`，按页码数值升序输出。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTexts(BTreeMap<u32, Vec<String>>);

impl PageTexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: u32, lines: Vec<String>) {
        self.0.insert(page, lines);
    }

    /// 页数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn page(&self, page: u32) -> Option<&[String]> {
        self.0.get(&page).map(Vec::as_slice)
    }

    /// 是否包含非空文本
    pub fn has_text(&self) -> bool {
        self.0.values().flatten().any(|line| !line.trim().is_empty())
    }

    /// 拼接为一段文本：页内各行以空格连接，页与页之间空一行
    pub fn joined(&self) -> String {
        self.0
            .values()
            .map(|lines| lines.join(" "))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Serialize for PageTexts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (page, lines) in &self.0 {
            map.serialize_entry(&format!("page_{}", page), lines)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PageTexts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // 旧版前端每页提交一个字符串，新版提交行数组
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Lines {
            One(String),
            Many(Vec<String>),
        }

        let raw = BTreeMap::<String, Lines>::deserialize(deserializer)?;
        let mut pages = PageTexts::new();
        for (key, lines) in raw {
            let page = key
                .strip_prefix("page_")
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| D::Error::custom(format!("无效的页码键: {}", key)))?;
            let lines = match lines {
                Lines::One(text) => split_lines(&text),
                Lines::Many(lines) => lines,
            };
            pages.insert(page, lines);
        }
        Ok(pages)
    }
}

/// 按分页符切分文本，页码从1开始
///
/// 末尾分页符之后的空白段不算作一页。
pub fn split_pages(text: &str) -> PageTexts {
    let mut sections: Vec<&str> = text.split(FORM_FEED).collect();
    if sections.len() > 1 && sections.last().is_some_and(|s| s.trim().is_empty()) {
        sections.pop();
    }

    let mut pages = PageTexts::new();
    for (index, section) in sections.into_iter().enumerate() {
        pages.insert(index as u32 + 1, split_lines(section));
    }
    pages
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// PDF 文本提取器
///
/// 优先使用 pdf-extract（字体解码更完整），失败时回退到 lopdf 逐页提取。
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取PDF文本（在阻塞线程中执行）
    pub async fn extract(&self, data: &[u8]) -> AppResult<PageTexts> {
        let data = data.to_vec();

        task::spawn_blocking(move || Self::extract_blocking(&data))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
    }

    fn extract_blocking(data: &[u8]) -> AppResult<PageTexts> {
        match Self::extract_with_pdf_extract(data) {
            Ok(pages) => {
                // 未输出分页符时，用 lopdf 恢复页边界
                if pages.len() <= 1 {
                    if let Ok(by_page) = Self::extract_with_lopdf(data) {
                        if by_page.len() > 1 && by_page.has_text() {
                            tracing::debug!("pdf-extract 未输出分页符，使用 lopdf 分页结果");
                            return Ok(by_page);
                        }
                    }
                }
                Ok(pages)
            }
            Err(primary_err) => {
                tracing::warn!("pdf-extract 解析失败，尝试 lopdf: {}", primary_err);
                Self::extract_with_lopdf(data).map_err(|fallback_err| {
                    AppError::pdf_extraction(format!(
                        "pdf-extract: {}; lopdf: {}",
                        primary_err, fallback_err
                    ))
                })
            }
        }
    }

    fn extract_with_pdf_extract(data: &[u8]) -> Result<PageTexts, String> {
        // pdf-extract 遇到部分损坏文件会 panic
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(data)
        }));

        match result {
            Ok(Ok(text)) => Ok(split_pages(&text)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("解析过程中发生panic".to_string()),
        }
    }

    fn extract_with_lopdf(data: &[u8]) -> Result<PageTexts, String> {
        let document = lopdf::Document::load_mem(data).map_err(|e| e.to_string())?;

        let mut pages = PageTexts::new();
        for page_num in document.get_pages().keys() {
            let text = document
                .extract_text(&[*page_num])
                .map_err(|e| format!("第{}页: {}", page_num, e))?;
            pages.insert(*page_num, split_lines(&text));
        }

        if pages.is_empty() {
            return Err("文档不包含任何页面".to_string());
        }
        Ok(pages)
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}
