// 服务层模块
pub mod auth;
pub mod demo_data;
pub mod llm_client;
pub mod report_analyzer;

pub use auth::{AuthUser, Authenticator, RemoteAuthenticator, StaticAuthenticator};
pub use llm_client::{ChatModel, OpenAiCompatClient};
pub use report_analyzer::{AnalysisReport, AnalysisRequest, ReportAnalyzer};
