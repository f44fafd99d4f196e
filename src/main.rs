/*
 * OncoScan - Medical Report Screening Backend
 * Copyright (c) 2025 OncoScan Project
 *
 * This work is licensed under CC BY-NC-SA 4.0
 * https://creativecommons.org/licenses/by-nc-sa/4.0/
 */

use oncoscan_backend::{
    config::{Config, auth::AuthProviderKind},
    database::Database,
    error::AppResult,
    file_processing::{FileProcessingConfig, FileProcessor},
    handlers::AppState,
    repositories::{MemoryReportStore, PgReportRepository, ReportStore},
    routes::build_app,
    services::{
        Authenticator, OpenAiCompatClient, RemoteAuthenticator, ReportAnalyzer,
        StaticAuthenticator, demo_data,
    },
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> AppResult<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oncoscan_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，文件不存在时写出默认配置
    let config = Config::load_or_create(CONFIG_PATH)?;

    tracing::info!("服务器配置: {}", config.server_addr());

    // 初始化报告存储（数据库不可用时继续启动，依赖存储的接口返回503）
    let mut database: Option<Database> = None;
    let store: Option<Arc<dyn ReportStore>> = if config.demo.enabled {
        tracing::warn!("演示模式已开启：使用内存存储，数据不会持久化");
        let store =
            MemoryReportStore::seeded(demo_data::sample_reports(&config.demo.user_id)).await;
        Some(Arc::new(store))
    } else {
        match Database::new(&config.database).await {
            Ok(db) => {
                if config.database.apply_schema {
                    if let Err(e) = db.apply_schema().await {
                        tracing::warn!("执行数据库初始化脚本失败: {}", e);
                    }
                }
                if let Err(e) = db.verify_connection().await {
                    tracing::warn!("数据库验证失败: {}", e);
                }
                database = Some(db.clone());
                Some(Arc::new(PgReportRepository::new(db)))
            }
            Err(e) => {
                tracing::warn!("数据库连接失败，服务将在无数据库模式下启动: {}", e);
                None
            }
        }
    };

    // 初始化模型客户端
    let analyzer = match OpenAiCompatClient::new(config.llm.clone()) {
        Ok(client) => Some(ReportAnalyzer::new(Arc::new(client))),
        Err(e) => {
            tracing::warn!("模型客户端初始化失败，报告生成将不可用: {}", e);
            None
        }
    };

    // 初始化身份认证
    let authenticator: Arc<dyn Authenticator> = if config.demo.enabled {
        Arc::new(
            StaticAuthenticator::new(&config.auth.static_tokens)
                .with_token(&config.demo.token, &config.demo.user_id),
        )
    } else {
        match config.auth.provider {
            AuthProviderKind::Remote => {
                tracing::info!("使用托管身份服务: {}", config.auth.userinfo_url);
                Arc::new(RemoteAuthenticator::new(&config.auth)?)
            }
            AuthProviderKind::Static => {
                tracing::warn!(
                    "使用固定 token 认证，共 {} 个 token，仅用于开发环境",
                    config.auth.static_tokens.len()
                );
                Arc::new(StaticAuthenticator::new(&config.auth.static_tokens))
            }
        }
    };

    let file_processor = FileProcessor::new(FileProcessingConfig::from(&config.file));
    tracing::info!("文件处理器初始化成功");

    // 创建应用状态
    let app_state = AppState {
        store,
        analyzer,
        authenticator,
        file_processor,
        config: config.clone(),
    };

    let app = build_app(app_state);

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("🚀 服务器启动成功，监听地址: {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("监听退出信号失败: {}", e);
    }
    tracing::info!("收到退出信号，正在关闭服务...");
}
