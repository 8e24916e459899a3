//! 应用启动器 - 负责依赖注入和服务启动
use std::net::SocketAddr;

use anyhow::{Context, Result};
use complaint_core::ComplaintAppConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::interface::http::build_router;
use crate::service::wire::{self, ApplicationContext};

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点
    pub async fn run(config: &'static ComplaintAppConfig) -> Result<()> {
        let context = wire::initialize(config).await?;
        Self::start_server(context).await
    }

    /// 启动 HTTP 服务器，收到 ctrl-c 后优雅关闭
    pub async fn start_server(context: ApplicationContext) -> Result<()> {
        let address = format!("{}:{}", context.config.address, context.config.port);
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("failed to bind {address}"))?;

        info!(%address, "complaint service listening");

        let app = build_router(context.state).into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("http server terminated unexpectedly")?;

        info!("complaint service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
    }
}
