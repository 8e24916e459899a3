//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建仓储、地理定位、领域服务、命令/查询处理器和 HTTP 状态

use std::sync::Arc;

use anyhow::{Context, Result};
use complaint_core::ComplaintAppConfig;
use tracing::{info, warn};

use crate::application::handlers::{ComplaintCommandHandler, ComplaintQueryHandler};
use crate::config::ComplaintServiceConfig;
use crate::domain::repository::{ComplaintRepositoryRef, GeolocationResolverRef};
use crate::domain::service::ComplaintDomainService;
use crate::infrastructure::geolocation::HttpGeolocationResolver;
use crate::infrastructure::persistence::{
    InMemoryComplaintRepository, PostgresComplaintRepository,
};
use crate::interface::http::AppState;

/// 应用上下文 - 包含所有已初始化的服务
pub struct ApplicationContext {
    pub state: Arc<AppState>,
    pub config: ComplaintServiceConfig,
}

/// 构建应用上下文
pub async fn initialize(app_config: &ComplaintAppConfig) -> Result<ApplicationContext> {
    // 1. 加载配置
    let config = ComplaintServiceConfig::from_app_config(app_config);

    // 2. 构建仓储与地理定位
    let repository = build_repository(&config).await?;
    let geolocation: GeolocationResolverRef = Arc::new(
        HttpGeolocationResolver::new(&config.geolocation)
            .context("Failed to build geolocation resolver")?,
    );
    info!(base_url = %config.geolocation.base_url, "geolocation resolver configured");

    // 3. 构建领域服务与处理器
    let state = build_state(repository, geolocation, config.max_content_length);

    Ok(ApplicationContext { state, config })
}

/// 由已构建的仓储和地理定位组装 HTTP 状态
pub fn build_state(
    repository: ComplaintRepositoryRef,
    geolocation: GeolocationResolverRef,
    max_content_length: usize,
) -> Arc<AppState> {
    let domain_service = Arc::new(ComplaintDomainService::new(repository, geolocation));
    let command_handler = Arc::new(ComplaintCommandHandler::new(domain_service.clone()));
    let query_handler = Arc::new(ComplaintQueryHandler::new(domain_service));

    Arc::new(AppState {
        command_handler,
        query_handler,
        max_content_length,
    })
}

async fn build_repository(config: &ComplaintServiceConfig) -> Result<ComplaintRepositoryRef> {
    match config.postgres.as_ref() {
        Some(postgres) => {
            let store = PostgresComplaintRepository::new(postgres)
                .await
                .context("Failed to build postgres complaint repository")?;
            info!("using postgres complaint repository");
            Ok(Arc::new(store))
        }
        None => {
            warn!("no postgres profile configured, complaints are kept in memory");
            Ok(Arc::new(InMemoryComplaintRepository::new()))
        }
    }
}
