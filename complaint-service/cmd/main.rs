use anyhow::Result;
use complaint_core::load_config;
use complaint_core::tracing::init_tracing_from_config;
use complaint_service::ApplicationBootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let app_config = load_config(None);
    init_tracing_from_config(Some(&app_config.logging));

    ApplicationBootstrap::run(app_config).await
}
