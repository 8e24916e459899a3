//! 服务模块 - 包含依赖构建与服务启动

pub mod bootstrap;
pub mod wire;

pub use bootstrap::ApplicationBootstrap;
