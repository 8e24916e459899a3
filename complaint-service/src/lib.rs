//! 投诉服务
//!
//! 投诉的提交（按商品与举报人去重计数）、查询与内容更新，
//! 提交时按客户端 IP 尽力解析国家。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod service;

pub use service::ApplicationBootstrap;
