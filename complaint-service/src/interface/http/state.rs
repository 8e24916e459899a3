use std::sync::Arc;

use crate::application::handlers::{ComplaintCommandHandler, ComplaintQueryHandler};

/// HTTP 处理器共享状态，通过 `State(Arc<AppState>)` 注入
pub struct AppState {
    pub command_handler: Arc<ComplaintCommandHandler>,
    pub query_handler: Arc<ComplaintQueryHandler>,
    pub max_content_length: usize,
}
