use agrimate_core::GatewayCore;
use std::sync::Arc;

/// Application state shared across all API handlers
pub type AppState = Arc<GatewayCore>;
