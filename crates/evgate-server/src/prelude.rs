pub use crate::audit::AuditEmitter;
pub use crate::config::{FanoutConfig, GatewayConfig};
pub use crate::errors::GatewayError;
pub use crate::fanout::FanoutBridge;
pub use crate::server::{Gateway, ResponseFilter};
