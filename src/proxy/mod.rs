pub mod config;
pub mod dispatch;
pub mod mappers;
pub mod rate_limit;
pub mod registry;
pub mod state;
pub mod success_tracker;
pub mod upstream;

pub use config::{DefaultParams, GatewayConfig, RateLimitConfig};
pub use dispatch::{DispatchBundle, DispatchOutcome};
pub use registry::ServerRegistry;
pub use state::GatewayState;
