pub mod config;
pub mod server;

pub use config::AppConfig;
pub use server::{SafeServerView, ServerDescriptor};
