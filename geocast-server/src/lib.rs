pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod platform;
pub mod recording;
pub mod server;
pub mod signaling;
pub mod store;

pub use config::ServerConfig;
pub use error::RelayError;
pub use server::Server;
