mod output;
mod relay;
mod rooms;
mod service;
mod ws_handler;

pub use output::*;
pub use relay::*;
pub use rooms::*;
pub use service::*;
pub use ws_handler::*;
