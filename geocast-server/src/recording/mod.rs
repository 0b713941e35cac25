mod reaper;
mod registry;
mod session;
mod streamer;

pub use reaper::*;
pub use registry::*;
pub use session::*;
pub use streamer::*;
