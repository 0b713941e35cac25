mod event;
mod source;

pub use event::*;
pub use source::*;
