pub mod error;
pub mod media;
pub mod negotiator;

pub use error::NegotiationError;
pub use negotiator::{NegotiationState, Negotiator};
