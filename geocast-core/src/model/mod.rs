mod codec;
mod ids;
mod marker;
mod signaling;

pub use codec::{CodecPreference, MediaKind};
pub use ids::{ConnectionId, RoomId, SourceId};
pub use marker::{GeoPosition, Marker, MarkerDraft};
pub use signaling::SignalMessage;
