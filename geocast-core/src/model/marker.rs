use crate::model::ids::SourceId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

/// A persisted map marker, optionally bound to a remotely hosted media
/// entry once its recording finished uploading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: i64,
    pub position: GeoPosition,
    pub title: String,
    pub description: Option<String>,
    pub entry_id: Option<String>,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

/// Client-submitted marker payload. `recording_id` is present when the
/// marker should be bound to a finished recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerDraft {
    pub position: GeoPosition,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub recording_id: Option<SourceId>,
}
