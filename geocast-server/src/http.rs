use crate::error::RelayError;
use crate::server::Server;
use axum::Json;
use axum::extract::State;
use geocast_core::{Marker, MarkerDraft};
use serde::Deserialize;
use std::sync::Arc;

/// Map viewport sent with marker queries. Accepted for interface
/// compatibility; the whole table is returned regardless.
#[derive(Debug, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

pub async fn markers(
    State(server): State<Arc<Server>>,
    Json(_bounds): Json<Bounds>,
) -> Result<Json<Vec<Marker>>, RelayError> {
    Ok(Json(server.markers().await?))
}

pub async fn add_marker(
    State(server): State<Arc<Server>>,
    Json(draft): Json<MarkerDraft>,
) -> Result<Json<Marker>, RelayError> {
    Ok(Json(server.add_marker(draft).await?))
}
