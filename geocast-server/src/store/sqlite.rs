use crate::error::RelayError;
use crate::store::{MarkerStore, epoch_ms};
use async_trait::async_trait;
use geocast_core::{GeoPosition, Marker, MarkerDraft};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::str::FromStr;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS markers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    entryId TEXT,
    createdAt INTEGER NOT NULL,
    lat REAL NOT NULL,
    lng REAL NOT NULL
)";

#[derive(Clone)]
pub struct SqliteMarkerStore {
    pool: SqlitePool,
}

impl SqliteMarkerStore {
    /// Opens (and creates, if missing) the marker database.
    pub async fn connect(database_url: &str) -> Result<Self, RelayError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(RelayError::Store)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn marker_from_row(row: &SqliteRow) -> Result<Marker, sqlx::Error> {
    Ok(Marker {
        id: row.try_get("id")?,
        position: GeoPosition {
            lat: row.try_get("lat")?,
            lng: row.try_get("lng")?,
        },
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        entry_id: row.try_get("entryId")?,
        created_at: row.try_get("createdAt")?,
    })
}

#[async_trait]
impl MarkerStore for SqliteMarkerStore {
    async fn insert(
        &self,
        draft: &MarkerDraft,
        entry_id: Option<&str>,
    ) -> Result<Marker, RelayError> {
        let created_at = epoch_ms();
        let result = sqlx::query(
            "INSERT INTO markers (title, description, entryId, createdAt, lat, lng)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(entry_id)
        .bind(created_at)
        .bind(draft.position.lat)
        .bind(draft.position.lng)
        .execute(&self.pool)
        .await?;

        Ok(Marker {
            id: result.last_insert_rowid(),
            position: draft.position,
            title: draft.title.clone(),
            description: draft.description.clone(),
            entry_id: entry_id.map(str::to_string),
            created_at,
        })
    }

    async fn select_all(&self) -> Result<Vec<Marker>, RelayError> {
        let rows = sqlx::query(
            "SELECT id, title, description, entryId, createdAt, lat, lng FROM markers",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut markers = Vec::with_capacity(rows.len());
        for row in &rows {
            markers.push(marker_from_row(row).map_err(RelayError::Store)?);
        }
        Ok(markers)
    }

    async fn delete_older_than(&self, cutoff_ms: i64) -> Result<u64, RelayError> {
        let result = sqlx::query("DELETE FROM markers WHERE createdAt < ?1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
