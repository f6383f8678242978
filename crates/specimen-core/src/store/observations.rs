//! Observation records: one per upload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::error::StoreError;
use crate::types::Classification;

use super::{format_datetime, parse_datetime, Database};

/// A stored observation joined with its uploader's username.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    /// Path relative to the media root, e.g. `observations/fern.jpg`
    pub image: String,
    pub species_name: String,
    /// Percentage in `[0, 100]`
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// An observation about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub user_id: i64,
    pub image: String,
    pub species_name: String,
    /// Percentage in `[0, 100]`
    pub confidence: f64,
}

impl NewObservation {
    /// Record a classification; the confidence is stored as a percentage.
    pub fn from_classification(
        user_id: i64,
        image: impl Into<String>,
        classification: &Classification,
    ) -> Self {
        Self {
            user_id,
            image: image.into(),
            species_name: classification.label().to_string(),
            confidence: f64::from(classification.confidence()) * 100.0,
        }
    }
}

/// Listing options.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    /// Exact species name
    pub species: Option<String>,
    pub limit: Option<u32>,
}

const SELECT_OBSERVATIONS: &str = "SELECT o.id, o.user_id, u.username, o.image, o.species_name, o.confidence, o.created_at
     FROM observations o JOIN users u ON u.id = o.user_id";

fn observation_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Observation, StoreError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Observation {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        image: row.try_get("image")?,
        species_name: row.try_get("species_name")?,
        confidence: row.try_get("confidence")?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl Database {
    /// Insert an observation stamped with the current time.
    pub async fn insert_observation(
        &self,
        observation: &NewObservation,
    ) -> Result<Observation, StoreError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO observations (user_id, image, species_name, confidence, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(observation.user_id)
        .bind(&observation.image)
        .bind(&observation.species_name)
        .bind(observation.confidence)
        .bind(format_datetime(&created_at))
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        tracing::info!(
            "Recorded observation {} ({}, {:.1}%)",
            id,
            observation.species_name,
            observation.confidence
        );
        self.get_observation(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("observation {id}")))
    }

    pub async fn get_observation(&self, id: i64) -> Result<Option<Observation>, StoreError> {
        let row = sqlx::query(&format!("{SELECT_OBSERVATIONS} WHERE o.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(observation_from_row).transpose()
    }

    /// Observations newest first.
    pub async fn list_observations(
        &self,
        filter: &ObservationFilter,
    ) -> Result<Vec<Observation>, StoreError> {
        let mut sql = String::from(SELECT_OBSERVATIONS);
        if filter.species.is_some() {
            sql.push_str(" WHERE o.species_name = ?");
        }
        sql.push_str(" ORDER BY o.created_at DESC, o.id DESC");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(species) = &filter.species {
            query = query.bind(species);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(i64::from(limit));
        }

        let rows = query.fetch_all(self.pool()).await?;
        rows.iter().map(observation_from_row).collect()
    }

    /// Delete one observation. The image file is left to the caller.
    pub async fn delete_observation(&self, id: i64) -> Result<Observation, StoreError> {
        let observation = self
            .get_observation(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("observation {id}")))?;
        sqlx::query("DELETE FROM observations WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        tracing::info!("Deleted observation {}", id);
        Ok(observation)
    }
}
