//! User accounts with Argon2id password hashes.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::error::StoreError;

use super::{format_datetime, parse_datetime, Database};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, StoreError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        is_admin: row.try_get("is_admin")?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Hash a password into a PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// Check a password against a PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {e}");
            false
        }
    }
}

impl Database {
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::Invalid("username must not be empty".into()));
        }
        let password_hash = hash_password(password)?;

        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, is_admin, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(&password_hash)
        .bind(is_admin)
        .bind(format_datetime(&Utc::now()))
        .execute(self.pool())
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(StoreError::UserExists(username.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Created user '{}' (admin: {})", username, is_admin);
        self.get_user(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(self.pool())
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// The user if `password` matches, `None` for an unknown user or a wrong
    /// password.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let Some(user) = self.get_user_by_username(username).await? else {
            return Ok(None);
        };
        let hash = user.password_hash.clone();
        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .unwrap_or(false);
        Ok(ok.then_some(user))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY username")
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(user_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::temp_db;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret", "not-a-phc-string"));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let (_dir, db) = temp_db().await;
        let user = db.create_user("ada", "lovelace", true).await.unwrap();
        assert!(user.is_admin);

        let ok = db.authenticate("ada", "lovelace").await.unwrap();
        assert_eq!(ok.map(|u| u.id), Some(user.id));
        assert!(db.authenticate("ada", "babbage").await.unwrap().is_none());
        assert!(db.authenticate("nobody", "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let (_dir, db) = temp_db().await;
        db.create_user("ada", "a", false).await.unwrap();
        let err = db.create_user("ada", "b", false).await.unwrap_err();
        assert!(matches!(err, StoreError::UserExists(name) if name == "ada"));
    }

    #[tokio::test]
    async fn test_list_users_sorted() {
        let (_dir, db) = temp_db().await;
        db.create_user("zed", "a", false).await.unwrap();
        db.create_user("amy", "a", false).await.unwrap();
        let names: Vec<_> = db
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}
