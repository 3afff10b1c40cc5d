//! Libraries repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        library::{CreateLibrary, Library, UpdateLibrary},
        pagination::PageRequest,
    },
};

#[derive(Clone)]
pub struct LibrariesRepository {
    pool: Pool<Postgres>,
}

impl LibrariesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM libraries WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn list(&self, pattern: Option<&str>, window: PageRequest) -> AppResult<(Vec<Library>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM libraries WHERE ($1::text IS NULL OR name ILIKE $1)")
                .bind(pattern)
                .fetch_one(&self.pool)
                .await?;

        let libraries = sqlx::query_as::<_, Library>(
            r#"
            SELECT * FROM libraries
            WHERE ($1::text IS NULL OR name ILIKE $1)
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((libraries, total))
    }

    pub async fn create(&self, library: &CreateLibrary) -> AppResult<Library> {
        let created = sqlx::query_as::<_, Library>(
            "INSERT INTO libraries (name, address) VALUES ($1, $2) RETURNING *",
        )
        .bind(&library.name)
        .bind(&library.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    pub async fn update(&self, id: i32, patch: UpdateLibrary) -> AppResult<Library> {
        let mut tx = self.pool.begin().await?;

        let mut library =
            sqlx::query_as::<_, Library>("SELECT * FROM libraries WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))?;

        patch.apply(&mut library);

        let updated = sqlx::query_as::<_, Library>(
            r#"
            UPDATE libraries SET name = $2, address = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&library.name)
        .bind(&library.address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a library that owns no media
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM libraries WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library with id {} not found", id)))?;

        let media_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media WHERE library_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if media_count > 0 {
            return Err(AppError::Conflict(format!(
                "Library still owns {} media item(s)",
                media_count
            )));
        }

        sqlx::query("DELETE FROM libraries WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::foreign_key_violation_as_conflict(e, "Library still owns media"))?;

        tx.commit().await?;
        Ok(())
    }
}
