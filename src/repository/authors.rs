//! Authors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        pagination::PageRequest,
    },
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn list(&self, pattern: Option<&str>, window: PageRequest) -> AppResult<(Vec<Author>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE ($1::text IS NULL OR name ILIKE $1)")
                .bind(pattern)
                .fetch_one(&self.pool)
                .await?;

        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT * FROM authors
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

        Ok((authors, total))
    }

    pub async fn create(&self, author: &CreateAuthor) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, birth_date, death_date) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&author.name)
        .bind(author.birth_date)
        .bind(author.death_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Apply a patch under a row lock; `check` runs on the patched author
    /// before anything is written.
    pub async fn update<F>(&self, id: i32, patch: UpdateAuthor, check: F) -> AppResult<Author>
    where
        F: FnOnce(&Author) -> AppResult<()>,
    {
        let mut tx = self.pool.begin().await?;

        let mut author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;

        patch.apply(&mut author);
        check(&author)?;

        let updated = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET name = $2, birth_date = $3, death_date = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&author.name)
        .bind(author.birth_date)
        .bind(author.death_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete an author with no credited works
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM authors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;

        let works: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authorships WHERE author_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if works > 0 {
            return Err(AppError::Conflict(format!(
                "Author is credited on {} work(s)",
                works
            )));
        }

        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::foreign_key_violation_as_conflict(e, "Author is credited on a work"))?;

        tx.commit().await?;
        Ok(())
    }
}
