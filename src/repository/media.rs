//! Media repository: base rows, typed detail rows and authorship links

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, Authorship},
        media::{CreateMedia, Media, MediaDetails, MediaKind, MediaRow, UpdateMedia},
        pagination::PageRequest,
    },
};

const MEDIA_COLUMNS: &str = r#"
    SELECT m.id, m.kind, m.condition, m.library_id, m.created_at, m.updated_at,
           b.title AS book_title, b.isbn, b.page_count,
           b.publisher AS book_publisher, b.published_on AS book_published_on,
           mg.title AS magazine_title, mg.issn, mg.periodicity,
           mg.publisher AS magazine_publisher, mg.published_on AS magazine_published_on,
           d.title AS dvd_title, d.isan, d.duration_minutes, d.distributor, d.released_on,
           ar.title AS article_title, ar.doi,
           ar.publisher AS article_publisher, ar.published_on AS article_published_on,
           NOT EXISTS (
               SELECT 1 FROM loans l WHERE l.media_id = m.id AND l.returned_on IS NULL
           ) AS available
"#;

const MEDIA_FROM: &str = r#"
    FROM media m
    LEFT JOIN books b ON b.media_id = m.id
    LEFT JOIN magazines mg ON mg.media_id = m.id
    LEFT JOIN dvds d ON d.media_id = m.id
    LEFT JOIN articles ar ON ar.media_id = m.id
"#;

/// Title of whichever variant the row is
const MEDIA_TITLE: &str = "COALESCE(b.title, mg.title, d.title, ar.title)";

const MEDIA_FILTER: &str = r#"
    WHERE ($1::media_kind IS NULL OR m.kind = $1)
      AND ($2::int IS NULL OR m.library_id = $2)
      AND ($3::text IS NULL OR COALESCE(b.title, mg.title, d.title, ar.title) ILIKE $3 OR b.isbn ILIKE $3)
      AND ($4::bool IS NULL OR $4 = NOT EXISTS (
              SELECT 1 FROM loans l WHERE l.media_id = m.id AND l.returned_on IS NULL
          ))
"#;

fn into_media(rows: Vec<MediaRow>) -> AppResult<Vec<Media>> {
    rows.into_iter().map(Media::try_from).collect()
}

#[derive(Clone)]
pub struct MediaRepository {
    pool: Pool<Postgres>,
}

impl MediaRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a media item with its details
    pub async fn get_by_id(&self, id: i32) -> AppResult<Media> {
        let sql = format!("{MEDIA_COLUMNS} {MEDIA_FROM} WHERE m.id = $1");
        sqlx::query_as::<_, MediaRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media with id {} not found", id)))?
            .try_into()
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM media WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// List media filtered by kind, owning library and a title (or ISBN) pattern
    pub async fn list(
        &self,
        kind: Option<MediaKind>,
        library_id: Option<i32>,
        pattern: Option<&str>,
        available: Option<bool>,
        window: PageRequest,
    ) -> AppResult<(Vec<Media>, i64)> {
        let count_sql = format!("SELECT COUNT(*) {MEDIA_FROM} {MEDIA_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(kind)
            .bind(library_id)
            .bind(pattern)
            .bind(available)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "{MEDIA_COLUMNS} {MEDIA_FROM} {MEDIA_FILTER} ORDER BY {MEDIA_TITLE}, m.id LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(kind)
            .bind(library_id)
            .bind(pattern)
            .bind(available)
            .bind(window.limit)
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((into_media(rows)?, total))
    }

    /// Insert the base row and its detail row in one transaction
    pub async fn create(&self, media: &CreateMedia) -> AppResult<Media> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO media (kind, condition, library_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(media.details.kind())
        .bind(&media.condition)
        .bind(media.library_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Library not found".to_string())
            }
            other => AppError::Database(other),
        })?;

        save_details(&mut *tx, id, &media.details).await?;

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Apply a patch under a row lock
    pub async fn update(&self, id: i32, patch: UpdateMedia) -> AppResult<Media> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{MEDIA_COLUMNS} {MEDIA_FROM} WHERE m.id = $1 FOR UPDATE OF m");
        let mut media: Media = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media with id {} not found", id)))?
            .try_into()?;

        let details_changed = patch.details.is_some();
        patch.apply(&mut media)?;

        if let Some(library_id) = media.library_id {
            let library_exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM libraries WHERE id = $1)")
                    .bind(library_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !library_exists {
                return Err(AppError::NotFound(format!(
                    "Library with id {} not found",
                    library_id
                )));
            }
        }

        sqlx::query(
            "UPDATE media SET condition = $2, library_id = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&media.condition)
        .bind(media.library_id)
        .execute(&mut *tx)
        .await?;

        if details_changed {
            save_details(&mut *tx, id, &media.details).await?;
        }

        tx.commit().await?;
        self.get_by_id(id).await
    }

    /// Delete a media item, its detail row and its authorships.
    ///
    /// Refused while any loan references the item.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let kind: MediaKind =
            sqlx::query_scalar("SELECT kind FROM media WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Media with id {} not found", id)))?;

        let loans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE media_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if loans > 0 {
            return Err(AppError::Conflict(format!(
                "Media is referenced by {} loan(s)",
                loans
            )));
        }

        sqlx::query("DELETE FROM authorships WHERE media_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let detail_sql = format!("DELETE FROM {} WHERE media_id = $1", kind.detail_table());
        sqlx::query(&detail_sql).bind(id).execute(&mut *tx).await?;

        sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::foreign_key_violation_as_conflict(e, "Media is referenced by a loan"))?;

        tx.commit().await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Authorships
    // -----------------------------------------------------------------------

    /// Authors credited on a media item
    pub async fn authors(&self, media_id: i32) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT au.* FROM authors au
            JOIN authorships s ON s.author_id = au.id
            WHERE s.media_id = $1
            ORDER BY au.name, au.id
            "#,
        )
        .bind(media_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    /// Media items credited to an author
    pub async fn works(&self, author_id: i32) -> AppResult<Vec<Media>> {
        let sql = format!(
            r#"{MEDIA_COLUMNS} {MEDIA_FROM}
            JOIN authorships s ON s.media_id = m.id
            WHERE s.author_id = $1
            ORDER BY {MEDIA_TITLE}, m.id"#
        );
        let rows = sqlx::query_as::<_, MediaRow>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        into_media(rows)
    }

    pub async fn add_author(&self, media_id: i32, author_id: i32) -> AppResult<Authorship> {
        sqlx::query_as::<_, Authorship>(
            "INSERT INTO authorships (author_id, media_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(author_id)
        .bind(media_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Media or author not found".to_string())
            }
            other => AppError::unique_violation_as_conflict(other, "Author is already linked to this media"),
        })
    }

    pub async fn remove_author(&self, media_id: i32, author_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authorships WHERE media_id = $1 AND author_id = $2")
            .bind(media_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Author {} is not linked to media {}",
                author_id, media_id
            )));
        }
        Ok(())
    }
}

/// Upsert the detail row matching the variant
async fn save_details(conn: &mut PgConnection, media_id: i32, details: &MediaDetails) -> AppResult<()> {
    match details {
        MediaDetails::Book(d) => {
            sqlx::query(
                r#"
                INSERT INTO books (media_id, title, isbn, page_count, publisher, published_on)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (media_id) DO UPDATE SET
                    title = EXCLUDED.title, isbn = EXCLUDED.isbn, page_count = EXCLUDED.page_count,
                    publisher = EXCLUDED.publisher, published_on = EXCLUDED.published_on
                "#,
            )
            .bind(media_id)
            .bind(&d.title)
            .bind(&d.isbn)
            .bind(d.page_count)
            .bind(&d.publisher)
            .bind(d.published_on)
            .execute(conn)
            .await?;
        }
        MediaDetails::Magazine(d) => {
            sqlx::query(
                r#"
                INSERT INTO magazines (media_id, title, issn, periodicity, publisher, published_on)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (media_id) DO UPDATE SET
                    title = EXCLUDED.title, issn = EXCLUDED.issn, periodicity = EXCLUDED.periodicity,
                    publisher = EXCLUDED.publisher, published_on = EXCLUDED.published_on
                "#,
            )
            .bind(media_id)
            .bind(&d.title)
            .bind(&d.issn)
            .bind(&d.periodicity)
            .bind(&d.publisher)
            .bind(d.published_on)
            .execute(conn)
            .await?;
        }
        MediaDetails::Dvd(d) => {
            sqlx::query(
                r#"
                INSERT INTO dvds (media_id, title, isan, duration_minutes, distributor, released_on)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (media_id) DO UPDATE SET
                    title = EXCLUDED.title, isan = EXCLUDED.isan,
                    duration_minutes = EXCLUDED.duration_minutes,
                    distributor = EXCLUDED.distributor, released_on = EXCLUDED.released_on
                "#,
            )
            .bind(media_id)
            .bind(&d.title)
            .bind(&d.isan)
            .bind(d.duration_minutes)
            .bind(&d.distributor)
            .bind(d.released_on)
            .execute(conn)
            .await?;
        }
        MediaDetails::Article(d) => {
            sqlx::query(
                r#"
                INSERT INTO articles (media_id, title, doi, publisher, published_on)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (media_id) DO UPDATE SET
                    title = EXCLUDED.title, doi = EXCLUDED.doi,
                    publisher = EXCLUDED.publisher, published_on = EXCLUDED.published_on
                "#,
            )
            .bind(media_id)
            .bind(&d.title)
            .bind(&d.doi)
            .bind(&d.publisher)
            .bind(d.published_on)
            .execute(conn)
            .await?;
        }
    }
    Ok(())
}
