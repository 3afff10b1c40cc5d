//! Media model: a base row plus exactly one typed detail record

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

use super::pagination::PageRequest;

/// Media variant tag (`media_kind` in the database)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "media_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Book,
    Magazine,
    Dvd,
    Article,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Book => "book",
            MediaKind::Magazine => "magazine",
            MediaKind::Dvd => "dvd",
            MediaKind::Article => "article",
        }
    }

    /// Detail table holding this variant's fields
    pub fn detail_table(&self) -> &'static str {
        match self {
            MediaKind::Book => "books",
            MediaKind::Magazine => "magazines",
            MediaKind::Dvd => "dvds",
            MediaKind::Article => "articles",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Variant details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookDetails {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub isbn: Option<String>,
    #[validate(range(min = 1, message = "page_count must be positive"))]
    pub page_count: Option<i32>,
    pub publisher: Option<String>,
    pub published_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct MagazineDetails {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub issn: Option<String>,
    pub periodicity: Option<String>,
    pub publisher: Option<String>,
    pub published_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DvdDetails {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub isan: Option<String>,
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub duration_minutes: Option<i32>,
    pub distributor: Option<String>,
    pub released_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ArticleDetails {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub doi: Option<String>,
    pub publisher: Option<String>,
    pub published_on: Option<NaiveDate>,
}

/// Variant-specific fields, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaDetails {
    Book(BookDetails),
    Magazine(MagazineDetails),
    Dvd(DvdDetails),
    Article(ArticleDetails),
}

impl MediaDetails {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDetails::Book(_) => MediaKind::Book,
            MediaDetails::Magazine(_) => MediaKind::Magazine,
            MediaDetails::Dvd(_) => MediaKind::Dvd,
            MediaDetails::Article(_) => MediaKind::Article,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaDetails::Book(d) => &d.title,
            MediaDetails::Magazine(d) => &d.title,
            MediaDetails::Dvd(d) => &d.title,
            MediaDetails::Article(d) => &d.title,
        }
    }
}

impl Validate for MediaDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            MediaDetails::Book(d) => d.validate(),
            MediaDetails::Magazine(d) => d.validate(),
            MediaDetails::Dvd(d) => d.validate(),
            MediaDetails::Article(d) => d.validate(),
        }
    }
}

/// Media item as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Media {
    pub id: i32,
    pub condition: Option<String>,
    pub library_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// No open loan holds this item
    pub available: bool,
    /// Variant fields, tagged by `kind` (`book`, `magazine`, `dvd`, `article`)
    #[schema(value_type = Object)]
    pub details: MediaDetails,
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        self.details.kind()
    }
}

/// Base row left-joined with every detail table; only the columns of the
/// row's own kind are populated.
#[derive(Debug, FromRow)]
pub struct MediaRow {
    pub id: i32,
    pub kind: MediaKind,
    pub condition: Option<String>,
    pub library_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub book_title: Option<String>,
    pub isbn: Option<String>,
    pub page_count: Option<i32>,
    pub book_publisher: Option<String>,
    pub book_published_on: Option<NaiveDate>,
    pub magazine_title: Option<String>,
    pub issn: Option<String>,
    pub periodicity: Option<String>,
    pub magazine_publisher: Option<String>,
    pub magazine_published_on: Option<NaiveDate>,
    pub dvd_title: Option<String>,
    pub isan: Option<String>,
    pub duration_minutes: Option<i32>,
    pub distributor: Option<String>,
    pub released_on: Option<NaiveDate>,
    pub article_title: Option<String>,
    pub doi: Option<String>,
    pub article_publisher: Option<String>,
    pub article_published_on: Option<NaiveDate>,
    pub available: bool,
}

impl TryFrom<MediaRow> for Media {
    type Error = AppError;

    fn try_from(row: MediaRow) -> Result<Self, Self::Error> {
        let missing = || AppError::Internal(format!("media {} has no {} record", row.id, row.kind));

        let details = match row.kind {
            MediaKind::Book => MediaDetails::Book(BookDetails {
                title: row.book_title.clone().ok_or_else(missing)?,
                isbn: row.isbn.clone(),
                page_count: row.page_count,
                publisher: row.book_publisher.clone(),
                published_on: row.book_published_on,
            }),
            MediaKind::Magazine => MediaDetails::Magazine(MagazineDetails {
                title: row.magazine_title.clone().ok_or_else(missing)?,
                issn: row.issn.clone(),
                periodicity: row.periodicity.clone(),
                publisher: row.magazine_publisher.clone(),
                published_on: row.magazine_published_on,
            }),
            MediaKind::Dvd => MediaDetails::Dvd(DvdDetails {
                title: row.dvd_title.clone().ok_or_else(missing)?,
                isan: row.isan.clone(),
                duration_minutes: row.duration_minutes,
                distributor: row.distributor.clone(),
                released_on: row.released_on,
            }),
            MediaKind::Article => MediaDetails::Article(ArticleDetails {
                title: row.article_title.clone().ok_or_else(missing)?,
                doi: row.doi.clone(),
                publisher: row.article_publisher.clone(),
                published_on: row.article_published_on,
            }),
        };

        Ok(Media {
            id: row.id,
            condition: row.condition,
            library_id: row.library_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            available: row.available,
            details,
        })
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Media list filters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MediaQuery {
    pub kind: Option<MediaKind>,
    pub library_id: Option<i32>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    /// `true` for items not currently on loan, `false` for items on loan
    pub available: Option<bool>,
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl MediaQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Filters for the per-variant listings (`/books`, `/dvds`, ...)
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub search: Option<String>,
    /// `true` for items not currently on loan, `false` for items on loan
    pub available: Option<bool>,
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl CatalogQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn into_media_query(self, kind: MediaKind) -> MediaQuery {
        MediaQuery {
            kind: Some(kind),
            library_id: None,
            search: self.search,
            available: self.available,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Create media request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMedia {
    pub condition: Option<String>,
    pub library_id: Option<i32>,
    #[schema(value_type = Object)]
    pub details: MediaDetails,
}

impl Validate for CreateMedia {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.details.validate()
    }
}

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct BookPatch {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub isbn: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub page_count: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub publisher: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub published_on: Option<Option<NaiveDate>>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct MagazinePatch {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub issn: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub periodicity: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub publisher: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub published_on: Option<Option<NaiveDate>>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct DvdPatch {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub isan: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub duration_minutes: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub distributor: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub released_on: Option<Option<NaiveDate>>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
pub struct ArticlePatch {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub doi: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub publisher: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub published_on: Option<Option<NaiveDate>>,
}

/// Patch for the variant fields; its `kind` must match the stored item
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaDetailsPatch {
    Book(BookPatch),
    Magazine(MagazinePatch),
    Dvd(DvdPatch),
    Article(ArticlePatch),
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl MediaDetailsPatch {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaDetailsPatch::Book(_) => MediaKind::Book,
            MediaDetailsPatch::Magazine(_) => MediaKind::Magazine,
            MediaDetailsPatch::Dvd(_) => MediaKind::Dvd,
            MediaDetailsPatch::Article(_) => MediaKind::Article,
        }
    }

    /// Apply onto the stored details; switching variants is rejected.
    pub fn apply(self, details: &mut MediaDetails) -> Result<(), AppError> {
        match (self, details) {
            (MediaDetailsPatch::Book(p), MediaDetails::Book(d)) => {
                set(&mut d.title, p.title);
                set(&mut d.isbn, p.isbn);
                set(&mut d.page_count, p.page_count);
                set(&mut d.publisher, p.publisher);
                set(&mut d.published_on, p.published_on);
            }
            (MediaDetailsPatch::Magazine(p), MediaDetails::Magazine(d)) => {
                set(&mut d.title, p.title);
                set(&mut d.issn, p.issn);
                set(&mut d.periodicity, p.periodicity);
                set(&mut d.publisher, p.publisher);
                set(&mut d.published_on, p.published_on);
            }
            (MediaDetailsPatch::Dvd(p), MediaDetails::Dvd(d)) => {
                set(&mut d.title, p.title);
                set(&mut d.isan, p.isan);
                set(&mut d.duration_minutes, p.duration_minutes);
                set(&mut d.distributor, p.distributor);
                set(&mut d.released_on, p.released_on);
            }
            (MediaDetailsPatch::Article(p), MediaDetails::Article(d)) => {
                set(&mut d.title, p.title);
                set(&mut d.doi, p.doi);
                set(&mut d.publisher, p.publisher);
                set(&mut d.published_on, p.published_on);
            }
            (patch, details) => {
                return Err(AppError::Validation(format!(
                    "media kind cannot be changed from {} to {}",
                    details.kind(),
                    patch.kind()
                )))
            }
        }
        Ok(())
    }
}

impl Validate for MediaDetailsPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            MediaDetailsPatch::Book(p) => p.validate(),
            MediaDetailsPatch::Magazine(p) => p.validate(),
            MediaDetailsPatch::Dvd(p) => p.validate(),
            MediaDetailsPatch::Article(p) => p.validate(),
        }
    }
}

/// Partial media update
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMedia {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub condition: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub library_id: Option<Option<i32>>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<MediaDetailsPatch>,
}

impl Validate for UpdateMedia {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match &self.details {
            Some(details) => details.validate(),
            None => Ok(()),
        }
    }
}

impl UpdateMedia {
    pub fn is_empty(&self) -> bool {
        self.condition.is_none() && self.library_id.is_none() && self.details.is_none()
    }

    pub fn apply(self, media: &mut Media) -> Result<(), AppError> {
        set(&mut media.condition, self.condition);
        set(&mut media.library_id, self.library_id);
        if let Some(details) = self.details {
            details.apply(&mut media.details)?;
        }
        Ok(())
    }
}
