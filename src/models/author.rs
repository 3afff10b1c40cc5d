//! Author model and authorship links

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AuthorQuery {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl AuthorQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub death_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub death_date: Option<Option<NaiveDate>>,
}

impl UpdateAuthor {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.birth_date.is_none() && self.death_date.is_none()
    }

    pub fn apply(self, author: &mut Author) {
        if let Some(name) = self.name {
            author.name = name;
        }
        if let Some(birth_date) = self.birth_date {
            author.birth_date = birth_date;
        }
        if let Some(death_date) = self.death_date {
            author.death_date = death_date;
        }
    }
}

/// Birth must not come after death
pub fn check_lifespan(birth: Option<NaiveDate>, death: Option<NaiveDate>) -> Result<(), String> {
    match (birth, death) {
        (Some(b), Some(d)) if d < b => Err("death_date must not precede birth_date".to_string()),
        _ => Ok(()),
    }
}

/// Author ↔ media link
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Authorship {
    pub id: i32,
    pub author_id: i32,
    pub media_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Link an author to a media item
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddAuthorship {
    pub author_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lifespan_must_be_ordered() {
        assert!(check_lifespan(Some(date(1900, 1, 1)), Some(date(1950, 1, 1))).is_ok());
        assert!(check_lifespan(Some(date(1950, 1, 1)), Some(date(1900, 1, 1))).is_err());
        assert!(check_lifespan(None, Some(date(1900, 1, 1))).is_ok());
    }

    #[test]
    fn patch_can_clear_death_date() {
        let mut author = Author {
            id: 3,
            name: "Clarice Lispector".into(),
            birth_date: Some(date(1920, 12, 10)),
            death_date: Some(date(1977, 12, 9)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let patch: UpdateAuthor =
            serde_json::from_value(serde_json::json!({ "death_date": null })).unwrap();
        patch.apply(&mut author);
        assert_eq!(author.death_date, None);
        assert_eq!(author.birth_date, Some(date(1920, 12, 10)));
    }
}
