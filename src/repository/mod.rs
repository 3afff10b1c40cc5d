//! Repository layer for database operations

pub mod authors;
pub mod libraries;
pub mod loans;
pub mod media;
pub mod penalties;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub libraries: libraries::LibrariesRepository,
    pub media: media::MediaRepository,
    pub authors: authors::AuthorsRepository,
    pub loans: loans::LoansRepository,
    pub penalties: penalties::PenaltiesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            libraries: libraries::LibrariesRepository::new(pool.clone()),
            media: media::MediaRepository::new(pool.clone()),
            authors: authors::AuthorsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            penalties: penalties::PenaltiesRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Blank search terms mean "no filter"
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(like_pattern("casa"), "%casa%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn blank_search_is_no_filter() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" Machado ")), Some("%Machado%".to_string()));
    }
}
