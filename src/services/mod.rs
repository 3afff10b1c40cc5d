//! Business logic services

pub mod authors;
pub mod libraries;
pub mod loans;
pub mod media;
pub mod penalties;
pub mod search;
pub mod stats;
pub mod users;

use std::sync::Arc;

use crate::{config::LoanPolicy, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub libraries: libraries::LibrariesService,
    pub media: media::MediaService,
    pub authors: authors::AuthorsService,
    pub loans: loans::LoansService,
    pub penalties: penalties::PenaltiesService,
    pub stats: stats::StatsService,
    pub search: search::SearchService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loan_policy: LoanPolicy) -> Self {
        Self {
            users: users::UsersService::new(repository.clone()),
            libraries: libraries::LibrariesService::new(repository.clone()),
            media: media::MediaService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            loans: loans::LoansService::new(Arc::new(repository.loans.clone()), loan_policy),
            penalties: penalties::PenaltiesService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            search: search::SearchService::new(repository.clone()),
            repository,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await?;
        Ok(())
    }
}
