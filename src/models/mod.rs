//! Data models for Biblio

pub mod author;
pub mod library;
pub mod loan;
pub mod media;
pub mod pagination;
pub mod penalty;
pub mod user;

// Re-export commonly used types
pub use author::{Author, Authorship};
pub use library::Library;
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use media::{Media, MediaDetails, MediaKind};
pub use pagination::{PageRequest, PaginatedResponse};
pub use penalty::Penalty;
pub use user::User;
