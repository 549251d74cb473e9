// Public API
pub use models::MatchRecord;
pub use repository::{
    InMemoryMatchHistoryRepository, MatchHistoryRepository, PostgresMatchHistoryRepository,
};

// Internal modules
mod models;
mod repository;
