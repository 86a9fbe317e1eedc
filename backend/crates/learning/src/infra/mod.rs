//! Infrastructure Layer
//!
//! PostgreSQL implementations of the learning repositories.

pub mod postgres;

pub use postgres::PgLearningRepository;
