//! Domain Layer

pub mod repository;
pub mod stats;

pub use repository::StatsRepository;
pub use stats::PlatformStats;
