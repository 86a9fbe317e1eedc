//! Application Layer

pub mod dashboard;

pub use dashboard::PlatformDashboardUseCase;
