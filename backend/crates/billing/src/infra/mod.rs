//! Infrastructure Layer

pub mod gateway;
pub mod postgres;

pub use gateway::SimulatedGateway;
pub use postgres::PgBillingRepository;
