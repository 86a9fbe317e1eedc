//! Domain Layer
//!
//! Contains entities, value objects, the earnings arithmetic, the payment
//! gateway port and repository traits.

pub mod earnings;
pub mod entity;
pub mod gateway;
pub mod repository;
pub mod value_object;

// Re-exports
pub use earnings::{CourseEarnings, CourseSales, EarningsSummary, PayoutTotals};
pub use entity::{
    payment::{CourseForSale, Payment},
    payout::Payout,
};
pub use gateway::{ChargeOutcome, ChargeRequest, PaymentGateway};
pub use repository::{PaymentRepository, PaymentView, PayoutRepository, PayoutView};
