//! Domain Entities

pub mod certificate;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod progress;
pub mod quiz;
pub mod quiz_attempt;
