//! Value Objects

pub mod certificate_code;
pub mod course_level;
pub mod course_status;
pub mod enrollment_source;

pub use certificate_code::CertificateCode;
pub use course_level::CourseLevel;
pub use course_status::CourseStatus;
pub use enrollment_source::EnrollmentSource;
