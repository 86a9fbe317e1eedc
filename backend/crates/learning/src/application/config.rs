//! Application Configuration
//!
//! Configuration for the Learning application layer.

use platform::storage::DEFAULT_MAX_IMAGE_BYTES;

/// Learning application configuration
#[derive(Debug, Clone)]
pub struct LearningConfig {
    /// Used when a quiz is created without a threshold
    pub default_pass_percentage: i16,
    /// Attempts shown on the student dashboard
    pub recent_attempts_limit: i64,
    /// Thumbnail upload limit
    pub max_thumbnail_bytes: usize,
}

impl LearningConfig {
    pub fn new() -> Self {
        Self {
            default_pass_percentage: 70,
            recent_attempts_limit: 5,
            max_thumbnail_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn development() -> Self {
        Self::new()
    }
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self::new()
    }
}
