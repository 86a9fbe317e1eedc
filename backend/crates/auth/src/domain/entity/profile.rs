//! Profile Entity
//!
//! Public-facing details of an account. The avatar is an object-store key.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: UserId,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub avatar_key: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn empty(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            headline: None,
            bio: None,
            website_url: None,
            avatar_key: None,
            updated_at: now,
        }
    }

    /// Blank strings clear the field
    pub fn update_details(
        &mut self,
        headline: Option<String>,
        bio: Option<String>,
        website_url: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.headline = non_blank(headline);
        self.bio = non_blank(bio);
        self.website_url = non_blank(website_url);
        self.updated_at = now;
    }

    /// Returns the replaced key, which the caller deletes from storage
    pub fn replace_avatar(&mut self, key: String, now: DateTime<Utc>) -> Option<String> {
        self.updated_at = now;
        self.avatar_key.replace(key)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
