//! Profile Use Cases
//!
//! Own profile read/update, avatar upload and the public profile view.

use std::sync::Arc;

use kernel::clock::Clock;
use kernel::id::UserId;
use platform::storage::{ImageUpload, ObjectStore};

use crate::application::config::AuthConfig;
use crate::domain::entity::{profile::Profile, user::User};
use crate::domain::repository::{ProfileRepository, UserRepository};
use crate::domain::value_object::full_name::FullName;
use crate::error::{AuthError, AuthResult};

pub const HEADLINE_MAX_LENGTH: usize = 120;
pub const BIO_MAX_LENGTH: usize = 2000;
pub const WEBSITE_URL_MAX_LENGTH: usize = 255;

/// Object-store prefix for avatars
pub const AVATAR_PREFIX: &str = "avatars";

/// Account and profile together
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: User,
    pub profile: Profile,
}

pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
}

impl UpdateProfileInput {
    fn validate(&self) -> AuthResult<()> {
        if let Some(headline) = &self.headline
            && headline.trim().chars().count() > HEADLINE_MAX_LENGTH
        {
            return Err(AuthError::Validation(format!(
                "headline must be at most {HEADLINE_MAX_LENGTH} characters"
            )));
        }
        if let Some(bio) = &self.bio
            && bio.trim().chars().count() > BIO_MAX_LENGTH
        {
            return Err(AuthError::Validation(format!(
                "bio must be at most {BIO_MAX_LENGTH} characters"
            )));
        }
        if let Some(url) = &self.website_url {
            let url = url.trim();
            if !url.is_empty() && !is_http_url(url) {
                return Err(AuthError::Validation(
                    "websiteUrl must be an http(s) URL".to_string(),
                ));
            }
            if url.len() > WEBSITE_URL_MAX_LENGTH {
                return Err(AuthError::Validation(format!(
                    "websiteUrl must be at most {WEBSITE_URL_MAX_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

// ============================================================================
// Read
// ============================================================================

pub struct GetProfileUseCase<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    user_repo: Arc<U>,
    profile_repo: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<U, P> GetProfileUseCase<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    pub fn new(user_repo: Arc<U>, profile_repo: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repo,
            profile_repo,
            clock,
        }
    }

    /// Also serves the public profile; suspended accounts are hidden there
    pub async fn execute(&self, user_id: UserId, public: bool) -> AuthResult<ProfileView> {
        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .filter(|u| !public || u.can_sign_in())
            .ok_or(AuthError::UserNotFound)?;

        let profile = self
            .profile_repo
            .find_by_user_id(&user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id, self.clock.now()));

        Ok(ProfileView { user, profile })
    }
}

// ============================================================================
// Update
// ============================================================================

pub struct UpdateProfileUseCase<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    user_repo: Arc<U>,
    profile_repo: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<U, P> UpdateProfileUseCase<U, P>
where
    U: UserRepository,
    P: ProfileRepository,
{
    pub fn new(user_repo: Arc<U>, profile_repo: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_repo,
            profile_repo,
            clock,
        }
    }

    pub async fn execute(
        &self,
        user_id: UserId,
        input: UpdateProfileInput,
    ) -> AuthResult<ProfileView> {
        input.validate()?;
        let now = self.clock.now();

        let mut user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(full_name) = input.full_name {
            user.rename(FullName::new(&full_name)?, now);
            self.user_repo.update(&user).await?;
        }

        let mut profile = self
            .profile_repo
            .find_by_user_id(&user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id, now));
        profile.update_details(input.headline, input.bio, input.website_url, now);
        self.profile_repo.upsert(&profile).await?;

        tracing::info!(user_id = %user_id, "Profile updated");

        Ok(ProfileView { user, profile })
    }
}

// ============================================================================
// Avatar
// ============================================================================

pub struct UploadAvatarUseCase<P, S>
where
    P: ProfileRepository,
    S: ObjectStore,
{
    profile_repo: Arc<P>,
    storage: Arc<S>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl<P, S> UploadAvatarUseCase<P, S>
where
    P: ProfileRepository,
    S: ObjectStore,
{
    pub fn new(
        profile_repo: Arc<P>,
        storage: Arc<S>,
        config: Arc<AuthConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profile_repo,
            storage,
            config,
            clock,
        }
    }

    /// Returns the new object key
    pub async fn execute(
        &self,
        user_id: UserId,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> AuthResult<String> {
        let upload = ImageUpload::new(content_type, bytes, self.config.max_avatar_bytes)?;
        let key = upload.new_key(AVATAR_PREFIX);
        let size = upload.size_bytes();

        self.storage.put(&key, upload.into_bytes()).await?;

        let now = self.clock.now();
        let mut profile = self
            .profile_repo
            .find_by_user_id(&user_id)
            .await?
            .unwrap_or_else(|| Profile::empty(user_id, now));
        let previous = profile.replace_avatar(key.clone(), now);

        if let Err(e) = self.profile_repo.upsert(&profile).await {
            // Do not leave an unreferenced object behind
            if let Err(cleanup) = self.storage.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned avatar");
            }
            return Err(e);
        }

        if let Some(previous) = previous
            && let Err(e) = self.storage.delete(&previous).await
        {
            tracing::warn!(key = %previous, error = %e, "Failed to delete previous avatar");
        }

        tracing::info!(user_id = %user_id, key = %key, size, "Avatar uploaded");

        Ok(key)
    }
}
