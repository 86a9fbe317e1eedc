//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{RefreshTokenId, UserId};
use kernel::page::{Page, PageRequest};
use kernel::role::Role;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    credentials::Credentials, password_reset::PasswordReset, profile::Profile,
    refresh_token::RefreshToken, user::User,
};
use crate::domain::repository::{
    CredentialsRepository, PasswordResetRepository, ProfileRepository, RefreshTokenRepository,
    UserFilter, UserRepository,
};
use crate::domain::value_object::{
    email::Email, full_name::FullName, user_password::UserPassword, user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove expired refresh tokens and password resets
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<(u64, u64)> {
        let tokens = RefreshTokenRepository::delete_expired(self, now).await?;
        let resets = PasswordResetRepository::delete_expired(self, now).await?;

        tracing::info!(
            refresh_tokens_deleted = tokens,
            password_resets_deleted = resets,
            "Cleaned up expired auth tokens"
        );

        Ok((tokens, resets))
    }
}

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    full_name,
    user_role,
    user_status,
    last_login_at,
    created_at,
    updated_at
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create_account(
        &self,
        user: &User,
        credentials: &Credentials,
        profile: &Profile,
    ) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                full_name,
                user_role,
                user_status,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.full_name.as_str())
        .bind(user.role.id())
        .bind(user.status.id())
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Database(e)
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO credentials (
                user_id,
                password_hash,
                login_failed_count,
                locked_until,
                password_changed_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.login_failed_count as i16)
        .bind(credentials.locked_until)
        .bind(credentials.password_changed_at)
        .bind(credentials.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, headline, bio, website_url, avatar_key, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(&profile.headline)
        .bind(&profile.bio)
        .bind(&profile.website_url)
        .bind(&profile.avatar_key)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                full_name = $2,
                user_role = $3,
                user_status = $4,
                last_login_at = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.full_name.as_str())
        .bind(user.role.id())
        .bind(user.status.id())
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> AuthResult<Page<User>> {
        const WHERE: &str = r#"
            WHERE ($1::SMALLINT IS NULL OR user_role = $1)
              AND ($2::SMALLINT IS NULL OR user_status = $2)
              AND ($3::TEXT IS NULL
                   OR email LIKE '%' || $3 || '%'
                   OR LOWER(full_name) LIKE '%' || $3 || '%')
        "#;

        let role = filter.role.map(|r| r.id());
        let status = filter.status.map(|s| s.id());
        let search = filter.search.as_deref().map(escape_like);

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {WHERE}"))
            .bind(role)
            .bind(status)
            .bind(search.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users {WHERE} \
             ORDER BY created_at DESC, user_id LIMIT $4 OFFSET $5"
        ))
        .bind(role)
        .bind(status)
        .bind(search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(|r| r.into_user())
            .collect::<AuthResult<Vec<_>>>()?;

        Ok(Page::new(users, total, page))
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// Credentials Repository Implementation
// ============================================================================

impl CredentialsRepository for PgAuthRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                login_failed_count,
                locked_until,
                password_changed_at,
                updated_at
            FROM credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credentials()).transpose()
    }

    async fn update(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE credentials SET
                password_hash = $2,
                login_failed_count = $3,
                locked_until = $4,
                password_changed_at = $5,
                updated_at = $6
            WHERE user_id = $1
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.login_failed_count as i16)
        .bind(credentials.locked_until)
        .bind(credentials.password_changed_at)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

const INSERT_REFRESH_TOKEN: &str = r#"
    INSERT INTO refresh_tokens (
        token_id,
        user_id,
        token_hash,
        family_id,
        expires_at,
        revoked_at,
        replaced_by,
        client_ip,
        user_agent,
        created_at
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

fn bind_refresh_token<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    token: &'q RefreshToken,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(token.token_id.as_uuid())
        .bind(token.user_id.as_uuid())
        .bind(&token.token_hash)
        .bind(token.family_id)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .bind(token.replaced_by.map(RefreshTokenId::into_uuid))
        .bind(&token.client_ip)
        .bind(&token.user_agent)
        .bind(token.created_at)
}

impl RefreshTokenRepository for PgAuthRepository {
    async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
        bind_refresh_token(sqlx::query(INSERT_REFRESH_TOKEN), token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &[u8]) -> AuthResult<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT
                token_id,
                user_id,
                token_hash,
                family_id,
                expires_at,
                revoked_at,
                replaced_by,
                client_ip,
                user_agent,
                created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_token()))
    }

    async fn rotate(
        &self,
        old: &RefreshTokenId,
        successor: &RefreshToken,
        now: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        // The row lock makes concurrent rotations of one token serialize here
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $2, replaced_by = $3
            WHERE token_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(old.as_uuid())
        .bind(now)
        .bind(successor.token_id.as_uuid())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if revoked == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        bind_refresh_token(sqlx::query(INSERT_REFRESH_TOKEN), successor)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn revoke(&self, token_id: &RefreshTokenId, now: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE token_id = $1 AND revoked_at IS NULL",
        )
        .bind(token_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_family(&self, family_id: Uuid, now: DateTime<Utc>) -> AuthResult<u64> {
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE family_id = $1 AND revoked_at IS NULL",
        )
        .bind(family_id)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }

    async fn revoke_all_for_user(&self, user_id: &UserId, now: DateTime<Utc>) -> AuthResult<u64> {
        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(revoked)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Password Reset Repository Implementation
// ============================================================================

impl PasswordResetRepository for PgAuthRepository {
    async fn create(&self, reset: &PasswordReset) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (token_hash, user_id, expires_at, used_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&reset.token_hash)
        .bind(reset.user_id.as_uuid())
        .bind(reset.expires_at)
        .bind(reset.used_at)
        .bind(reset.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &[u8]) -> AuthResult<Option<PasswordReset>> {
        let row = sqlx::query_as::<_, PasswordResetRow>(
            r#"
            SELECT token_hash, user_id, expires_at, used_at, created_at
            FROM password_resets
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_reset()))
    }

    async fn mark_used(&self, token_hash: &[u8], now: DateTime<Utc>) -> AuthResult<bool> {
        let updated = sqlx::query(
            "UPDATE password_resets SET used_at = $2 WHERE token_hash = $1 AND used_at IS NULL",
        )
        .bind(token_hash)
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM password_resets WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Profile Repository Implementation
// ============================================================================

impl ProfileRepository for PgAuthRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, headline, bio, website_url, avatar_key, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_profile()))
    }

    async fn upsert(&self, profile: &Profile) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, headline, bio, website_url, avatar_key, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                headline = EXCLUDED.headline,
                bio = EXCLUDED.bio,
                website_url = EXCLUDED.website_url,
                avatar_key = EXCLUDED.avatar_key,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(&profile.headline)
        .bind(&profile.bio)
        .bind(&profile.website_url)
        .bind(&profile.avatar_key)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    full_name: String,
    user_role: i16,
    user_status: i16,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = Role::from_id(self.user_role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid user_role: {}", self.user_role)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            full_name: FullName::from_db(self.full_name),
            role,
            status: UserStatus::from_id(self.user_status),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    password_hash: String,
    login_failed_count: i16,
    locked_until: Option<DateTime<Utc>>,
    password_changed_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    fn into_credentials(self) -> AuthResult<Credentials> {
        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            login_failed_count: self.login_failed_count.max(0) as u16,
            locked_until: self.locked_until,
            password_changed_at: self.password_changed_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    token_id: Uuid,
    user_id: Uuid,
    token_hash: Vec<u8>,
    family_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by: Option<Uuid>,
    client_ip: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRow {
    fn into_token(self) -> RefreshToken {
        RefreshToken {
            token_id: RefreshTokenId::from_uuid(self.token_id),
            user_id: UserId::from_uuid(self.user_id),
            token_hash: self.token_hash,
            family_id: self.family_id,
            expires_at: self.expires_at,
            revoked_at: self.revoked_at,
            replaced_by: self.replaced_by.map(RefreshTokenId::from_uuid),
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PasswordResetRow {
    token_hash: Vec<u8>,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PasswordResetRow {
    fn into_reset(self) -> PasswordReset {
        PasswordReset {
            token_hash: self.token_hash,
            user_id: UserId::from_uuid(self.user_id),
            expires_at: self.expires_at,
            used_at: self.used_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    headline: Option<String>,
    bio: Option<String>,
    website_url: Option<String>,
    avatar_key: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            user_id: UserId::from_uuid(self.user_id),
            headline: self.headline,
            bio: self.bio,
            website_url: self.website_url,
            avatar_key: self.avatar_key,
            updated_at: self.updated_at,
        }
    }
}
