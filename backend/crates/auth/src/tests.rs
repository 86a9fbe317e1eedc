//! Use-case and router tests for the auth crate
//!
//! Everything runs against [`memory::MemoryAuthRepository`], an in-memory
//! implementation of every auth repository trait.

mod memory {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, MutexGuard};

    use chrono::{DateTime, Utc};
    use kernel::id::{RefreshTokenId, UserId};
    use kernel::page::{Page, PageRequest};
    use uuid::Uuid;

    use crate::domain::entity::{
        credentials::Credentials, password_reset::PasswordReset, profile::Profile,
        refresh_token::RefreshToken, user::User,
    };
    use crate::domain::repository::{
        CredentialsRepository, PasswordResetRepository, ProfileRepository, RefreshTokenRepository,
        UserFilter, UserRepository,
    };
    use crate::domain::value_object::email::Email;
    use crate::error::{AuthError, AuthResult};

    #[derive(Default)]
    struct Tables {
        users: HashMap<UserId, User>,
        credentials: HashMap<UserId, Credentials>,
        profiles: HashMap<UserId, Profile>,
        refresh_tokens: Vec<RefreshToken>,
        resets: Vec<PasswordReset>,
    }

    #[derive(Clone, Default)]
    pub struct MemoryAuthRepository {
        tables: Arc<Mutex<Tables>>,
    }

    impl MemoryAuthRepository {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Tables> {
            self.tables.lock().unwrap_or_else(|e| e.into_inner())
        }

        pub fn active_tokens(&self, user_id: &UserId) -> usize {
            self.lock()
                .refresh_tokens
                .iter()
                .filter(|t| &t.user_id == user_id && t.revoked_at.is_none())
                .count()
        }

        pub fn user_count(&self) -> usize {
            self.lock().users.len()
        }

        pub fn credentials_of(&self, user_id: &UserId) -> Credentials {
            self.lock().credentials[user_id].clone()
        }
    }

    impl UserRepository for MemoryAuthRepository {
        async fn create_account(
            &self,
            user: &User,
            credentials: &Credentials,
            profile: &Profile,
        ) -> AuthResult<()> {
            let mut t = self.lock();
            if t.users.values().any(|u| u.email == user.email) {
                return Err(AuthError::EmailTaken);
            }
            t.users.insert(user.user_id, user.clone());
            t.credentials.insert(user.user_id, credentials.clone());
            t.profiles.insert(user.user_id, profile.clone());
            Ok(())
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
            Ok(self.lock().users.get(user_id).cloned())
        }

        async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
            Ok(self.lock().users.values().find(|u| &u.email == email).cloned())
        }

        async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
            Ok(self.lock().users.values().any(|u| &u.email == email))
        }

        async fn update(&self, user: &User) -> AuthResult<()> {
            self.lock().users.insert(user.user_id, user.clone());
            Ok(())
        }

        async fn list(&self, filter: &UserFilter, page: PageRequest) -> AuthResult<Page<User>> {
            let t = self.lock();
            let mut users: Vec<User> = t
                .users
                .values()
                .filter(|u| filter.role.is_none_or(|r| u.role == r))
                .filter(|u| filter.status.is_none_or(|s| u.status == s))
                .filter(|u| {
                    filter.search.as_deref().is_none_or(|s| {
                        u.email.as_str().contains(s)
                            || u.full_name.as_str().to_lowercase().contains(s)
                    })
                })
                .cloned()
                .collect();
            users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let total = users.len() as i64;
            let items = users
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect();
            Ok(Page::new(items, total, page))
        }
    }

    impl CredentialsRepository for MemoryAuthRepository {
        async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
            Ok(self.lock().credentials.get(user_id).cloned())
        }

        async fn update(&self, credentials: &Credentials) -> AuthResult<()> {
            self.lock()
                .credentials
                .insert(credentials.user_id, credentials.clone());
            Ok(())
        }
    }

    impl RefreshTokenRepository for MemoryAuthRepository {
        async fn create(&self, token: &RefreshToken) -> AuthResult<()> {
            self.lock().refresh_tokens.push(token.clone());
            Ok(())
        }

        async fn find_by_hash(&self, token_hash: &[u8]) -> AuthResult<Option<RefreshToken>> {
            Ok(self
                .lock()
                .refresh_tokens
                .iter()
                .find(|t| t.token_hash == token_hash)
                .cloned())
        }

        async fn rotate(
            &self,
            old: &RefreshTokenId,
            successor: &RefreshToken,
            now: DateTime<Utc>,
        ) -> AuthResult<bool> {
            let mut t = self.lock();
            let Some(current) = t
                .refresh_tokens
                .iter_mut()
                .find(|t| &t.token_id == old && t.revoked_at.is_none())
            else {
                return Ok(false);
            };
            current.revoked_at = Some(now);
            current.replaced_by = Some(successor.token_id);
            t.refresh_tokens.push(successor.clone());
            Ok(true)
        }

        async fn revoke(&self, token_id: &RefreshTokenId, now: DateTime<Utc>) -> AuthResult<()> {
            for token in self.lock().refresh_tokens.iter_mut() {
                if &token.token_id == token_id && token.revoked_at.is_none() {
                    token.revoked_at = Some(now);
                }
            }
            Ok(())
        }

        async fn revoke_family(&self, family_id: Uuid, now: DateTime<Utc>) -> AuthResult<u64> {
            let mut revoked = 0;
            for token in self.lock().refresh_tokens.iter_mut() {
                if token.family_id == family_id && token.revoked_at.is_none() {
                    token.revoked_at = Some(now);
                    revoked += 1;
                }
            }
            Ok(revoked)
        }

        async fn revoke_all_for_user(
            &self,
            user_id: &UserId,
            now: DateTime<Utc>,
        ) -> AuthResult<u64> {
            let mut revoked = 0;
            for token in self.lock().refresh_tokens.iter_mut() {
                if &token.user_id == user_id && token.revoked_at.is_none() {
                    token.revoked_at = Some(now);
                    revoked += 1;
                }
            }
            Ok(revoked)
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
            let mut t = self.lock();
            let before = t.refresh_tokens.len();
            t.refresh_tokens.retain(|token| token.expires_at >= now);
            Ok((before - t.refresh_tokens.len()) as u64)
        }
    }

    impl PasswordResetRepository for MemoryAuthRepository {
        async fn create(&self, reset: &PasswordReset) -> AuthResult<()> {
            self.lock().resets.push(reset.clone());
            Ok(())
        }

        async fn find_by_hash(&self, token_hash: &[u8]) -> AuthResult<Option<PasswordReset>> {
            Ok(self
                .lock()
                .resets
                .iter()
                .find(|r| r.token_hash == token_hash)
                .cloned())
        }

        async fn mark_used(&self, token_hash: &[u8], now: DateTime<Utc>) -> AuthResult<bool> {
            let mut t = self.lock();
            match t
                .resets
                .iter_mut()
                .find(|r| r.token_hash == token_hash && r.used_at.is_none())
            {
                Some(reset) => {
                    reset.used_at = Some(now);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
            let mut t = self.lock();
            let before = t.resets.len();
            t.resets.retain(|r| r.expires_at >= now);
            Ok((before - t.resets.len()) as u64)
        }
    }

    impl ProfileRepository for MemoryAuthRepository {
        async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Profile>> {
            Ok(self.lock().profiles.get(user_id).cloned())
        }

        async fn upsert(&self, profile: &Profile) -> AuthResult<()> {
            self.lock().profiles.insert(profile.user_id, profile.clone());
            Ok(())
        }
    }
}

mod use_case_tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use kernel::auth::CurrentUser;
    use kernel::clock::{Clock, FixedClock};
    use kernel::id::UserId;
    use kernel::role::Role;
    use platform::client::ClientInfo;
    use platform::mail::{Mailer, MemoryEmailSender};

    use super::memory::MemoryAuthRepository;
    use crate::application::*;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::user_status::UserStatus;
    use crate::error::AuthError;

    const PASSWORD: &str = "Correct-Horse-42";

    struct Fixture {
        repo: Arc<MemoryAuthRepository>,
        config: Arc<AuthConfig>,
        clock: Arc<FixedClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                repo: Arc::new(MemoryAuthRepository::new()),
                config: Arc::new(AuthConfig::development()),
                clock: Arc::new(FixedClock::new(Utc::now())),
            }
        }

        fn clock(&self) -> Arc<dyn Clock> {
            self.clock.clone()
        }

        async fn sign_up(
            &self,
            email: &str,
            role: Option<&str>,
        ) -> Result<SignUpOutput, AuthError> {
            SignUpUseCase::new(self.repo.clone(), self.config.clone(), self.clock())
                .execute(SignUpInput {
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                    full_name: "Ada Lovelace".to_string(),
                    role: role.map(str::to_string),
                })
                .await
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutput, AuthError> {
            SignInUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.repo.clone(),
                self.config.clone(),
                self.clock(),
            )
            .execute(
                SignInInput {
                    email: email.to_string(),
                    password: password.to_string(),
                },
                ClientInfo::default(),
            )
            .await
        }

        async fn refresh(&self, raw: &str) -> Result<RefreshOutput, AuthError> {
            RefreshUseCase::new(
                self.repo.clone(),
                self.repo.clone(),
                self.config.clone(),
                self.clock(),
            )
            .execute(raw, ClientInfo::default())
            .await
        }

        async fn make_admin(&self, user_id: UserId) {
            let mut user = self.repo.find_by_id(&user_id).await.unwrap().unwrap();
            user.change_role(Role::Admin, self.clock.now());
            self.repo.update(&user).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_sign_up_defaults_to_student() {
        let fx = Fixture::new();
        let out = fx.sign_up("Ada@Example.com", None).await.unwrap();
        assert_eq!(out.role, Role::Student);

        let user = fx.repo.find_by_id(&out.user_id).await.unwrap().unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_sign_up_rejects_admin_and_duplicates() {
        let fx = Fixture::new();

        let err = fx.sign_up("ada@example.com", Some("admin")).await.unwrap_err();
        assert!(matches!(err, AuthError::RoleNotSelfAssignable(_)));
        assert_eq!(err.status_code(), 400);

        fx.sign_up("ada@example.com", Some("instructor")).await.unwrap();
        let err = fx.sign_up("ADA@example.com", None).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_sign_up_weak_password() {
        let fx = Fixture::new();
        let err = SignUpUseCase::new(fx.repo.clone(), fx.config.clone(), fx.clock())
            .execute(SignUpInput {
                email: "ada@example.com".to_string(),
                password: "password1".to_string(),
                full_name: "Ada".to_string(),
                role: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_password_with_own_name() {
        let fx = Fixture::new();
        let err = SignUpUseCase::new(fx.repo.clone(), fx.config.clone(), fx.clock())
            .execute(SignUpInput {
                email: "grace@example.com".to_string(),
                password: "Lovelace-Rules-7".to_string(),
                full_name: "Ada Lovelace".to_string(),
                role: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(fx.repo.user_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_in_issues_verifiable_access_token() {
        let fx = Fixture::new();
        let signed_up = fx.sign_up("ada@example.com", Some("instructor")).await.unwrap();

        let out = fx.sign_in("ada@example.com", PASSWORD).await.unwrap();
        let claims = verify_access_token(&fx.config, &out.tokens.access_token).unwrap();
        assert_eq!(claims.user_id(), signed_up.user_id);
        assert_eq!(claims.role, Role::Instructor);
        assert!(out.user.last_login_at.is_some());
        assert_eq!(fx.repo.active_tokens(&signed_up.user_id), 1);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_the_same() {
        let fx = Fixture::new();
        fx.sign_up("ada@example.com", None).await.unwrap();

        let unknown = fx.sign_in("bob@example.com", PASSWORD).await.unwrap_err();
        let wrong = fx.sign_in("ada@example.com", "Wrong-Horse-42").await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_lockout_after_five_failures() {
        let fx = Fixture::new();
        let out = fx.sign_up("ada@example.com", None).await.unwrap();

        for _ in 0..5 {
            let err = fx.sign_in("ada@example.com", "Wrong-Horse-42").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }

        // Even the right password is refused while locked
        let err = fx.sign_in("ada@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
        assert_eq!(err.status_code(), 423);

        fx.clock.advance(Duration::minutes(15));
        fx.sign_in("ada@example.com", PASSWORD).await.unwrap();
        assert_eq!(fx.repo.credentials_of(&out.user_id).login_failed_count, 0);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_detects_reuse() {
        let fx = Fixture::new();
        let out = fx.sign_up("ada@example.com", None).await.unwrap();
        let first = fx.sign_in("ada@example.com", PASSWORD).await.unwrap();

        let second = fx.refresh(&first.tokens.refresh_token).await.unwrap();
        assert_ne!(second.tokens.refresh_token, first.tokens.refresh_token);
        assert_eq!(fx.repo.active_tokens(&out.user_id), 1);

        // Replaying the rotated token burns the whole family
        let err = fx.refresh(&first.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenReused));
        assert_eq!(fx.repo.active_tokens(&out.user_id), 0);

        let err = fx.refresh(&second.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenReused));
    }

    #[tokio::test]
    async fn test_refresh_expired_and_unknown() {
        let fx = Fixture::new();
        fx.sign_up("ada@example.com", None).await.unwrap();
        let signed_in = fx.sign_in("ada@example.com", PASSWORD).await.unwrap();

        let err = fx.refresh("not-a-token").await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenInvalid));

        fx.clock.advance(Duration::days(31));
        let err = fx.refresh(&signed_in.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenInvalid));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_tolerates_missing_token() {
        let fx = Fixture::new();
        let out = fx.sign_up("ada@example.com", None).await.unwrap();
        let signed_in = fx.sign_in("ada@example.com", PASSWORD).await.unwrap();

        let use_case = SignOutUseCase::new(fx.repo.clone(), fx.clock());
        use_case.execute(None).await.unwrap();
        use_case.execute(Some("unknown")).await.unwrap();
        use_case
            .execute(Some(&signed_in.tokens.refresh_token))
            .await
            .unwrap();

        assert_eq!(fx.repo.active_tokens(&out.user_id), 0);
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let fx = Fixture::new();
        let out = fx.sign_up("ada@example.com", None).await.unwrap();
        fx.sign_in("ada@example.com", PASSWORD).await.unwrap();

        let outbox = MemoryEmailSender::new();
        let mailer = Arc::new(Mailer::Memory(outbox.clone()));
        let forgot = ForgotPasswordUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            mailer,
            fx.config.clone(),
            fx.clock(),
        );

        forgot.execute("nobody@example.com".to_string()).await.unwrap();
        assert!(outbox.sent().is_empty());

        forgot.execute("ada@example.com".to_string()).await.unwrap();
        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        let token = reset_token_from(&sent[0].body);

        let reset = ResetPasswordUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.config.clone(),
            fx.clock(),
        );
        reset
            .execute(&token, "Battery-Staple-77".to_string())
            .await
            .unwrap();

        assert_eq!(fx.repo.active_tokens(&out.user_id), 0);
        assert!(fx.sign_in("ada@example.com", PASSWORD).await.is_err());
        fx.sign_in("ada@example.com", "Battery-Staple-77").await.unwrap();

        let err = reset
            .execute(&token, "Another-Pass-99".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::ResetTokenInvalid));
    }

    #[tokio::test]
    async fn test_reset_token_expires() {
        let fx = Fixture::new();
        fx.sign_up("ada@example.com", None).await.unwrap();

        let outbox = MemoryEmailSender::new();
        ForgotPasswordUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            Arc::new(Mailer::Memory(outbox.clone())),
            fx.config.clone(),
            fx.clock(),
        )
        .execute("ada@example.com".to_string())
        .await
        .unwrap();
        let token = reset_token_from(&outbox.sent()[0].body);

        fx.clock.advance(Duration::hours(2));
        let err = ResetPasswordUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.repo.clone(),
            fx.config.clone(),
            fx.clock(),
        )
        .execute(&token, "Battery-Staple-77".to_string())
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    fn reset_token_from(body: &str) -> String {
        let start = body.find("token=").unwrap() + "token=".len();
        body[start..]
            .split_whitespace()
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let fx = Fixture::new();
        let out = fx.sign_up("ada@example.com", None).await.unwrap();
        fx.sign_in("ada@example.com", PASSWORD).await.unwrap();

        let use_case = ChangePasswordUseCase::new(
            fx.repo.clone(),
            fx.repo.clone(),
            fx.config.clone(),
            fx.clock(),
        );

        let err = use_case
            .execute(
                out.user_id,
                ChangePasswordInput {
                    current_password: "Wrong-Horse-42".to_string(),
                    new_password: "Battery-Staple-77".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CurrentPasswordMismatch));

        use_case
            .execute(
                out.user_id,
                ChangePasswordInput {
                    current_password: PASSWORD.to_string(),
                    new_password: "Battery-Staple-77".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(fx.repo.active_tokens(&out.user_id), 0);
    }

    #[tokio::test]
    async fn test_admin_suspends_user() {
        let fx = Fixture::new();
        let admin = fx.sign_up("admin@example.com", None).await.unwrap();
        fx.make_admin(admin.user_id).await;
        let student = fx.sign_up("ada@example.com", None).await.unwrap();
        let session = fx.sign_in("ada@example.com", PASSWORD).await.unwrap();

        let caller = CurrentUser::new(admin.user_id, Role::Admin);
        let manage = ManageUserUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.clock());

        let user = manage
            .change_status(caller, student.user_id, UserStatus::Suspended)
            .await
            .unwrap();
        assert_eq!(user.status, UserStatus::Suspended);
        assert_eq!(fx.repo.active_tokens(&student.user_id), 0);

        let err = fx.sign_in("ada@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountSuspended));
        let err = fx.refresh(&session.tokens.refresh_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshTokenReused));
    }

    #[tokio::test]
    async fn test_admin_cannot_modify_self() {
        let fx = Fixture::new();
        let admin = fx.sign_up("admin@example.com", None).await.unwrap();
        fx.make_admin(admin.user_id).await;

        let caller = CurrentUser::new(admin.user_id, Role::Admin);
        let manage = ManageUserUseCase::new(fx.repo.clone(), fx.repo.clone(), fx.clock());

        let err = manage
            .change_role(caller, admin.user_id, Role::Student)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CannotModifySelf));

        let student = CurrentUser::new(UserId::new(), Role::Student);
        let err = manage
            .change_role(student, admin.user_id, Role::Student)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_list_users_filters() {
        let fx = Fixture::new();
        let admin = fx.sign_up("admin@example.com", None).await.unwrap();
        fx.make_admin(admin.user_id).await;
        fx.sign_up("ada@example.com", Some("instructor")).await.unwrap();
        fx.sign_up("bob@example.com", None).await.unwrap();

        let caller = CurrentUser::new(admin.user_id, Role::Admin);
        let list = ListUsersUseCase::new(fx.repo.clone());

        let page = list
            .execute(
                caller,
                crate::domain::UserFilter {
                    role: Some(Role::Instructor),
                    ..Default::default()
                },
                kernel::page::PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].email.as_str(), "ada@example.com");

        let page = list
            .execute(
                caller,
                crate::domain::UserFilter {
                    search: Some("  BOB ".to_string()),
                    ..Default::default()
                },
                kernel::page::PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
}

mod router_tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use chrono::{Duration, Utc};
    use kernel::clock::FixedClock;
    use kernel::id::UserId;
    use kernel::role::Role;
    use platform::mail::{Mailer, MemoryEmailSender};
    use platform::storage::{MemoryObjectStore, ObjectStorage};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::memory::MemoryAuthRepository;
    use crate::application::AuthConfig;
    use crate::presentation::{
        AuthAppState, attach_access_token, auth_router_generic, profile_router_generic,
        users_router_generic,
    };

    struct TestApp {
        router: Router,
        storage: MemoryObjectStore,
        config: Arc<AuthConfig>,
    }

    fn app() -> TestApp {
        let storage = MemoryObjectStore::new();
        let config = Arc::new(AuthConfig::development());
        let state = AuthAppState {
            repo: Arc::new(MemoryAuthRepository::new()),
            config: config.clone(),
            clock: Arc::new(FixedClock::new(Utc::now())),
            mailer: Arc::new(Mailer::Memory(MemoryEmailSender::new())),
            storage: Arc::new(ObjectStorage::Memory(storage.clone())),
        };

        let router = Router::new()
            .nest("/api/auth", auth_router_generic(state.clone()))
            .nest("/api/profile", profile_router_generic(state.clone()))
            .nest("/api/users", users_router_generic(state))
            .layer(from_fn_with_state(config.clone(), attach_access_token));

        TestApp {
            router,
            storage,
            config,
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn refresh_cookie(response: &axum::response::Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn sign_up_and_in(app: &TestApp) -> (String, String, String) {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signup",
                json!({
                    "email": "ada@example.com",
                    "password": "Correct-Horse-42",
                    "fullName": "Ada Lovelace"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let user_id = body_json(response).await["userId"].as_str().unwrap().to_string();

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signin",
                json!({"email": "ada@example.com", "password": "Correct-Horse-42"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = refresh_cookie(&response);
        let body = body_json(response).await;
        assert_eq!(body["tokenType"], "Bearer");
        let access = body["accessToken"].as_str().unwrap().to_string();

        (user_id, access, cookie)
    }

    #[tokio::test]
    async fn test_sign_in_sets_http_only_cookie() {
        let app = app();
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signup",
                json!({
                    "email": "ada@example.com",
                    "password": "Correct-Horse-42",
                    "fullName": "Ada"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/signin",
                json!({"email": "ada@example.com", "password": "Correct-Horse-42"}),
            ))
            .await
            .unwrap();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with("refresh_token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/api/auth"));
    }

    #[tokio::test]
    async fn test_me_requires_bearer() {
        let app = app();
        let (user_id, access, _) = sign_up_and_in(&app).await;

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer garbage")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["userId"], user_id);
        assert_eq!(body["role"], "student");
    }

    #[tokio::test]
    async fn test_refresh_via_cookie_and_reuse_clears_cookie() {
        let app = app();
        let (_, _, cookie) = sign_up_and_in(&app).await;

        let refresh = |cookie: String| {
            Request::post("/api/auth/refresh")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap()
        };

        let response = app.router.clone().oneshot(refresh(cookie.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rotated = refresh_cookie(&response);
        assert_ne!(rotated, cookie);

        let response = app.router.clone().oneshot(refresh(cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        let body = body_json(response).await;
        assert_eq!(body["status"], 401);

        let response = app
            .router
            .clone()
            .oneshot(Request::post("/api/auth/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_ignores_stale_bearer() {
        let app = app();
        let (user_id, _, cookie) = sign_up_and_in(&app).await;
        let user_id = UserId::from_uuid(user_id.parse().unwrap());
        let stale = app
            .config
            .jwt_keys
            .issue(
                user_id,
                Role::Student,
                Utc::now() - Duration::hours(2),
                Duration::minutes(15),
            )
            .unwrap()
            .token;
        let stale_bearer = format!("Bearer {stale}");

        let response = app
            .router
            .clone()
            .oneshot(
                Request::post("/api/auth/refresh")
                    .header(header::COOKIE, cookie)
                    .header(header::AUTHORIZATION, stale_bearer.clone())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["accessToken"].is_string());

        // Protected routes still refuse the expired token
        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, stale_bearer)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_sign_out_is_no_content() {
        let app = app();
        let response = app
            .router
            .clone()
            .oneshot(Request::post("/api/auth/signout").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(
            response.headers()[header::SET_COOKIE]
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );
    }

    #[tokio::test]
    async fn test_forgot_password_always_accepted() {
        let app = app();
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/password/forgot",
                json!({"email": "nobody@example.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_profile_update_and_avatar() {
        let app = app();
        let (user_id, access, _) = sign_up_and_in(&app).await;
        let bearer = format!("Bearer {access}");

        let mut request = json_request(
            "PUT",
            "/api/profile",
            json!({"headline": "Analyst", "websiteUrl": "https://ada.dev"}),
        );
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, bearer.parse().unwrap());
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["headline"], "Analyst");
        assert_eq!(body["email"], "ada@example.com");

        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0u8; 32]);
        let upload = |bytes: Vec<u8>| {
            Request::put("/api/profile/avatar")
                .header(header::AUTHORIZATION, bearer.clone())
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(bytes))
                .unwrap()
        };

        let response = app.router.clone().oneshot(upload(png.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let first_key = body_json(response).await["avatarKey"].as_str().unwrap().to_string();
        assert!(first_key.starts_with("avatars/"));
        assert!(app.storage.contains(&first_key));

        let response = app.router.clone().oneshot(upload(png)).await.unwrap();
        let second_key = body_json(response).await["avatarKey"].as_str().unwrap().to_string();
        assert!(!app.storage.contains(&first_key));
        assert!(app.storage.contains(&second_key));

        let response = app
            .router
            .clone()
            .oneshot(upload(b"not an image".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/api/users/{user_id}/profile"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body.get("email").is_none());
        assert_eq!(body["avatarUrl"], format!("/api/media/{second_key}"));
    }

    #[tokio::test]
    async fn test_profile_requires_auth_and_unknown_user_is_404() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/api/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get(format!("/api/users/{}/profile", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
