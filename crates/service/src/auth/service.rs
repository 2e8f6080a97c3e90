use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher, PasswordVerifier, SaltString},
    Argon2, PasswordHash,
};
use jsonwebtoken::{encode, EncodingKey, Header as JwtHeader};
use rand::rngs::OsRng;
use tracing::{debug, info, instrument};

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Symbols the password policy accepts as "special".
const PASSWORD_SYMBOLS: &str = "!@#$%&*()_+=|<>?{}[]~-";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

/// Policy: length >= 8 with at least one letter, one digit and one symbol
/// from [`PASSWORD_SYMBOLS`].
pub fn password_meets_policy(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self {
        Self { repo, cfg }
    }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig { jwt_secret: None, token_ttl_hours: 12 });
    /// let input = RegisterInput { email: "user@example.com".into(), name: "Test".into(), password: "Passw0rd!".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        models::user::validate_email(&input.email)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        models::user::validate_name(&input.name)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if !password_meets_policy(&input.password) {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters long, must contain at least one special character, one letter and one number!".into(),
            ));
        }
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let user = self.repo.create_user(&input.email, &input.name, &hash).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and optionally issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig { jwt_secret: Some("secret".into()), token_ttl_hours: 12 });
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { email: "u@e.com".into(), name: "N".into(), password: "Passw0rd!".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd!".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self
            .repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let hash = self
            .repo
            .get_password_hash(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default()
            .verify_password(input.password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::Unauthorized);
        }

        let mut token = None;
        if let Some(secret) = &self.cfg.jwt_secret {
            #[derive(serde::Serialize)]
            struct Claims {
                sub: String,
                uid: String,
                exp: usize,
            }
            let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours))
                .timestamp() as usize;
            let claims = Claims {
                sub: user.email.clone(),
                uid: user.id.to_string(),
                exp,
            };
            token = Some(
                encode(
                    &JwtHeader::default(),
                    &claims,
                    &EncodingKey::from_secret(secret.as_bytes()),
                )
                .map_err(|e| AuthError::TokenError(e.to_string()))?,
            );
        }

        Ok(AuthSession { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(
            Arc::new(MockAuthRepository::default()),
            AuthConfig { jwt_secret: Some("test-secret".into()), token_ttl_hours: 12 },
        )
    }

    fn register_input(email: &str, password: &str) -> RegisterInput {
        RegisterInput { email: email.into(), name: "Tester".into(), password: password.into() }
    }

    #[test]
    fn password_policy_accepts_and_rejects() {
        assert!(password_meets_policy("Passw0rd!"));
        assert!(password_meets_policy("abc123{}x"));
        // too short
        assert!(!password_meets_policy("P0d!"));
        // no digit
        assert!(!password_meets_policy("Password!"));
        // no letter
        assert!(!password_meets_policy("12345678!"));
        // no symbol
        assert!(!password_meets_policy("Passw0rd"));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let svc = svc();
        svc.register(register_input("a@x.com", "Passw0rd!")).await.unwrap();
        let err = svc.register(register_input("a@x.com", "Passw0rd!")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn register_rejects_bad_email_and_weak_password() {
        let svc = svc();
        assert!(matches!(
            svc.register(register_input("not-an-email", "Passw0rd!")).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            svc.register(register_input("b@x.com", "weak")).await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_verifies_hash_and_issues_token() {
        let svc = svc();
        svc.register(register_input("c@x.com", "Passw0rd!")).await.unwrap();

        let session = svc
            .login(LoginInput { email: "c@x.com".into(), password: "Passw0rd!".into() })
            .await
            .unwrap();
        assert!(session.token.is_some());

        let err = svc
            .login(LoginInput { email: "c@x.com".into(), password: "wrong-pass1!".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));

        let err = svc
            .login(LoginInput { email: "ghost@x.com".into(), password: "Passw0rd!".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }
}
