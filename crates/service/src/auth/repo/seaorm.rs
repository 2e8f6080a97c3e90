use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::auth::domain::AuthUser;
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|u| AuthUser { id: u.id, email: u.email, name: u.name }))
    }

    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<AuthUser, AuthError> {
        let created = models::user::create(&self.db, email, name, password_hash)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(AuthUser { id: created.id, email: created.email, name: created.name })
    }

    async fn get_password_hash(&self, user_id: Uuid) -> Result<Option<String>, AuthError> {
        let res = models::user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|u| u.password_hash))
    }
}
