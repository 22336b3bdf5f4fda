//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};

use crate::domain::{normalize_key, DomainError, NewUser, User, UserRepository};
use crate::models::user::{self, ActiveModel, Entity as UserEntity};

/// SeaORM-based implementation of UserRepository
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: &str) -> Result<user::Model, DomainError> {
        UserEntity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

fn map_insert_error(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            DomainError::Conflict("Email is already taken".to_string())
        }
        _ => DomainError::from(e),
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find_by_id(id.to_owned()).one(&self.db).await?;
        Ok(user.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let user = UserEntity::find()
            .filter(user::Column::NormalizedEmail.eq(normalize_key(email)))
            .one(&self.db)
            .await?;
        Ok(user.map(User::from))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DomainError> {
        let now = chrono::Utc::now().to_rfc3339();

        let user = ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            normalized_user_name: Set(normalize_key(&new_user.user_name)),
            user_name: Set(new_user.user_name),
            normalized_email: Set(normalize_key(&new_user.email)),
            email: Set(new_user.email),
            email_confirmed: Set(false),
            password_hash: Set(new_user.password_hash),
            security_stamp: Set(new_user.security_stamp),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let result = user.insert(&self.db).await.map_err(map_insert_error)?;
        Ok(result.into())
    }

    async fn set_email_confirmed(&self, id: &str) -> Result<User, DomainError> {
        let mut user: ActiveModel = self.load(id).await?.into();
        user.email_confirmed = Set(true);
        user.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = user.update(&self.db).await?;
        Ok(result.into())
    }

    async fn update_password(
        &self,
        id: &str,
        password_hash: String,
        security_stamp: String,
    ) -> Result<User, DomainError> {
        let mut user: ActiveModel = self.load(id).await?.into();
        user.password_hash = Set(password_hash);
        user.security_stamp = Set(security_stamp);
        user.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let result = user.update(&self.db).await?;
        Ok(result.into())
    }
}
