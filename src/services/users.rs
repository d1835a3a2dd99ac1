//! User management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User, UserQuery},
    repository::Repository,
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List users with search and pagination
    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.list(query).await
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a user
    pub async fn create(&self, user: CreateUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self.repository.users.login_exists(&user.login, None).await? {
            return Err(AppError::Conflict(format!(
                "Login '{}' already exists",
                user.login
            )));
        }

        let password_hash = hash_password(&user.password)?;
        self.repository
            .users
            .create(
                &user.login,
                &password_hash,
                &user.full_name,
                user.email.as_deref(),
                user.role.unwrap_or(Role::User),
            )
            .await
    }

    /// Update a user
    pub async fn update(&self, id: i64, user: UpdateUser) -> AppResult<User> {
        user.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if let Some(ref login) = user.login {
            if self.repository.users.login_exists(login, Some(id)).await? {
                return Err(AppError::Conflict(format!(
                    "Login '{}' already exists",
                    login
                )));
            }
        }

        let password_hash = match user.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository
            .users
            .update(
                id,
                user.login.as_deref(),
                password_hash.as_deref(),
                user.full_name.as_deref(),
                user.email.as_deref(),
                user.role,
            )
            .await
    }

    /// Delete a user
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await
    }
}
