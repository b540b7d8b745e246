use chrono::Utc;

use crate::{
    db::DbPool,
    error::{AppError, Result},
    models::user::User,
    services::auth_service::hash_password,
};

/// Store for operator accounts.
#[derive(Clone)]
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a list of all users
    pub async fn list(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Create a user with a hashed password and return the new id.
    pub async fn create(&self, username: &str, password: &str) -> Result<i64> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "username and password cannot be blank".into(),
            ));
        }

        if self.get_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("username already exists".into()));
        }

        let password_hash = hash_password(password)?;
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, status, created_at) VALUES (?, ?, 'active', ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Rename a user and/or reset their password. Omitted fields keep
    /// their value; a new username must not collide with another user.
    pub async fn update(
        &self,
        id: i64,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<()> {
        let existing = self.get(id).await?;

        let username = match username {
            Some(u) if !u.is_empty() => u,
            _ => existing.username.clone(),
        };
        if username != existing.username {
            let duplicate: Option<(i64,)> =
                sqlx::query_as("SELECT id FROM users WHERE username = ? AND id != ?")
                    .bind(&username)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            if duplicate.is_some() {
                return Err(AppError::Conflict("username already in use".into()));
            }
        }

        match password.filter(|p| !p.is_empty()) {
            Some(password) => {
                let password_hash = hash_password(&password)?;
                sqlx::query("UPDATE users SET username = ?, password_hash = ? WHERE id = ?")
                    .bind(username)
                    .bind(password_hash)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            }
            None => {
                sqlx::query("UPDATE users SET username = ? WHERE id = ?")
                    .bind(username)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }

    /// Delete a user by ID
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.get(id).await?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Enable or disable an account.
    pub async fn set_status(&self, id: i64, status: &str) -> Result<()> {
        if status != "active" && status != "disabled" {
            return Err(AppError::Validation("invalid status value".into()));
        }

        self.get(id).await?;

        sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Replace a user's password hash.
    pub async fn set_password(&self, id: i64, new_password: &str) -> Result<()> {
        let password_hash = hash_password(new_password)?;

        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
