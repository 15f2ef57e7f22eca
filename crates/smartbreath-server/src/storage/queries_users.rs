//! User and refresh-token queries for the SmartBreath server.

use smartbreath_core::db::unix_timestamp;

use super::db::Database;
use super::models::{Token, User};
use smartbreath_core::db::DatabaseError;

/// Parameters for creating a user.
pub struct CreateUserParams<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: &'a str,
    pub weight: f64,
    pub height: f64,
    pub gender: &'a str,
}

/// Parameters for a partial profile update. `None` keeps the stored value.
#[derive(Default)]
pub struct UpdateUserParams<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub date_of_birth: Option<&'a str>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub gender: Option<&'a str>,
}

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user. Username/email collisions surface as `Conflict`
    /// via the unique constraints.
    pub async fn create_user(&self, params: &CreateUserParams<'_>) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, first_name, last_name, date_of_birth, weight, height, gender, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.username)
        .bind(params.email)
        .bind(params.password_hash)
        .bind(params.first_name)
        .bind(params.last_name)
        .bind(params.date_of_birth)
        .bind(params.weight)
        .bind(params.height)
        .bind(params.gender)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(params.id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Get a user by username.
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with username {username}")))
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with email {email}")))
    }

    /// Find a user holding either of the given username/email, for friendly
    /// duplicate messages before the constraints catch races.
    pub async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? OR email = ?")
                .bind(username)
                .bind(email)
                .fetch_optional(self.pool())
                .await?;

        Ok(user)
    }

    /// Partially update a profile; absent fields keep their stored value.
    pub async fn update_user(
        &self,
        id: &str,
        params: &UpdateUserParams<'_>,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE users SET \
                username = COALESCE(?, username), \
                email = COALESCE(?, email), \
                first_name = COALESCE(?, first_name), \
                last_name = COALESCE(?, last_name), \
                date_of_birth = COALESCE(?, date_of_birth), \
                weight = COALESCE(?, weight), \
                height = COALESCE(?, height), \
                gender = COALESCE(?, gender), \
                updated_at = ? \
             WHERE id = ?",
        )
        .bind(params.username)
        .bind(params.email)
        .bind(params.first_name)
        .bind(params.last_name)
        .bind(params.date_of_birth)
        .bind(params.weight)
        .bind(params.height)
        .bind(params.gender)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {id}")));
        }

        self.get_user(id).await
    }

    /// Delete a user. Their machines are orphaned (owner cleared by the FK),
    /// their refresh tokens cascade away.
    pub async fn delete_user(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Token queries
    // =========================================================================

    /// Store a refresh token.
    pub async fn create_token(
        &self,
        id: &str,
        user_id: &str,
        token_hash: &str,
        expires_at: i64,
    ) -> Result<Token, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO tokens (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_token(id).await
    }

    /// Get a token by ID.
    pub async fn get_token(&self, id: &str) -> Result<Token, DatabaseError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Token {id}")))
    }

    /// Find a valid (non-revoked, non-expired) token by hash.
    pub async fn get_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<Token>, DatabaseError> {
        let now = unix_timestamp();

        let token = sqlx::query_as::<_, Token>(
            "SELECT * FROM tokens WHERE token_hash = ? AND revoked = 0 AND expires_at > ?",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(self.pool())
        .await?;

        Ok(token)
    }

    /// Revoke a token by ID.
    pub async fn revoke_token(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE tokens SET revoked = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke all tokens for a user.
    pub async fn revoke_user_tokens(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE tokens SET revoked = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
