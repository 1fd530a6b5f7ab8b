use async_trait::async_trait;

use super::repo_types::{NewUser, User};
use crate::db::PgStore;
use crate::store::StoreError;

const USER_COLUMNS: &str =
    "id, email, username, first_name, last_name, password_hash, created_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Page of users ordered by id, plus the total count.
    async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), StoreError>;
    async fn set_password_hash(&self, user_id: i64, hash: &str) -> Result<(), StoreError>;

    async fn subscription_exists(&self, subscriber: i64, author: i64) -> Result<bool, StoreError>;
    async fn insert_subscription(&self, subscriber: i64, author: i64) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    async fn delete_subscription(&self, subscriber: i64, author: i64) -> Result<bool, StoreError>;
    /// Authors the subscriber follows, ordered by id, plus the total count.
    async fn list_subscribed_authors(
        &self,
        subscriber: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, username, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), StoreError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok((rows, total))
    }

    async fn set_password_hash(&self, user_id: i64, hash: &str) -> Result<(), StoreError> {
        let done = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn subscription_exists(&self, subscriber: i64, author: i64) -> Result<bool, StoreError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(subscriber)
        .bind(author)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_subscription(&self, subscriber: i64, author: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
            .bind(subscriber)
            .bind(author)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_subscription(&self, subscriber: i64, author: i64) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(subscriber)
            .bind(author)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_subscribed_authors(
        &self,
        subscriber: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), StoreError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.username, u.first_name, u.last_name,
                   u.password_hash, u.created_at
              FROM users u
              JOIN subscriptions s ON s.author_id = u.id
             WHERE s.user_id = $1
             ORDER BY u.id
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(subscriber)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
                .bind(subscriber)
                .fetch_one(&self.pool)
                .await?;
        Ok((rows, total))
    }
}
