use crate::database::{model::user::UserRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::UserId,
    user::{
        event::{CreateUser, UpdateUser},
        User,
    },
};
use kernel::repository::user::UserRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct UserRepositoryImpl {
    db: ConnectionPool,
}

// email の一意制約違反だけは DuplicateEmail として呼び出し元へ返す
fn map_write_error(email: Option<&str>) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateEmail(
            format!("User with email {} already exists", email.unwrap_or_default()),
        ),
        e => AppError::SpecificOperationError(e),
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, event: CreateUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                INSERT INTO users (user_name, email)
                VALUES ($1, $2)
                RETURNING user_id, user_name, email
            "#,
        )
        .bind(&event.user_name)
        .bind(&event.email)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(map_write_error(Some(event.email.as_str())))?;

        Ok(User::from(row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, user_name, email
                FROM users
                WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map(|row| row.map(User::from))
        .map_err(AppError::SpecificOperationError)
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, user_name, email
                FROM users
                ORDER BY user_id ASC
            "#,
        )
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(User::from).collect())
        .map_err(AppError::SpecificOperationError)
    }

    async fn update(&self, event: UpdateUser) -> AppResult<User> {
        // None の項目は現在の値を維持する
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                UPDATE users
                SET
                    user_name = COALESCE($1, user_name),
                    email = COALESCE($2, email)
                WHERE user_id = $3
                RETURNING user_id, user_name, email
            "#,
        )
        .bind(&event.user_name)
        .bind(&event.email)
        .bind(event.user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(map_write_error(event.email.as_deref()))?;

        row.map(User::from).ok_or_else(|| {
            AppError::EntityNotFound(format!("User with id {} not found", event.user_id))
        })
    }

    async fn delete(&self, user_id: UserId) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::EntityNotFound(format!(
                "User with id {user_id} not found"
            )));
        }

        Ok(())
    }
}
