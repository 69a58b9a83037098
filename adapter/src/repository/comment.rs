use crate::database::{model::comment::CommentRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    comment::{event::CreateComment, Comment},
    id::ItemId,
};
use kernel::repository::comment::CommentRepository;
use shared::error::{AppError, AppResult};

#[derive(new)]
pub struct CommentRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl CommentRepository for CommentRepositoryImpl {
    async fn create(&self, event: CreateComment) -> AppResult<Comment> {
        // 登録と同時に投稿者名を users から引いて返す
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
                WITH inserted AS (
                    INSERT INTO comments (text, item_id, author_id, created_at)
                    VALUES ($1, $2, $3, $4)
                    RETURNING comment_id, text, item_id, author_id, created_at
                )
                SELECT
                    c.comment_id,
                    c.text,
                    c.item_id,
                    c.author_id,
                    u.user_name AS author_name,
                    c.created_at
                FROM inserted AS c
                INNER JOIN users AS u ON c.author_id = u.user_id
            "#,
        )
        .bind(&event.text)
        .bind(event.item_id)
        .bind(event.author_id)
        .bind(event.created_at)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(Comment::from(row))
    }

    async fn find_by_item_id(&self, item_id: ItemId) -> AppResult<Vec<Comment>> {
        sqlx::query_as::<_, CommentRow>(
            r#"
                SELECT
                    c.comment_id,
                    c.text,
                    c.item_id,
                    c.author_id,
                    u.user_name AS author_name,
                    c.created_at
                FROM comments AS c
                INNER JOIN users AS u ON c.author_id = u.user_id
                WHERE c.item_id = $1
                ORDER BY c.created_at ASC, c.comment_id ASC
            "#,
        )
        .bind(item_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map(|rows| rows.into_iter().map(Comment::from).collect())
        .map_err(AppError::SpecificOperationError)
    }
}
