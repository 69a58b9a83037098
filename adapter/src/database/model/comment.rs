use kernel::model::{
    comment::Comment,
    id::{CommentId, ItemId, UserId},
};
use sqlx::types::chrono::{DateTime, Utc};

// users テーブルと結合して投稿者名も一緒に取得する
#[derive(sqlx::FromRow)]
pub struct CommentRow {
    pub comment_id: CommentId,
    pub text: String,
    pub item_id: ItemId,
    pub author_id: UserId,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(value: CommentRow) -> Self {
        let CommentRow {
            comment_id,
            text,
            item_id,
            author_id,
            author_name,
            created_at,
        } = value;
        Comment {
            comment_id,
            text,
            item_id,
            author_id,
            author_name,
            created_at,
        }
    }
}
