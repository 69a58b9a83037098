use crate::model::{
    comment::{event::CreateComment, Comment},
    id::ItemId,
};
use async_trait::async_trait;
use shared::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, event: CreateComment) -> AppResult<Comment>;
    // 作成日時の古い順で返す
    async fn find_by_item_id(&self, item_id: ItemId) -> AppResult<Vec<Comment>>;
}
