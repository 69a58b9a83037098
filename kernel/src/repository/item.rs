use crate::model::{
    id::{ItemId, RequestId, UserId},
    item::{
        event::{CreateItem, UpdateItem},
        Item,
    },
};
use async_trait::async_trait;
use shared::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, event: CreateItem) -> AppResult<Item>;
    async fn find_by_id(&self, item_id: ItemId) -> AppResult<Option<Item>>;
    // 所有者のアイテムを ID 昇順で取得する
    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<Item>>;
    // 名前・説明文に keyword を含む貸出可能なアイテムを検索する（大文字小文字は区別しない）
    async fn search(&self, keyword: String) -> AppResult<Vec<Item>>;
    async fn update(&self, event: UpdateItem) -> AppResult<Item>;
    // 指定した依頼のいずれかに応えて登録されたアイテムを ID 昇順で取得する
    async fn find_by_request_ids(&self, request_ids: Vec<RequestId>) -> AppResult<Vec<Item>>;
}
