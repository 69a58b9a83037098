use crate::model::{
    id::{RequestId, UserId},
    list::ListOptions,
    request::{event::CreateItemRequest, ItemRequest},
};
use async_trait::async_trait;
use shared::error::AppResult;

/// アイテム依頼の永続化を担うリポジトリ
///
/// 一覧系のメソッドは作成日時の降順（同時刻の場合は ID の降順）で返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRequestRepository: Send + Sync {
    async fn create(&self, event: CreateItemRequest) -> AppResult<ItemRequest>;
    async fn find_by_id(&self, request_id: RequestId) -> AppResult<Option<ItemRequest>>;
    async fn find_by_requester(&self, requester_id: UserId) -> AppResult<Vec<ItemRequest>>;
    // requester_id 以外の利用者による依頼を 1 ページ分取得する
    async fn find_page_of_others(
        &self,
        requester_id: UserId,
        options: ListOptions,
    ) -> AppResult<Vec<ItemRequest>>;
}
