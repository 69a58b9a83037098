use crate::model::{
    id::{RequestId, UserId},
    item::Item,
};
use chrono::{DateTime, Utc};
pub mod event;

/// 利用者が「こういうアイテムを借りたい」と登録する依頼
///
/// 依頼に応えて登録されたアイテムは `Item::request_id` でこの依頼を参照する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRequest {
    pub request_id: RequestId,
    pub description: String,
    pub requester_id: UserId,
    pub created_at: DateTime<Utc>,
}

// 依頼とそれに応えて登録されたアイテムの組
#[derive(Debug)]
pub struct ItemRequestDetail {
    pub request: ItemRequest,
    pub items: Vec<Item>,
}
