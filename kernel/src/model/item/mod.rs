use crate::model::{
    booking::Booking,
    comment::Comment,
    id::{ItemId, RequestId, UserId},
};
pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub item_id: ItemId,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub owner_id: UserId,
    // 依頼に応えて登録された場合の依頼 ID
    pub request_id: Option<RequestId>,
}

// アイテム詳細表示用の型
// last_booking / next_booking は所有者が閲覧する場合にのみ値が入る
#[derive(Debug)]
pub struct ItemDetail {
    pub item: Item,
    pub last_booking: Option<Booking>,
    pub next_booking: Option<Booking>,
    pub comments: Vec<Comment>,
}
