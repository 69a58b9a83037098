use crate::model::{
    booking::BookingStatus,
    id::{BookingId, ItemId, UserId},
};
use chrono::{DateTime, Utc};
use derive_new::new;

// 予約申請として受け取る内容
#[derive(Debug, Clone, new)]
pub struct NewBooking {
    pub item_id: ItemId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// リポジトリへの予約レコード作成依頼
#[derive(Debug, Clone, new)]
pub struct CreateBooking {
    pub item_id: ItemId,
    pub booker_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
}

// ステータス更新は expected と一致する場合にのみ適用される
#[derive(Debug, Clone, new)]
pub struct UpdateBookingStatus {
    pub booking_id: BookingId,
    pub expected: BookingStatus,
    pub status: BookingStatus,
}
