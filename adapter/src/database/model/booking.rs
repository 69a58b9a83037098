use kernel::model::{
    booking::{BookedItem, Booking, BookingStatus},
    id::{BookingId, ItemId, UserId},
};
use sqlx::types::chrono::{DateTime, Utc};

// 予約一覧を取得する際に使う型
// items テーブルと INNER JOIN し、アイテムの情報も一緒に抽出する
#[derive(sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: BookingId,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub booker_id: UserId,
    pub item_id: ItemId,
    pub item_name: String,
    pub item_description: String,
    pub item_available: bool,
    pub owner_id: UserId,
}

impl From<BookingRow> for Booking {
    fn from(value: BookingRow) -> Self {
        let BookingRow {
            booking_id,
            start_at,
            end_at,
            status,
            booker_id,
            item_id,
            item_name,
            item_description,
            item_available,
            owner_id,
        } = value;
        Booking {
            booking_id,
            start: start_at,
            end: end_at,
            status,
            booker_id,
            item: BookedItem {
                item_id,
                name: item_name,
                description: item_description,
                available: item_available,
                owner_id,
            },
        }
    }
}
