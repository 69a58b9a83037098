use crate::model::{
    booking::{
        event::{CreateBooking, UpdateBookingStatus},
        Booking, BookingFilter, BookingStatus,
    },
    id::{BookingId, ItemId, UserId},
    list::ListOptions,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

/// 予約レコードの永続化を担うリポジトリ
///
/// 一覧系のメソッドはすべて `start` の降順（同時刻の場合は ID の降順）で返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, event: CreateBooking) -> AppResult<Booking>;
    // 現在のステータスが event.expected の場合にのみ更新する。
    // 一致しない場合は InvalidBookingState を返す
    async fn update_status(&self, event: UpdateBookingStatus) -> AppResult<Booking>;
    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>>;
    // 予約者 ID に紐づく予約を 1 ページ分取得する
    async fn find_page_by_booker(
        &self,
        booker_id: UserId,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>>;
    // 所有者 ID（予約対象アイテムの所有者）に紐づく予約を 1 ページ分取得する
    async fn find_page_by_owner(
        &self,
        owner_id: UserId,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>>;
    // 予約者とアイテムの組で、指定ステータスかつ before より前に終了した最新の予約
    async fn find_latest_finished(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        status: BookingStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;
    // アイテムに対して、指定ステータスで before より前に開始した最新の予約
    async fn find_last_started(
        &self,
        item_id: ItemId,
        status: BookingStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;
    // アイテムに対して、指定ステータスで after より後に開始する最も早い予約
    async fn find_next_starting(
        &self,
        item_id: ItemId,
        status: BookingStatus,
        after: DateTime<Utc>,
    ) -> AppResult<Option<Booking>>;
}
