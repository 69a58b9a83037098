use crate::model::id::{BookingId, ItemId, UserId};
use chrono::{DateTime, Utc};
use shared::error::{AppError, AppResult};
use strum::{AsRefStr, Display, EnumString};

pub mod event;

/// 予約のステータス
///
/// `Waiting` からの遷移は一方向で、`Approved` / `Rejected` は終端状態。
/// `Canceled` は予約者によるキャンセル用に確保している値で、
/// 現在このステータスへ遷移させる操作は存在しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Waiting,
    Approved,
    Rejected,
    Canceled,
}

impl BookingStatus {
    /// 所有者による承認・却下の結果として次のステータスを決める
    pub fn decide(self, approved: bool) -> AppResult<BookingStatus> {
        if self.is_terminal() {
            return Err(AppError::InvalidBookingState(format!(
                "Can't approve/reject booking in {self} status, only WAITING bookings can be decided"
            )));
        }
        Ok(if approved {
            BookingStatus::Approved
        } else {
            BookingStatus::Rejected
        })
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Waiting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub booking_id: BookingId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: BookingStatus,
    pub booker_id: UserId,
    pub item: BookedItem,
}

// 予約読み出し時点のアイテム情報のスナップショット
// アイテム自体の更新はアイテム側のリポジトリを通じて行う
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedItem {
    pub item_id: ItemId,
    pub name: String,
    pub description: String,
    pub available: bool,
    pub owner_id: UserId,
}

impl Booking {
    pub fn is_booked_by(&self, user_id: UserId) -> bool {
        self.booker_id == user_id
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.item.owner_id == user_id
    }

    // 予約の閲覧は予約者と所有者にのみ許可する
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        self.is_booked_by(user_id) || self.is_owned_by(user_id)
    }
}

/// 予約一覧取得時に指定できる state パラメータ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStateFilter {
    #[default]
    All,
    Current,
    Past,
    Future,
    Waiting,
    Rejected,
}

impl BookingStateFilter {
    /// 大文字の固定リテラルのみ受け付ける。それ以外は `InvalidState`
    pub fn parse(raw: &str) -> AppResult<Self> {
        raw.parse()
            .map_err(|_| AppError::InvalidState(raw.to_string()))
    }

    /// 現在時刻を固定してリポジトリに渡す条件へ変換する
    pub fn resolve(self, now: DateTime<Utc>) -> BookingFilter {
        match self {
            BookingStateFilter::All => BookingFilter::All,
            BookingStateFilter::Current => BookingFilter::Current(now),
            BookingStateFilter::Past => BookingFilter::Past(now),
            BookingStateFilter::Future => BookingFilter::Future(now),
            BookingStateFilter::Waiting => BookingFilter::Status(BookingStatus::Waiting),
            BookingStateFilter::Rejected => BookingFilter::Status(BookingStatus::Rejected),
        }
    }
}

/// リポジトリが解釈する予約の絞り込み条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    All,
    // start < now < end
    Current(DateTime<Utc>),
    // end < now
    Past(DateTime<Utc>),
    // start > now
    Future(DateTime<Utc>),
    Status(BookingStatus),
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        match *self {
            BookingFilter::All => true,
            BookingFilter::Current(now) => booking.start < now && booking.end > now,
            BookingFilter::Past(now) => booking.end < now,
            BookingFilter::Future(now) => booking.start > now,
            BookingFilter::Status(status) => booking.status == status,
        }
    }
}
