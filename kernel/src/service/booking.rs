use crate::{
    model::{
        booking::{
            event::{CreateBooking, NewBooking, UpdateBookingStatus},
            Booking, BookingStateFilter, BookingStatus,
        },
        id::{BookingId, ItemId, UserId},
        list::ListOptions,
        item::Item,
        user::User,
    },
    repository::{booking::BookingRepository, item::ItemRepository, user::UserRepository},
};
use chrono::{DateTime, Utc};
use derive_new::new;
use shared::error::{AppError, AppResult};
use std::sync::Arc;

/// 予約のライフサイクルを扱うサービス
///
/// 状態は一切保持せず、各操作のたびにリポジトリから最新の状態を読み直す。
/// 検証に失敗した場合は書き込みを行わずに即座にエラーを返す。
#[derive(Clone, new)]
pub struct BookingService {
    user_repository: Arc<dyn UserRepository>,
    item_repository: Arc<dyn ItemRepository>,
    booking_repository: Arc<dyn BookingRepository>,
}

impl BookingService {
    pub async fn add_booking(&self, user_id: UserId, request: NewBooking) -> AppResult<Booking> {
        let booker = self.require_user(user_id).await?;
        let item = self.require_item(request.item_id).await?;

        if item.owner_id == booker.user_id {
            return Err(AppError::InvalidRelation(format!(
                "User (id = {}) can't book item (id = {}) because they own it",
                booker.user_id, item.item_id
            )));
        }
        if !item.available {
            return Err(AppError::AccessDenied(format!(
                "Item (id = {}) is not available",
                item.item_id
            )));
        }
        if request.start >= request.end {
            return Err(AppError::InvalidDate(format!(
                "Invalid date: start {} must be before end {}",
                request.start, request.end
            )));
        }

        let booking = self
            .booking_repository
            .create(CreateBooking::new(
                item.item_id,
                booker.user_id,
                request.start,
                request.end,
                BookingStatus::Waiting,
            ))
            .await?;

        tracing::info!(
            booking_id = %booking.booking_id,
            item_id = %item.item_id,
            booker_id = %booker.user_id,
            "booking created"
        );
        Ok(booking)
    }

    // 所有者による承認・却下
    pub async fn update(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        approved: bool,
    ) -> AppResult<Booking> {
        self.require_user(user_id).await?;
        let booking = self.require_booking(booking_id).await?;

        if !booking.is_owned_by(user_id) {
            return Err(AppError::InvalidRelation(format!(
                "User (id = {}) can't approve item (id = {}) because they are not its owner",
                user_id, booking.item.item_id
            )));
        }
        let next = booking.status.decide(approved)?;

        let updated = self
            .booking_repository
            .update_status(UpdateBookingStatus::new(booking_id, booking.status, next))
            .await?;

        tracing::info!(
            booking_id = %booking_id,
            owner_id = %user_id,
            status = %updated.status,
            "booking decided"
        );
        Ok(updated)
    }

    pub async fn get_booking_by_id(
        &self,
        booking_id: BookingId,
        user_id: UserId,
    ) -> AppResult<Booking> {
        self.require_user(user_id).await?;
        let booking = self.require_booking(booking_id).await?;

        // 関係のないユーザーには予約の存在自体を知らせない
        if !booking.is_visible_to(user_id) {
            return Err(AppError::EntityNotFound(format!(
                "User (id = {user_id}) has no relation to booking (id = {booking_id})"
            )));
        }
        Ok(booking)
    }

    // 予約者視点の予約履歴
    pub async fn get_all_bookings_by_user(
        &self,
        user_id: UserId,
        state: BookingStateFilter,
        from: i64,
        size: i64,
    ) -> AppResult<Vec<Booking>> {
        self.require_user(user_id).await?;
        let options = ListOptions::from_offset(from, size)?;
        let filter = state.resolve(Utc::now());

        tracing::debug!(user_id = %user_id, state = %state, ?options, "listing bookings by booker");
        self.booking_repository
            .find_page_by_booker(user_id, filter, options)
            .await
    }

    // 所有者視点の予約履歴
    pub async fn get_all_bookings_all_items_by_owner(
        &self,
        owner_id: UserId,
        state: BookingStateFilter,
        from: i64,
        size: i64,
    ) -> AppResult<Vec<Booking>> {
        self.require_user(owner_id).await?;
        let options = ListOptions::from_offset(from, size)?;
        let filter = state.resolve(Utc::now());

        tracing::debug!(owner_id = %owner_id, state = %state, ?options, "listing bookings by owner");
        self.booking_repository
            .find_page_by_owner(owner_id, filter, options)
            .await
    }

    /// now より前に開始した承認済み予約のうち最新のもの
    pub async fn find_last_approved_booking(
        &self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        self.booking_repository
            .find_last_started(item_id, BookingStatus::Approved, now)
            .await
    }

    /// now より後に開始する承認済み予約のうち最も早いもの
    pub async fn find_next_approved_booking(
        &self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        self.booking_repository
            .find_next_starting(item_id, BookingStatus::Approved, now)
            .await
    }

    /// コメント投稿の可否判定に使う、終了済みの承認済み予約
    pub async fn find_latest_finished_approved_booking(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        self.booking_repository
            .find_latest_finished(booker_id, item_id, BookingStatus::Approved, now)
            .await
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("User with id {user_id} not found")))
    }

    async fn require_item(&self, item_id: ItemId) -> AppResult<Item> {
        self.item_repository
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("Item with id {item_id} not found")))
    }

    async fn require_booking(&self, booking_id: BookingId) -> AppResult<Booking> {
        self.booking_repository
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("Booking with id {booking_id} not found"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::booking::{BookedItem, BookingFilter},
        repository::{
            booking::MockBookingRepository, item::MockItemRepository, user::MockUserRepository,
        },
    };
    use chrono::Duration;

    const OWNER: i64 = 1;
    const BOOKER: i64 = 2;
    const STRANGER: i64 = 3;

    fn user(id: i64) -> User {
        User {
            user_id: UserId::new(id),
            user_name: format!("user{id}"),
            email: format!("user{id}@example.com"),
        }
    }

    fn item(available: bool) -> Item {
        Item {
            item_id: ItemId::new(10),
            name: "drill".into(),
            description: "cordless drill".into(),
            available,
            owner_id: UserId::new(OWNER),
            request_id: None,
        }
    }

    fn booking(status: BookingStatus) -> Booking {
        let now = Utc::now();
        Booking {
            booking_id: BookingId::new(100),
            start: now + Duration::days(1),
            end: now + Duration::days(2),
            status,
            booker_id: UserId::new(BOOKER),
            item: BookedItem {
                item_id: ItemId::new(10),
                name: "drill".into(),
                description: "cordless drill".into(),
                available: true,
                owner_id: UserId::new(OWNER),
            },
        }
    }

    fn users_exist() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|id| Ok(Some(user(id.raw()))));
        users
    }

    fn item_repository(available: bool) -> MockItemRepository {
        let mut items = MockItemRepository::new();
        items
            .expect_find_by_id()
            .returning(move |_| Ok(Some(item(available))));
        items
    }

    fn booking_service(
        users: MockUserRepository,
        items: MockItemRepository,
        bookings: MockBookingRepository,
    ) -> BookingService {
        BookingService::new(Arc::new(users), Arc::new(items), Arc::new(bookings))
    }

    fn tomorrow_request() -> NewBooking {
        let now = Utc::now();
        NewBooking::new(ItemId::new(10), now + Duration::days(1), now + Duration::days(2))
    }

    #[tokio::test]
    async fn add_booking_persists_waiting_booking() {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_create()
            .withf(|event| {
                event.status == BookingStatus::Waiting
                    && event.booker_id == UserId::new(BOOKER)
                    && event.start < event.end
            })
            .times(1)
            .returning(|event| {
                Ok(Booking {
                    start: event.start,
                    end: event.end,
                    ..booking(event.status)
                })
            });

        let service = booking_service(users_exist(), item_repository(true), bookings);
        let created = service
            .add_booking(UserId::new(BOOKER), tomorrow_request())
            .await
            .unwrap();
        assert_eq!(created.status, BookingStatus::Waiting);
        assert!(created.start < created.end);
    }

    #[tokio::test]
    async fn add_booking_by_owner_is_invalid_relation() {
        let mut bookings = MockBookingRepository::new();
        bookings.expect_create().times(0);

        let service = booking_service(users_exist(), item_repository(true), bookings);
        let res = service
            .add_booking(UserId::new(OWNER), tomorrow_request())
            .await;
        assert!(matches!(res, Err(AppError::InvalidRelation(_))));
    }

    #[tokio::test]
    async fn add_booking_on_unavailable_item_is_access_denied() {
        let mut bookings = MockBookingRepository::new();
        bookings.expect_create().times(0);

        let service = booking_service(users_exist(), item_repository(false), bookings);

        // 日付が不正でも可用性のチェックが先に行われる
        let now = Utc::now();
        let inverted = NewBooking::new(ItemId::new(10), now + Duration::days(2), now + Duration::days(1));
        let res = service.add_booking(UserId::new(BOOKER), inverted).await;
        assert!(matches!(res, Err(AppError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn add_booking_with_inverted_or_equal_dates_is_invalid_date() {
        let mut bookings = MockBookingRepository::new();
        bookings.expect_create().times(0);
        let service = booking_service(users_exist(), item_repository(true), bookings);

        let now = Utc::now();
        let inverted = NewBooking::new(ItemId::new(10), now + Duration::days(2), now + Duration::days(1));
        let res = service.add_booking(UserId::new(BOOKER), inverted).await;
        assert!(matches!(res, Err(AppError::InvalidDate(_))));

        let instant = now + Duration::days(1);
        let equal = NewBooking::new(ItemId::new(10), instant, instant);
        let res = service.add_booking(UserId::new(BOOKER), equal).await;
        assert!(matches!(res, Err(AppError::InvalidDate(_))));
    }

    #[tokio::test]
    async fn add_booking_for_unknown_user_or_item_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut items = MockItemRepository::new();
        items.expect_find_by_id().times(0);
        let service = booking_service(users, items, MockBookingRepository::new());
        let res = service
            .add_booking(UserId::new(BOOKER), tomorrow_request())
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));

        let mut items = MockItemRepository::new();
        items.expect_find_by_id().returning(|_| Ok(None));
        let service = booking_service(users_exist(), items, MockBookingRepository::new());
        let res = service
            .add_booking(UserId::new(BOOKER), tomorrow_request())
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }

    #[tokio::test]
    async fn owner_approves_waiting_booking() {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(|_| Ok(Some(booking(BookingStatus::Waiting))));
        bookings
            .expect_update_status()
            .withf(|event| {
                event.expected == BookingStatus::Waiting && event.status == BookingStatus::Approved
            })
            .times(1)
            .returning(|event| Ok(booking(event.status)));

        let service = booking_service(users_exist(), MockItemRepository::new(), bookings);
        let updated = service
            .update(BookingId::new(100), UserId::new(OWNER), true)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Approved);
    }

    #[tokio::test]
    async fn owner_rejects_waiting_booking() {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(|_| Ok(Some(booking(BookingStatus::Waiting))));
        bookings
            .expect_update_status()
            .withf(|event| event.status == BookingStatus::Rejected)
            .times(1)
            .returning(|event| Ok(booking(event.status)));

        let service = booking_service(users_exist(), MockItemRepository::new(), bookings);
        let updated = service
            .update(BookingId::new(100), UserId::new(OWNER), false)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Rejected);
    }

    #[tokio::test]
    async fn booker_cannot_decide_own_booking() {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(|_| Ok(Some(booking(BookingStatus::Waiting))));
        bookings.expect_update_status().times(0);

        let service = booking_service(users_exist(), MockItemRepository::new(), bookings);
        let res = service
            .update(BookingId::new(100), UserId::new(BOOKER), true)
            .await;
        assert!(matches!(res, Err(AppError::InvalidRelation(_))));
    }

    #[tokio::test]
    async fn decided_booking_is_never_mutated_again() {
        for status in [BookingStatus::Approved, BookingStatus::Rejected] {
            for approved in [true, false] {
                let mut bookings = MockBookingRepository::new();
                bookings
                    .expect_find_by_id()
                    .returning(move |_| Ok(Some(booking(status))));
                bookings.expect_update_status().times(0);

                let service = booking_service(users_exist(), MockItemRepository::new(), bookings);
                let res = service
                    .update(BookingId::new(100), UserId::new(OWNER), approved)
                    .await;
                assert!(matches!(res, Err(AppError::InvalidBookingState(_))));
            }
        }
    }

    #[tokio::test]
    async fn booking_is_visible_only_to_booker_and_owner() {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(|_| Ok(Some(booking(BookingStatus::Waiting))));
        let service = booking_service(users_exist(), MockItemRepository::new(), bookings);

        for viewer in [OWNER, BOOKER] {
            let found = service
                .get_booking_by_id(BookingId::new(100), UserId::new(viewer))
                .await
                .unwrap();
            assert_eq!(found.booking_id, BookingId::new(100));
        }

        let res = service
            .get_booking_by_id(BookingId::new(100), UserId::new(STRANGER))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let mut bookings = MockBookingRepository::new();
        bookings.expect_find_by_id().returning(|_| Ok(None));
        bookings.expect_update_status().times(0);
        let service = booking_service(users_exist(), MockItemRepository::new(), bookings);

        let res = service
            .get_booking_by_id(BookingId::new(999), UserId::new(OWNER))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        let res = service
            .update(BookingId::new(999), UserId::new(OWNER), true)
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }

    #[tokio::test]
    async fn history_query_resolves_state_and_page() {
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_page_by_booker()
            .withf(|booker_id, filter, options| {
                *booker_id == UserId::new(BOOKER)
                    && *filter == BookingFilter::Status(BookingStatus::Waiting)
                    && options.page == 2
                    && options.size == 5
            })
            .times(1)
            .returning(|_, _, _| Ok(vec![booking(BookingStatus::Waiting)]));
        bookings
            .expect_find_page_by_owner()
            .withf(|owner_id, filter, options| {
                *owner_id == UserId::new(OWNER)
                    && matches!(filter, BookingFilter::Current(_))
                    && options.page == 0
                    && options.size == 10
            })
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let service = booking_service(users_exist(), MockItemRepository::new(), bookings);
        let by_booker = service
            .get_all_bookings_by_user(UserId::new(BOOKER), BookingStateFilter::Waiting, 12, 5)
            .await
            .unwrap();
        assert_eq!(by_booker.len(), 1);

        let by_owner = service
            .get_all_bookings_all_items_by_owner(
                UserId::new(OWNER),
                BookingStateFilter::Current,
                0,
                10,
            )
            .await
            .unwrap();
        assert!(by_owner.is_empty());
    }

    #[tokio::test]
    async fn history_query_for_unknown_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut bookings = MockBookingRepository::new();
        bookings.expect_find_page_by_booker().times(0);
        bookings.expect_find_page_by_owner().times(0);
        let service = booking_service(users, MockItemRepository::new(), bookings);

        let res = service
            .get_all_bookings_by_user(UserId::new(BOOKER), BookingStateFilter::All, 0, 10)
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
        let res = service
            .get_all_bookings_all_items_by_owner(UserId::new(OWNER), BookingStateFilter::All, 0, 10)
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }
}
