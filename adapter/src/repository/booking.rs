use crate::database::{model::booking::BookingRow, ConnectionPool};
use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    booking::{
        event::{CreateBooking, UpdateBookingStatus},
        Booking, BookingFilter, BookingStatus,
    },
    id::{BookingId, ItemId, UserId},
    list::ListOptions,
};
use kernel::repository::booking::BookingRepository;
use shared::error::{AppError, AppResult};
use sqlx::{
    types::chrono::{DateTime, Utc},
    Postgres, QueryBuilder,
};

// bookings と items を結合して予約とアイテムの情報をまとめて抽出する共通部分
const BOOKING_SELECT: &str = r#"
    SELECT
        b.booking_id,
        b.start_at,
        b.end_at,
        b.status,
        b.booker_id,
        i.item_id,
        i.name AS item_name,
        i.description AS item_description,
        i.available AS item_available,
        i.owner_id
    FROM bookings AS b
    INNER JOIN items AS i ON b.item_id = i.item_id
"#;

// 一覧取得のキーとなる列
enum BookingScope {
    Booker(UserId),
    Owner(UserId),
}

#[derive(new)]
pub struct BookingRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn create(&self, event: CreateBooking) -> AppResult<Booking> {
        let booking_id = sqlx::query_scalar::<_, BookingId>(
            r#"
                INSERT INTO bookings (item_id, booker_id, start_at, end_at, status)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING booking_id
            "#,
        )
        .bind(event.item_id)
        .bind(event.booker_id)
        .bind(event.start)
        .bind(event.end)
        .bind(event.status)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(|e| match e {
            // bookings_start_before_end 制約
            sqlx::Error::Database(ref db) if db.is_check_violation() => AppError::InvalidDate(
                "Booking start must be before its end".into(),
            ),
            e => AppError::SpecificOperationError(e),
        })?;

        self.find_by_id(booking_id).await?.ok_or_else(|| {
            AppError::NoRowsAffectedError("No booking record has been created".into())
        })
    }

    async fn update_status(&self, event: UpdateBookingStatus) -> AppResult<Booking> {
        let mut tx = self.db.begin().await?;

        // ステータスが expected のままである場合にのみ更新する。
        // 同じ予約に対する承認・却下が競合しても、どちらか一方だけが反映される
        let res = sqlx::query(
            r#"
                UPDATE bookings
                SET status = $1
                WHERE booking_id = $2 AND status = $3
            "#,
        )
        .bind(event.status)
        .bind(event.booking_id)
        .bind(event.expected)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM bookings WHERE booking_id = $1)",
            )
            .bind(event.booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            return Err(if exists {
                AppError::InvalidBookingState(format!(
                    "Booking (id = {}) is no longer {}",
                    event.booking_id, event.expected
                ))
            } else {
                AppError::EntityNotFound(format!(
                    "Booking with id {} not found",
                    event.booking_id
                ))
            });
        }

        let sql = format!("{BOOKING_SELECT} WHERE b.booking_id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(event.booking_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(Booking::from(row))
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        let sql = format!("{BOOKING_SELECT} WHERE b.booking_id = $1");
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .fetch_optional(self.db.inner_ref())
            .await
            .map(|row| row.map(Booking::from))
            .map_err(AppError::SpecificOperationError)
    }

    async fn find_page_by_booker(
        &self,
        booker_id: UserId,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>> {
        self.find_page(BookingScope::Booker(booker_id), filter, options)
            .await
    }

    async fn find_page_by_owner(
        &self,
        owner_id: UserId,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>> {
        self.find_page(BookingScope::Owner(owner_id), filter, options)
            .await
    }

    async fn find_latest_finished(
        &self,
        booker_id: UserId,
        item_id: ItemId,
        status: BookingStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let sql = format!(
            "{BOOKING_SELECT}
            WHERE b.booker_id = $1 AND b.item_id = $2 AND b.status = $3 AND b.end_at < $4
            ORDER BY b.end_at DESC, b.booking_id DESC
            LIMIT 1"
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booker_id)
            .bind(item_id)
            .bind(status)
            .bind(before)
            .fetch_optional(self.db.inner_ref())
            .await
            .map(|row| row.map(Booking::from))
            .map_err(AppError::SpecificOperationError)
    }

    async fn find_last_started(
        &self,
        item_id: ItemId,
        status: BookingStatus,
        before: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let sql = format!(
            "{BOOKING_SELECT}
            WHERE b.item_id = $1 AND b.status = $2 AND b.start_at < $3
            ORDER BY b.start_at DESC, b.booking_id DESC
            LIMIT 1"
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(item_id)
            .bind(status)
            .bind(before)
            .fetch_optional(self.db.inner_ref())
            .await
            .map(|row| row.map(Booking::from))
            .map_err(AppError::SpecificOperationError)
    }

    async fn find_next_starting(
        &self,
        item_id: ItemId,
        status: BookingStatus,
        after: DateTime<Utc>,
    ) -> AppResult<Option<Booking>> {
        let sql = format!(
            "{BOOKING_SELECT}
            WHERE b.item_id = $1 AND b.status = $2 AND b.start_at > $3
            ORDER BY b.start_at ASC, b.booking_id ASC
            LIMIT 1"
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(item_id)
            .bind(status)
            .bind(after)
            .fetch_optional(self.db.inner_ref())
            .await
            .map(|row| row.map(Booking::from))
            .map_err(AppError::SpecificOperationError)
    }
}

impl BookingRepositoryImpl {
    // find_page_by_booker / find_page_by_owner の共通実装
    // 絞り込み条件に応じて WHERE 句を組み立て、start の降順で 1 ページ分を返す
    async fn find_page(
        &self,
        scope: BookingScope,
        filter: BookingFilter,
        options: ListOptions,
    ) -> AppResult<Vec<Booking>> {
        let mut query = QueryBuilder::<Postgres>::new(BOOKING_SELECT);
        match scope {
            BookingScope::Booker(id) => query.push(" WHERE b.booker_id = ").push_bind(id),
            BookingScope::Owner(id) => query.push(" WHERE i.owner_id = ").push_bind(id),
        };
        match filter {
            BookingFilter::All => {}
            BookingFilter::Current(now) => {
                query
                    .push(" AND b.start_at < ")
                    .push_bind(now)
                    .push(" AND b.end_at > ")
                    .push_bind(now);
            }
            BookingFilter::Past(now) => {
                query.push(" AND b.end_at < ").push_bind(now);
            }
            BookingFilter::Future(now) => {
                query.push(" AND b.start_at > ").push_bind(now);
            }
            BookingFilter::Status(status) => {
                query.push(" AND b.status = ").push_bind(status);
            }
        }
        query
            .push(" ORDER BY b.start_at DESC, b.booking_id DESC LIMIT ")
            .push_bind(options.limit())
            .push(" OFFSET ")
            .push_bind(options.offset());

        query
            .build_query_as::<BookingRow>()
            .fetch_all(self.db.inner_ref())
            .await
            .map(|rows| rows.into_iter().map(Booking::from).collect())
            .map_err(AppError::SpecificOperationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{item::ItemRepositoryImpl, user::UserRepositoryImpl};
    use kernel::model::{item::event::CreateItem, user::event::CreateUser};
    use kernel::repository::{item::ItemRepository, user::UserRepository};
    use chrono::{Duration, SubsecRound};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL instance pointed to by DATABASE_URL"]
    async fn test_booking_lifecycle(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = UserRepositoryImpl::new(db.clone());
        let items = ItemRepositoryImpl::new(db.clone());
        let repo = BookingRepositoryImpl::new(db);

        let owner = users
            .create(CreateUser::new("owner".into(), "owner@example.com".into()))
            .await?;
        let booker = users
            .create(CreateUser::new("booker".into(), "booker@example.com".into()))
            .await?;
        let item = items
            .create(CreateItem::new(
                owner.user_id,
                "ladder".into(),
                "aluminium ladder".into(),
                true,
                None,
            ))
            .await?;

        let now = Utc::now();
        let past = repo
            .create(CreateBooking::new(
                item.item_id,
                booker.user_id,
                now - Duration::days(3),
                now - Duration::days(2),
                BookingStatus::Approved,
            ))
            .await?;
        let future = repo
            .create(CreateBooking::new(
                item.item_id,
                booker.user_id,
                now + Duration::days(1),
                now + Duration::days(2),
                BookingStatus::Waiting,
            ))
            .await?;
        assert_eq!(future.item.owner_id, owner.user_id);

        let all = repo
            .find_page_by_owner(owner.user_id, BookingFilter::All, ListOptions::default())
            .await?;
        assert_eq!(
            all.iter().map(|b| b.booking_id).collect::<Vec<_>>(),
            vec![future.booking_id, past.booking_id]
        );

        let waiting = repo
            .find_page_by_booker(
                booker.user_id,
                BookingFilter::Status(BookingStatus::Waiting),
                ListOptions::default(),
            )
            .await?;
        assert_eq!(waiting.len(), 1);

        let approved = repo
            .update_status(UpdateBookingStatus::new(
                future.booking_id,
                BookingStatus::Waiting,
                BookingStatus::Approved,
            ))
            .await?;
        assert_eq!(approved.status, BookingStatus::Approved);

        // 二度目の遷移は expected が一致しないので失敗する
        let res = repo
            .update_status(UpdateBookingStatus::new(
                future.booking_id,
                BookingStatus::Waiting,
                BookingStatus::Rejected,
            ))
            .await;
        assert!(matches!(res, Err(AppError::InvalidBookingState(_))));

        let last = repo
            .find_last_started(item.item_id, BookingStatus::Approved, now)
            .await?;
        assert_eq!(last.map(|b| b.booking_id), Some(past.booking_id));
        let next = repo
            .find_next_starting(item.item_id, BookingStatus::Approved, now)
            .await?;
        assert_eq!(next.map(|b| b.booking_id), Some(future.booking_id));
        let finished = repo
            .find_latest_finished(booker.user_id, item.item_id, BookingStatus::Approved, now)
            .await?;
        assert_eq!(finished.map(|b| b.booking_id), Some(past.booking_id));

        Ok(())
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL instance pointed to by DATABASE_URL"]
    async fn test_equal_start_and_end_is_invalid_date(pool: sqlx::PgPool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = UserRepositoryImpl::new(db.clone());
        let items = ItemRepositoryImpl::new(db.clone());
        let repo = BookingRepositoryImpl::new(db);

        let owner = users
            .create(CreateUser::new("owner".into(), "owner@example.com".into()))
            .await?;
        let booker = users
            .create(CreateUser::new("booker".into(), "booker@example.com".into()))
            .await?;
        let item = items
            .create(CreateItem::new(
                owner.user_id,
                "drill".into(),
                "cordless drill".into(),
                true,
                None,
            ))
            .await?;

        // ミリ秒未満の差は TIMESTAMP(3) に丸められて同時刻になる
        let base = (Utc::now() + Duration::days(1)).trunc_subsecs(3);
        let res = repo
            .create(CreateBooking::new(
                item.item_id,
                booker.user_id,
                base + Duration::microseconds(100),
                base + Duration::microseconds(400),
                BookingStatus::Waiting,
            ))
            .await;
        assert!(matches!(res, Err(AppError::InvalidDate(_))));

        Ok(())
    }
}
