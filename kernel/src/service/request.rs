use crate::{
    model::{
        id::{RequestId, UserId},
        list::ListOptions,
        request::{event::CreateItemRequest, ItemRequest, ItemRequestDetail},
        user::User,
    },
    repository::{item::ItemRepository, request::ItemRequestRepository, user::UserRepository},
};
use chrono::Utc;
use derive_new::new;
use shared::error::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;

/// アイテム依頼を扱うサービス
///
/// 依頼を返すときは、その依頼に応えて登録されたアイテムを常に添える。
#[derive(Clone, new)]
pub struct ItemRequestService {
    user_repository: Arc<dyn UserRepository>,
    item_repository: Arc<dyn ItemRepository>,
    request_repository: Arc<dyn ItemRequestRepository>,
}

impl ItemRequestService {
    pub async fn add_request(
        &self,
        user_id: UserId,
        description: String,
    ) -> AppResult<ItemRequestDetail> {
        let requester = self.require_user(user_id).await?;
        let request = self
            .request_repository
            .create(CreateItemRequest::new(
                requester.user_id,
                description,
                Utc::now(),
            ))
            .await?;

        tracing::info!(request_id = %request.request_id, requester_id = %requester.user_id, "item request created");
        Ok(ItemRequestDetail {
            request,
            items: Vec::new(),
        })
    }

    // 自分が出した依頼
    pub async fn get_own_requests(&self, user_id: UserId) -> AppResult<Vec<ItemRequestDetail>> {
        self.require_user(user_id).await?;
        let requests = self.request_repository.find_by_requester(user_id).await?;
        self.with_items(requests).await
    }

    // 他の利用者が出した依頼
    pub async fn get_others_requests(
        &self,
        user_id: UserId,
        from: i64,
        size: i64,
    ) -> AppResult<Vec<ItemRequestDetail>> {
        self.require_user(user_id).await?;
        let options = ListOptions::from_offset(from, size)?;

        tracing::debug!(user_id = %user_id, ?options, "listing item requests of other users");
        let requests = self
            .request_repository
            .find_page_of_others(user_id, options)
            .await?;
        self.with_items(requests).await
    }

    pub async fn get_request(
        &self,
        user_id: UserId,
        request_id: RequestId,
    ) -> AppResult<ItemRequestDetail> {
        self.require_user(user_id).await?;
        let request = self
            .request_repository
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("Item request with id {request_id} not found"))
            })?;

        let mut details = self.with_items(vec![request]).await?;
        details.pop().ok_or_else(|| {
            AppError::EntityNotFound(format!("Item request with id {request_id} not found"))
        })
    }

    // 依頼の順序を保ったまま、対応するアイテムをまとめて 1 回で取得して振り分ける
    async fn with_items(&self, requests: Vec<ItemRequest>) -> AppResult<Vec<ItemRequestDetail>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let ids = requests.iter().map(|r| r.request_id).collect();
        let mut items_by_request = HashMap::<RequestId, Vec<_>>::new();
        for item in self.item_repository.find_by_request_ids(ids).await? {
            if let Some(request_id) = item.request_id {
                items_by_request.entry(request_id).or_default().push(item);
            }
        }

        Ok(requests
            .into_iter()
            .map(|request| ItemRequestDetail {
                items: items_by_request
                    .remove(&request.request_id)
                    .unwrap_or_default(),
                request,
            })
            .collect())
    }

    async fn require_user(&self, user_id: UserId) -> AppResult<User> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::EntityNotFound(format!("User with id {user_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{id::ItemId, item::Item},
        repository::{
            item::MockItemRepository, request::MockItemRequestRepository,
            user::MockUserRepository,
        },
    };
    use chrono::Duration;

    const ALICE: i64 = 1;
    const BOB: i64 = 2;

    fn users_exist() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|id| {
            Ok(Some(User {
                user_id: id,
                user_name: format!("user{id}"),
                email: format!("user{id}@example.com"),
            }))
        });
        users
    }

    fn request(id: i64, requester: i64, hours_ago: i64) -> ItemRequest {
        ItemRequest {
            request_id: RequestId::new(id),
            description: format!("request {id}"),
            requester_id: UserId::new(requester),
            created_at: Utc::now() - Duration::hours(hours_ago),
        }
    }

    fn answer(item: i64, request: i64) -> Item {
        Item {
            item_id: ItemId::new(item),
            name: format!("item {item}"),
            description: "answer".into(),
            available: true,
            owner_id: UserId::new(BOB),
            request_id: Some(RequestId::new(request)),
        }
    }

    fn service(
        users: MockUserRepository,
        items: MockItemRepository,
        requests: MockItemRequestRepository,
    ) -> ItemRequestService {
        ItemRequestService::new(Arc::new(users), Arc::new(items), Arc::new(requests))
    }

    #[tokio::test]
    async fn new_request_has_no_items() {
        let mut requests = MockItemRequestRepository::new();
        requests
            .expect_create()
            .withf(|event| event.requester_id == UserId::new(ALICE))
            .times(1)
            .returning(|event| {
                Ok(ItemRequest {
                    request_id: RequestId::new(1),
                    description: event.description,
                    requester_id: event.requester_id,
                    created_at: event.created_at,
                })
            });
        let mut items = MockItemRepository::new();
        items.expect_find_by_request_ids().times(0);

        let detail = service(users_exist(), items, requests)
            .add_request(UserId::new(ALICE), "need a ladder".into())
            .await
            .unwrap();
        assert_eq!(detail.request.description, "need a ladder");
        assert!(detail.items.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_cannot_request() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut requests = MockItemRequestRepository::new();
        requests.expect_create().times(0);

        let res = service(users, MockItemRepository::new(), requests)
            .add_request(UserId::new(ALICE), "need a ladder".into())
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }

    #[tokio::test]
    async fn own_requests_keep_order_and_collect_answers() {
        let mut requests = MockItemRequestRepository::new();
        requests
            .expect_find_by_requester()
            .returning(|_| Ok(vec![request(2, ALICE, 1), request(1, ALICE, 5)]));
        let mut items = MockItemRepository::new();
        items
            .expect_find_by_request_ids()
            .times(1)
            .returning(|_| Ok(vec![answer(10, 1), answer(11, 1), answer(12, 2)]));

        let details = service(users_exist(), items, requests)
            .get_own_requests(UserId::new(ALICE))
            .await
            .unwrap();
        assert_eq!(
            details.iter().map(|d| d.request.request_id.raw()).collect::<Vec<_>>(),
            vec![2, 1]
        );
        assert_eq!(details[0].items.len(), 1);
        assert_eq!(details[1].items.len(), 2);
    }

    #[tokio::test]
    async fn others_requests_are_paged() {
        let mut requests = MockItemRequestRepository::new();
        requests
            .expect_find_page_of_others()
            .withf(|user, options| {
                *user == UserId::new(ALICE) && options.offset() == 2 && options.limit() == 2
            })
            .times(1)
            .returning(|_, _| Ok(vec![request(3, BOB, 1)]));
        let mut items = MockItemRepository::new();
        items.expect_find_by_request_ids().returning(|_| Ok(vec![]));

        let details = service(users_exist(), items, requests)
            .get_others_requests(UserId::new(ALICE), 3, 2)
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].request.requester_id, UserId::new(BOB));
    }

    #[tokio::test]
    async fn invalid_paging_of_others_requests() {
        let mut requests = MockItemRequestRepository::new();
        requests.expect_find_page_of_others().times(0);

        let service = service(users_exist(), MockItemRepository::new(), requests);
        let res = service.get_others_requests(UserId::new(ALICE), 0, 0).await;
        assert!(matches!(res, Err(AppError::InvalidPagination(_))));
    }

    #[tokio::test]
    async fn missing_request_is_not_found() {
        let mut requests = MockItemRequestRepository::new();
        requests.expect_find_by_id().returning(|_| Ok(None));

        let res = service(users_exist(), MockItemRepository::new(), requests)
            .get_request(UserId::new(BOB), RequestId::new(42))
            .await;
        assert!(matches!(res, Err(AppError::EntityNotFound(_))));
    }
}
