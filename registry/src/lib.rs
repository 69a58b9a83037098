use std::sync::Arc;

use adapter::memory::InMemoryStore;
use adapter::repository::{
    booking::BookingRepositoryImpl, comment::CommentRepositoryImpl,
    health::HealthCheckRepositoryImpl, item::ItemRepositoryImpl,
    request::ItemRequestRepositoryImpl, user::UserRepositoryImpl,
};
use adapter::database::ConnectionPool;
use kernel::repository::{
    booking::BookingRepository, comment::CommentRepository, health::HealthCheckRepository,
    item::ItemRepository, request::ItemRequestRepository, user::UserRepository,
};
use kernel::service::{
    booking::BookingService, item::ItemService, request::ItemRequestService,
};

#[derive(Clone)]
pub struct AppRegistry {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    user_repository: Arc<dyn UserRepository>,
    booking_service: BookingService,
    item_service: ItemService,
    request_service: ItemRequestService,
}

impl AppRegistry {
    pub fn new(pool: ConnectionPool) -> Self {
        Self::assemble(
            Arc::new(HealthCheckRepositoryImpl::new(pool.clone())),
            Arc::new(UserRepositoryImpl::new(pool.clone())),
            Arc::new(ItemRepositoryImpl::new(pool.clone())),
            Arc::new(BookingRepositoryImpl::new(pool.clone())),
            Arc::new(CommentRepositoryImpl::new(pool.clone())),
            Arc::new(ItemRequestRepositoryImpl::new(pool)),
        )
    }

    // データベースを使わずにすべてのリポジトリをプロセス内のストアで賄う
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self::assemble(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    fn assemble(
        health_check_repository: Arc<dyn HealthCheckRepository>,
        user_repository: Arc<dyn UserRepository>,
        item_repository: Arc<dyn ItemRepository>,
        booking_repository: Arc<dyn BookingRepository>,
        comment_repository: Arc<dyn CommentRepository>,
        request_repository: Arc<dyn ItemRequestRepository>,
    ) -> Self {
        let booking_service = BookingService::new(
            user_repository.clone(),
            item_repository.clone(),
            booking_repository,
        );
        let item_service = ItemService::new(
            user_repository.clone(),
            item_repository.clone(),
            comment_repository,
            request_repository.clone(),
            booking_service.clone(),
        );
        let request_service =
            ItemRequestService::new(user_repository.clone(), item_repository, request_repository);
        Self {
            health_check_repository,
            user_repository,
            booking_service,
            item_service,
            request_service,
        }
    }

    pub fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    pub fn user_repository(&self) -> Arc<dyn UserRepository> {
        self.user_repository.clone()
    }

    pub fn booking_service(&self) -> &BookingService {
        &self.booking_service
    }

    pub fn item_service(&self) -> &ItemService {
        &self.item_service
    }

    pub fn request_service(&self) -> &ItemRequestService {
        &self.request_service
    }
}
