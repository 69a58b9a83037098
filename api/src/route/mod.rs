use axum::Router;
use registry::AppRegistry;

pub mod booking;
pub mod health;
pub mod item;
pub mod request;
pub mod user;

pub fn routes() -> Router<AppRegistry> {
    Router::new()
        .merge(health::build_health_check_routers())
        .merge(user::build_user_routers())
        .merge(item::build_item_routers())
        .merge(booking::build_booking_routers())
        .merge(request::build_request_routers())
}
