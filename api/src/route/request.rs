use axum::{
    routing::{get, post},
    Router,
};
use registry::AppRegistry;

use crate::handler::request::{
    register_request, show_others_requests, show_own_requests, show_request,
};

pub fn build_request_routers() -> Router<AppRegistry> {
    let requests_routers = Router::new()
        .route("/", post(register_request))
        .route("/", get(show_own_requests))
        .route("/all", get(show_others_requests))
        .route("/:request_id", get(show_request));

    Router::new().nest("/requests", requests_routers)
}
