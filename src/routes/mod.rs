pub mod activity;
pub mod auth;
pub mod rooms;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth & admin management
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/auth/admins", get(auth::list_admins))
        .route(
            "/api/auth/admins/{id}",
            put(auth::update_admin).delete(auth::delete_admin),
        )
        // Rooms
        .route("/api/rooms", get(rooms::list).post(rooms::create))
        .route("/api/rooms/update", post(rooms::hardware_update))
        .route("/api/rooms/occupancy", get(rooms::occupancy))
        .route("/api/rooms/analytics", get(rooms::analytics))
        .route(
            "/api/rooms/{id}",
            get(rooms::get).put(rooms::update).delete(rooms::delete),
        )
        // Activity log
        .route("/api/admin/activity", get(activity::recent))
}
