pub mod admin;
pub mod favorites;
pub mod reviews;
pub mod seats;
pub mod theaters;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(theaters::routes())
        .merge(seats::routes())
        .merge(reviews::routes())
        .merge(favorites::routes())
        .nest("/admin", admin::routes())
}
