pub mod user;
pub mod subdivision;
pub mod theater;
pub mod screen;
pub mod seat;
pub mod review;
pub mod favorite;

pub use user::User;
pub use subdivision::Subdivision;
pub use theater::Theater;
pub use screen::Screen;
pub use seat::{Seat, SeatMapEntry};
pub use review::SeatReview;
pub use favorite::Favorite;

use validator::ValidationError;

/// Строка из одних пробелов после `trim` стала бы пустым значением в БД.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
