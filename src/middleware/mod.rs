use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;

/// Заголовок, который проставляет identity-прокси перед сервисом.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub external_id: String,
    pub name: String,
}

// Сессии выдаёт внешний провайдер; здесь только сопоставляем его id с нашей строкой users
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>
    ) -> Result<Self, Self::Rejection> {
        let external_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let user = User::find_by_external_id(external_id, &state.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id: user.id,
            external_id: user.external_id,
            name: user.name,
        })
    }
}
