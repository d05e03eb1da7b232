use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::UserFilter;
use crate::domain::user::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiSuccess<ListUsersResponseData>, ApiError> {
    let page = query.page.max(1);
    let page_size = query.page_size.clamp(1, 100);
    let offset = offset_for(page, page_size);

    let filter = UserFilter {
        is_active: query.active_users.then_some(true),
    };

    let page = state
        .auth_service
        .fetch(filter, offset, page_size)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ListUsersResponseData {
            count: page.count,
            items: page
                .items
                .iter()
                .map(|user| UserData::new(user, &state.id_codec))
                .collect(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_page_size")]
    page_size: i64,
    /// When false the listing includes deactivated accounts too.
    #[serde(default = "default_active_users")]
    active_users: bool,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    30
}

fn default_active_users() -> bool {
    true
}

/// Offset for a 1-based page, saturating so that a query-supplied page
/// number can never overflow.
fn offset_for(page: i64, page_size: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListUsersResponseData {
    pub count: usize,
    pub items: Vec<UserData>,
}
