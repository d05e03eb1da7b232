use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::require_token;
use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::inbound::http::middleware::CurrentUser;
use crate::inbound::http::router::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    require_token(
        &current.claims,
        auth::TokenKind::Access,
        auth::Scope::ProfileRead,
    )?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        UserData::new(&current.user, &state.id_codec),
    ))
}
