use std::sync::Arc;
use std::time::Duration;

use auth::IdCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_user::delete_user;
use super::handlers::get_profile::get_profile;
use super::handlers::get_user::get_user;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::refresh_token::refresh_token;
use super::handlers::signup::signup;
use super::handlers::sso_login::sso_login;
use super::handlers::verify_email::verify_email;
use super::middleware::authenticate as auth_middleware;
use crate::domain::user::service::AuthService;
use crate::outbound::mailer::LoggingMailer;
use crate::outbound::repositories::user::PostgresUserRepository;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService<PostgresUserRepository>>,
    pub mailer: Arc<LoggingMailer>,
    pub id_codec: Arc<IdCodec>,
}

pub fn create_router(
    auth_service: Arc<AuthService<PostgresUserRepository>>,
    mailer: Arc<LoggingMailer>,
    id_codec: Arc<IdCodec>,
) -> Router {
    let state = AppState {
        auth_service,
        mailer,
        id_codec,
    };

    let public_routes = Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/sso", post(sso_login))
        .route("/api/auth/token/refresh", post(refresh_token))
        .route("/api/users", get(list_users))
        .route("/api/users/:user_id", get(get_user));

    // The literal `profile` segment takes priority over the `:user_id`
    // matcher.
    let protected_routes = Router::new()
        .route("/api/auth/signup/verify", post(verify_email))
        .route("/api/users/profile", get(get_profile))
        .route("/api/users/:user_id", delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
