use crate::errors::ApiError;
use crate::models::{ListQuery, Page};
use crate::openapi::USERS_TAG;
use crate::permissions::{
    Authorized, SsoServerCreate, SsoServerDelete, SsoServerUpdate, SsoServerView,
};
use crate::services::users::{
    self, CreateUserRequest, UserProfileRequest, UserRolesRequest, UserRolesView, UserView,
};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/filter", get(list_users))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/users/{user_id}/roles",
            get(get_user_roles).put(set_user_roles),
        )
}

#[utoipa::path(
    post,
    path = "/users",
    tag = USERS_TAG,
    request_body = CreateUserRequest,
    params(("Authorization" = String, Header, description = "Bearer access token")),
    responses(
        (status = 201, description = "User created with the Member role", body = UserView),
        (status = 400, description = "Missing field or unparseable date of birth"),
        (status = 409, description = "User name already taken")
    )
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let user = users::create(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Filters on email, user name, phone number, first or last name
#[utoipa::path(
    get,
    path = "/users/filter",
    tag = USERS_TAG,
    params(
        ListQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "Users matching the filter", body = Page<UserView>),
        (status = 400, description = "Invalid page window")
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    query: ListQuery,
) -> Result<Json<Page<UserView>>, ApiError> {
    Ok(Json(users::list(state.store.as_ref(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = USERS_TAG,
    params(
        ("user_id" = String, Path, description = "User identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "User", body = UserView),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(user_id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(users::get(state.store.as_ref(), &user_id).await?))
}

#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = USERS_TAG,
    request_body = UserProfileRequest,
    params(
        ("user_id" = String, Path, description = "User identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Profile updated"),
        (status = 400, description = "Missing field or unparseable date of birth"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(user_id): Path<String>,
    Json(request): Json<UserProfileRequest>,
) -> Result<StatusCode, ApiError> {
    users::update(state.store.as_ref(), &user_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = USERS_TAG,
    params(
        ("user_id" = String, Path, description = "User identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "User and memberships deleted"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    _: Authorized<SsoServerDelete>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    users::delete(state.store.as_ref(), &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/roles",
    tag = USERS_TAG,
    params(
        ("user_id" = String, Path, description = "User identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 200, description = "User with held and available roles", body = UserRolesView),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn get_user_roles(
    State(state): State<AppState>,
    _: Authorized<SsoServerView>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRolesView>, ApiError> {
    Ok(Json(users::roles(state.store.as_ref(), &user_id).await?))
}

#[utoipa::path(
    put,
    path = "/users/{user_id}/roles",
    tag = USERS_TAG,
    request_body = UserRolesRequest,
    params(
        ("user_id" = String, Path, description = "User identifier"),
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Memberships replaced"),
        (status = 400, description = "Empty or unknown role set"),
        (status = 404, description = "User not found")
    )
)]
pub(crate) async fn set_user_roles(
    State(state): State<AppState>,
    _: Authorized<SsoServerUpdate>,
    Path(user_id): Path<String>,
    Json(request): Json<UserRolesRequest>,
) -> Result<StatusCode, ApiError> {
    users::set_roles(state.store.as_ref(), &user_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}
