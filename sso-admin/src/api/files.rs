use crate::errors::ApiError;
use crate::openapi::FILES_TAG;
use crate::permissions::{Authorized, SsoServerCreate};
use crate::services::files::{self, FileUpload};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/files/upload", post(upload_file))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub(crate) struct UploadQuery {
    /// Name the file is stored under, without any directory part
    pub file_name: String,
}

/// Stores the raw request body, replacing any earlier upload with the same name
#[utoipa::path(
    post,
    path = "/files/upload",
    tag = FILES_TAG,
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    params(
        UploadQuery,
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 201, description = "File stored", body = FileUpload),
        (status = 400, description = "Empty body or unsafe file name")
    )
)]
pub(crate) async fn upload_file(
    State(state): State<AppState>,
    _: Authorized<SsoServerCreate>,
    query: Result<Query<UploadQuery>, QueryRejection>,
    body: Bytes,
) -> Result<(StatusCode, Json<FileUpload>), ApiError> {
    let Query(query) = query?;
    let stored = files::upload(state.files.as_ref(), &query.file_name, &body).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
