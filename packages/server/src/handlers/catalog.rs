use axum::Json;
use axum::extract::State;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{section, semester};
use crate::error::AppError;
use crate::models::catalog::{SectionResponse, SemesterResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/semesters",
    tag = "Catalog",
    operation_id = "listSemesters",
    summary = "List semesters",
    responses((status = 200, description = "Semesters ordered by id", body = Vec<SemesterResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_semesters(
    State(state): State<AppState>,
) -> Result<Json<Vec<SemesterResponse>>, AppError> {
    let rows = semester::Entity::find()
        .order_by_asc(semester::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/sections",
    tag = "Catalog",
    operation_id = "listSections",
    summary = "List sections",
    responses((status = 200, description = "Sections ordered by id", body = Vec<SectionResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_sections(
    State(state): State<AppState>,
) -> Result<Json<Vec<SectionResponse>>, AppError> {
    let rows = section::Entity::find()
        .order_by_asc(section::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
