use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::upsert::{Prerequisite, UpsertPlan, run_batch};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{course, plo, program, program_course, program_plo, section, semester};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::offering::OfferingDetail;
use crate::models::plo::{PloResponse, UpdatePloRequest, validate_update_plo};
use crate::models::program::*;
use crate::state::AppState;
use crate::utils::lookup::find_program;

#[utoipa::path(
    get,
    path = "/programs",
    tag = "Programs",
    operation_id = "listPrograms",
    summary = "List programs",
    responses(
        (status = 200, description = "All programs ordered by id", body = Vec<ProgramResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_programs(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProgramResponse>>, AppError> {
    let programs = program::Entity::find()
        .order_by_asc(program::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(programs.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/programs",
    tag = "Programs",
    operation_id = "createProgram",
    summary = "Create a program",
    request_body = ProgramRequest,
    responses(
        (status = 201, description = "Program created", body = ProgramResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn create_program(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProgramRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_program(&payload)?;

    let model = program::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ProgramResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/programs/{id}",
    tag = "Programs",
    operation_id = "getProgram",
    summary = "Get a program by ID",
    params(("id" = i64, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Program", body = ProgramResponse),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProgramResponse>, AppError> {
    let model = find_program(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/programs/{id}",
    tag = "Programs",
    operation_id = "updateProgram",
    summary = "Rename a program",
    params(("id" = i64, Path, description = "Program ID")),
    request_body = ProgramRequest,
    responses(
        (status = 200, description = "Program updated", body = ProgramResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<ProgramRequest>,
) -> Result<Json<ProgramResponse>, AppError> {
    validate_program(&payload)?;

    let existing = find_program(&state.db, id).await?;
    let mut active: program::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/programs/{id}",
    tag = "Programs",
    operation_id = "deleteProgram",
    summary = "Delete a program",
    description = "Deletes a program and its PLO links. Programs that still have course offerings cannot be deleted.",
    params(("id" = i64, Path, description = "Program ID")),
    responses(
        (status = 204, description = "Program deleted"),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Program has offerings (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_program(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    program::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))?;

    let offerings = program_course::Entity::find()
        .filter(program_course::Column::ProgramId.eq(id))
        .count(&txn)
        .await?;
    if offerings > 0 {
        return Err(AppError::Conflict(format!(
            "Program has {offerings} course offering(s)"
        )));
    }

    program_plo::Entity::delete_many()
        .filter(program_plo::Column::ProgramId.eq(id))
        .exec(&txn)
        .await?;
    program::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/programs/{id}/plos",
    tag = "Program PLOs",
    operation_id = "listProgramPlos",
    summary = "List the PLOs linked to a program",
    params(("id" = i64, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Linked PLOs ordered by code", body = Vec<PloResponse>),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_program_plos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PloResponse>>, AppError> {
    find_program(&state.db, id).await?;

    let rows = program_plo::Entity::find()
        .filter(program_plo::Column::ProgramId.eq(id))
        .find_also_related(plo::Entity)
        .order_by_asc(program_plo::Column::PloId)
        .all(&state.db)
        .await?;

    let mut plos: Vec<PloResponse> = rows
        .into_iter()
        .filter_map(|(_, plo)| plo.map(Into::into))
        .collect();
    plos.sort_by(|a, b| a.code.cmp(&b.code));

    Ok(Json(plos))
}

#[utoipa::path(
    post,
    path = "/programs/{id}/plos",
    tag = "Program PLOs",
    operation_id = "linkProgramPlos",
    summary = "Link existing PLOs to a program",
    description = "Links every listed PLO in one transaction. If any PLO is missing or already linked nothing is linked.",
    params(("id" = i64, Path, description = "Program ID")),
    request_body = LinkPlosRequest,
    responses(
        (status = 204, description = "PLOs linked"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Program or PLO not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "PLO already linked (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id, count = payload.plo_ids.len()))]
pub async fn link_program_plos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<LinkPlosRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_link_plos(&payload, state.config.curriculum.max_import_rows)?;

    let plans = payload
        .plo_ids
        .into_iter()
        .map(|plo_id| {
            let plo_id = plo_id.get();
            UpsertPlan::new("link program plo")
                .prerequisite(Prerequisite::<program::ActiveModel>::reject(
                    format!("program {id}"),
                    Condition::all().add(program::Column::Id.eq(id)),
                ))
                .prerequisite(Prerequisite::<plo::ActiveModel>::reject(
                    format!("plo {plo_id}"),
                    Condition::all().add(plo::Column::Id.eq(plo_id)),
                ))
                .then(move |txn| {
                    Box::pin(async move {
                        program_plo::ActiveModel {
                            program_id: Set(id),
                            plo_id: Set(plo_id),
                        }
                        .insert(txn)
                        .await?;
                        Ok(())
                    })
                })
        })
        .collect();

    run_batch(&state.db, "link program plos", plans).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/programs/{id}/plos/{plo_id}",
    tag = "Program PLOs",
    operation_id = "updateProgramPlo",
    summary = "Update the text of a PLO linked to a program",
    params(
        ("id" = i64, Path, description = "Program ID"),
        ("plo_id" = i64, Path, description = "PLO ID"),
    ),
    request_body = UpdatePloRequest,
    responses(
        (status = 200, description = "PLO updated", body = PloResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "PLO is not linked to the program (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id, plo_id))]
pub async fn update_program_plo(
    State(state): State<AppState>,
    Path((id, plo_id)): Path<(i64, i64)>,
    AppJson(payload): AppJson<UpdatePloRequest>,
) -> Result<Json<PloResponse>, AppError> {
    validate_update_plo(&payload)?;

    let txn = state.db.begin().await?;
    program_plo::Entity::find_by_id((id, plo_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("PLO is not linked to this program".into()))?;

    let existing = plo::Entity::find_by_id(plo_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("PLO not found".into()))?;
    let mut active: plo::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.engname = Set(payload.engname.trim().to_string());
    let model = active.update(&txn).await?;

    txn.commit().await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/programs/{id}/plos/{plo_id}",
    tag = "Program PLOs",
    operation_id = "unlinkProgramPlo",
    summary = "Unlink a PLO from a program",
    params(
        ("id" = i64, Path, description = "Program ID"),
        ("plo_id" = i64, Path, description = "PLO ID"),
    ),
    responses(
        (status = 204, description = "PLO unlinked"),
        (status = 404, description = "PLO is not linked to the program (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id, plo_id))]
pub async fn unlink_program_plo(
    State(state): State<AppState>,
    Path((id, plo_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let result = program_plo::Entity::delete_by_id((id, plo_id))
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(
            "PLO is not linked to this program".into(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/programs/{id}/offerings",
    tag = "Programs",
    operation_id = "listProgramOfferings",
    summary = "List a program's course offerings with names",
    params(("id" = i64, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Offerings ordered by year, semester, course and section", body = Vec<OfferingDetail>),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_program_offerings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<OfferingDetail>>, AppError> {
    let owner = find_program(&state.db, id).await?;

    let rows = program_course::Entity::find()
        .filter(program_course::Column::ProgramId.eq(id))
        .find_also_related(course::Entity)
        .order_by_asc(program_course::Column::Year)
        .order_by_asc(program_course::Column::SemesterId)
        .order_by_asc(program_course::Column::CourseId)
        .order_by_asc(program_course::Column::SectionId)
        .all(&state.db)
        .await?;

    let semesters: HashMap<i32, String> = semester::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    let sections: HashMap<i32, Option<String>> = section::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let items = rows
        .into_iter()
        .map(|(offering, course)| {
            let (course_name, course_engname) = course
                .map(|c| (c.name, c.engname))
                .unwrap_or_default();
            OfferingDetail {
                id: offering.id.into(),
                program_id: offering.program_id.into(),
                program_name: owner.name.clone(),
                semester_name: semesters.get(&offering.semester_id).cloned(),
                section_name: sections.get(&offering.section_id).cloned().flatten(),
                course_id: offering.course_id,
                course_name,
                course_engname,
                semester_id: offering.semester_id,
                section_id: offering.section_id,
                year: offering.year,
            }
        })
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    get,
    path = "/programs/{id}/years",
    tag = "Programs",
    operation_id = "listProgramYears",
    summary = "List the years a program has offerings in",
    params(("id" = i64, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Distinct years, ascending", body = Vec<i32>),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_program_years(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<i32>>, AppError> {
    find_program(&state.db, id).await?;

    let years = program_course::Entity::find()
        .filter(program_course::Column::ProgramId.eq(id))
        .select_only()
        .column(program_course::Column::Year)
        .distinct()
        .order_by_asc(program_course::Column::Year)
        .into_tuple::<i32>()
        .all(&state.db)
        .await?;

    Ok(Json(years))
}
