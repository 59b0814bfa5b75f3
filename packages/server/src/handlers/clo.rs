use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::OfferingKey;
use common::upsert::{Prerequisite, UpsertError, UpsertPlan, run_batch};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{clo, course_clo, plo_clo, program_course};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::clo::*;
use crate::models::shared::{at_row, validate_batch_size};
use crate::state::AppState;
use crate::utils::lookup::{course_clo_condition, find_offering, offering_condition};

fn offering_must_exist(key: &OfferingKey) -> Prerequisite<program_course::ActiveModel> {
    Prerequisite::reject(format!("offering ({key})"), offering_condition(key))
}

fn link_condition(key: &OfferingKey, clo_id: i64) -> Condition {
    course_clo_condition(key).add(course_clo::Column::CloId.eq(clo_id))
}

/// Create a CLO for an existing offering and attach it to that offering.
fn clo_plan(req: CreateCloRequest) -> UpsertPlan<CreateCloResponse> {
    UpsertPlan::new("add clo")
        .prerequisite(offering_must_exist(&req.offering))
        .then(move |txn| {
            Box::pin(async move {
                let model = clo::ActiveModel {
                    code: Set(req.code.trim().to_string()),
                    name: Set(req.name.trim().to_string()),
                    engname: Set(req.engname.trim().to_string()),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                let link = course_clo::ActiveModel {
                    course_id: Set(req.offering.course_id.clone()),
                    semester_id: Set(req.offering.semester_id),
                    section_id: Set(req.offering.section_id),
                    year: Set(req.offering.year),
                    clo_id: Set(model.id),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                Ok(CreateCloResponse {
                    clo_id: model.id.into(),
                    course_clo_id: link.id.into(),
                })
            })
        })
}

#[utoipa::path(
    post,
    path = "/clos",
    tag = "CLOs",
    operation_id = "createClo",
    summary = "Create a CLO for a course offering",
    description = "The offering (program, course, semester, section, year) must already exist. The CLO and its link to the offering's course are created in one transaction.",
    request_body = CreateCloRequest,
    responses(
        (status = 201, description = "CLO created", body = CreateCloResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Offering not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(offering = %payload.offering, code = %payload.code))]
pub async fn create_clo(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCloRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = validate_create_clo(payload)?;

    let applied = clo_plan(payload).run(&state.db).await?;

    Ok((StatusCode::CREATED, Json(applied.value)))
}

#[utoipa::path(
    post,
    path = "/clos/import",
    tag = "CLOs",
    operation_id = "importClos",
    summary = "Create many CLOs at once",
    description = "Validates every row first, then creates all CLOs in one transaction. Any failing row rolls back the whole batch; the error names the row (1-based).",
    request_body = ImportClosRequest,
    responses(
        (status = 201, description = "All rows imported", body = ImportClosResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "A row references a missing offering (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(rows = payload.rows.len()))]
pub async fn import_clos(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImportClosRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_batch_size(payload.rows.len(), state.config.curriculum.max_import_rows)?;

    let rows = payload
        .rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| validate_create_clo(row).map_err(|e| at_row(i, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let plans = rows.into_iter().map(clo_plan).collect();
    let applied = run_batch(&state.db, "import clos", plans).await?;

    let clos: Vec<CreateCloResponse> = applied.into_iter().map(|a| a.value).collect();
    Ok((
        StatusCode::CREATED,
        Json(ImportClosResponse {
            imported: clos.len(),
            clos,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/clos",
    tag = "CLOs",
    operation_id = "listClos",
    summary = "List the CLOs of a course offering",
    params(OfferingKey),
    responses(
        (status = 200, description = "CLOs ordered by code", body = Vec<CloResponse>),
        (status = 400, description = "Missing or malformed parameter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Offering not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, key), fields(offering = %key))]
pub async fn list_clos(
    State(state): State<AppState>,
    AppQuery(key): AppQuery<OfferingKey>,
) -> Result<Json<Vec<CloResponse>>, AppError> {
    let key = validate_offering_key(key)?;
    find_offering(&state.db, &key).await?;

    let rows = course_clo::Entity::find()
        .filter(course_clo_condition(&key))
        .find_also_related(clo::Entity)
        .order_by_asc(course_clo::Column::CloId)
        .all(&state.db)
        .await?;

    let mut clos: Vec<CloResponse> = rows
        .into_iter()
        .filter_map(|(_, clo)| clo.map(Into::into))
        .collect();
    clos.sort_by(|a, b| a.code.cmp(&b.code));

    Ok(Json(clos))
}

#[utoipa::path(
    put,
    path = "/clos/{clo_id}",
    tag = "CLOs",
    operation_id = "updateClo",
    summary = "Update the text of a CLO",
    description = "The CLO must be linked to the given offering.",
    params(("clo_id" = i64, Path, description = "CLO ID")),
    request_body = UpdateCloRequest,
    responses(
        (status = 200, description = "CLO updated", body = CloResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Offering or CLO link not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(clo_id))]
pub async fn update_clo(
    State(state): State<AppState>,
    Path(clo_id): Path<i64>,
    AppJson(payload): AppJson<UpdateCloRequest>,
) -> Result<Json<CloResponse>, AppError> {
    let payload = validate_update_clo(payload)?;
    let link = link_condition(&payload.offering, clo_id);

    let applied = UpsertPlan::new("update clo")
        .prerequisite(offering_must_exist(&payload.offering))
        .prerequisite(Prerequisite::<course_clo::ActiveModel>::reject(
            format!("clo {clo_id} in this offering"),
            link,
        ))
        .then(move |txn| {
            Box::pin(async move {
                let existing = clo::Entity::find_by_id(clo_id)
                    .lock(LockType::Update)
                    .one(txn)
                    .await?
                    .ok_or_else(|| UpsertError::NotFound(format!("clo {clo_id} not found")))?;
                let mut active: clo::ActiveModel = existing.into();
                active.name = Set(payload.name.trim().to_string());
                active.engname = Set(payload.engname.trim().to_string());
                Ok(active.update(txn).await?)
            })
        })
        .run(&state.db)
        .await?;

    Ok(Json(applied.value.into()))
}

#[utoipa::path(
    post,
    path = "/clos/{clo_id}/links",
    tag = "CLOs",
    operation_id = "linkClo",
    summary = "Attach an existing CLO to another offering",
    params(("clo_id" = i64, Path, description = "CLO ID")),
    request_body = OfferingKey,
    responses(
        (status = 201, description = "CLO linked", body = LinkCloResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "CLO or offering not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "CLO already linked to the offering (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(clo_id, offering = %payload))]
pub async fn link_clo(
    State(state): State<AppState>,
    Path(clo_id): Path<i64>,
    AppJson(payload): AppJson<OfferingKey>,
) -> Result<impl IntoResponse, AppError> {
    let key = validate_offering_key(payload)?;

    let applied = UpsertPlan::new("link clo")
        .prerequisite(Prerequisite::<clo::ActiveModel>::reject(
            format!("clo {clo_id}"),
            Condition::all().add(clo::Column::Id.eq(clo_id)),
        ))
        .prerequisite(offering_must_exist(&key))
        .then(move |txn| {
            Box::pin(async move {
                let inserted = course_clo::ActiveModel {
                    course_id: Set(key.course_id.clone()),
                    semester_id: Set(key.semester_id),
                    section_id: Set(key.section_id),
                    year: Set(key.year),
                    clo_id: Set(clo_id),
                    ..Default::default()
                }
                .insert(txn)
                .await;
                inserted.map_err(|e| match UpsertError::from(e) {
                    UpsertError::Conflict(_) => UpsertError::Conflict(format!(
                        "clo {clo_id} is already linked to this offering"
                    )),
                    other => other,
                })
            })
        })
        .run(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkCloResponse {
            course_clo_id: applied.value.id.into(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/clos/{clo_id}",
    tag = "CLOs",
    operation_id = "deleteCloLink",
    summary = "Detach a CLO from an offering",
    description = "Removes the link between the CLO and the offering together with the offering's PLO mappings for that CLO. When no other offering uses the CLO, the CLO itself is deleted.",
    params(
        ("clo_id" = i64, Path, description = "CLO ID"),
        OfferingKey,
    ),
    responses(
        (status = 200, description = "Link removed", body = DeleteCloLinkResponse),
        (status = 400, description = "Missing or malformed parameter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Offering or CLO link not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, key), fields(clo_id, offering = %key))]
pub async fn delete_clo_link(
    State(state): State<AppState>,
    Path(clo_id): Path<i64>,
    AppQuery(key): AppQuery<OfferingKey>,
) -> Result<Json<DeleteCloLinkResponse>, AppError> {
    let key = validate_offering_key(key)?;

    let applied = UpsertPlan::new("delete clo link")
        .prerequisite(offering_must_exist(&key))
        .then(move |txn| {
            Box::pin(async move {
                // Concurrent deletes of the same CLO's links queue here, so the
                // remaining-link count below sees every committed removal.
                clo::Entity::find_by_id(clo_id)
                    .lock(LockType::Update)
                    .one(txn)
                    .await?
                    .ok_or_else(|| {
                        UpsertError::NotFound(format!(
                            "clo {clo_id} is not linked to this offering"
                        ))
                    })?;

                let removed = course_clo::Entity::delete_many()
                    .filter(link_condition(&key, clo_id))
                    .exec(txn)
                    .await?;
                if removed.rows_affected == 0 {
                    return Err(UpsertError::NotFound(format!(
                        "clo {clo_id} is not linked to this offering"
                    )));
                }

                plo_clo::Entity::delete_many()
                    .filter(plo_clo::Column::CloId.eq(clo_id))
                    .filter(plo_clo::Column::CourseId.eq(key.course_id.clone()))
                    .filter(plo_clo::Column::SemesterId.eq(key.semester_id))
                    .filter(plo_clo::Column::SectionId.eq(key.section_id))
                    .filter(plo_clo::Column::Year.eq(key.year))
                    .exec(txn)
                    .await?;

                let remaining = course_clo::Entity::find()
                    .filter(course_clo::Column::CloId.eq(clo_id))
                    .count(txn)
                    .await?;
                if remaining > 0 {
                    return Ok(false);
                }

                plo_clo::Entity::delete_many()
                    .filter(plo_clo::Column::CloId.eq(clo_id))
                    .exec(txn)
                    .await?;
                clo::Entity::delete_by_id(clo_id).exec(txn).await?;
                Ok(true)
            })
        })
        .run(&state.db)
        .await?;

    if applied.value {
        info!(clo_id, "Deleted CLO with no remaining links");
    }

    Ok(Json(DeleteCloLinkResponse {
        clo_id: clo_id.into(),
        clo_deleted: applied.value,
    }))
}
