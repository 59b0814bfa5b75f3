use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::upsert::{Applied, Prerequisite, UpsertError, UpsertPlan, run_batch};
use sea_orm::*;
use tracing::instrument;

use crate::config::CurriculumConfig;
use crate::entity::{course, program, program_course, section, semester};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::offering::*;
use crate::models::shared::{at_row, validate_batch_size};
use crate::state::AppState;
use crate::utils::filter::{OFFERING_FILTERS, build_filter};

/// Create an offering, first making sure its program, course, semester and
/// section exist. The program must already exist; the others follow the
/// configured missing-parent policy.
fn offering_plan(
    req: CreateOfferingRequest,
    policy: &CurriculumConfig,
) -> UpsertPlan<program_course::Model> {
    let key = req.key;
    let program_id = key.program_id.get();
    let course_name = req.course_name.unwrap_or_else(|| key.course_id.clone());
    let course_engname = req.course_engname.unwrap_or_else(|| course_name.clone());

    UpsertPlan::new("add offering")
        .prerequisite(Prerequisite::<program::ActiveModel>::reject(
            format!("program {program_id}"),
            Condition::all().add(program::Column::Id.eq(program_id)),
        ))
        .prerequisite(Prerequisite::with_policy(
            format!("course {}", key.course_id),
            Condition::all().add(course::Column::Id.eq(key.course_id.clone())),
            course::ActiveModel {
                id: Set(key.course_id.clone()),
                name: Set(course_name.trim().to_string()),
                engname: Set(course_engname.trim().to_string()),
            },
            policy.course_policy(),
        ))
        .prerequisite(Prerequisite::with_policy(
            format!("semester {}", key.semester_id),
            Condition::all().add(semester::Column::Id.eq(key.semester_id)),
            semester::ActiveModel {
                id: Set(key.semester_id),
                name: Set(format!("Semester {}", key.semester_id)),
            },
            policy.semester_policy(),
        ))
        .prerequisite(Prerequisite::with_policy(
            format!("section {}", key.section_id),
            Condition::all().add(section::Column::Id.eq(key.section_id)),
            section::ActiveModel {
                id: Set(key.section_id),
                name: Set(req.section_name.map(|n| n.trim().to_string())),
            },
            policy.section_policy(),
        ))
        .then(move |txn| {
            Box::pin(async move {
                let inserted = program_course::ActiveModel {
                    program_id: Set(program_id),
                    course_id: Set(key.course_id.clone()),
                    semester_id: Set(key.semester_id),
                    section_id: Set(key.section_id),
                    year: Set(key.year),
                    ..Default::default()
                }
                .insert(txn)
                .await;

                inserted.map_err(|e| match UpsertError::from(e) {
                    UpsertError::Conflict(_) => {
                        UpsertError::Conflict(format!("Offering already exists: {key}"))
                    }
                    other => other,
                })
            })
        })
}

fn created_response(applied: Applied<program_course::Model>) -> CreateOfferingResponse {
    CreateOfferingResponse {
        offering: applied.value.into(),
        created: applied.created,
    }
}

#[utoipa::path(
    post,
    path = "/offerings",
    tag = "Offerings",
    operation_id = "createOffering",
    summary = "Offer a course in a program",
    description = "Creates a program/course/semester/section/year offering in one transaction. A missing course or section is created on the fly; a missing program or semester is rejected (configurable). Repeating an identical request returns 409.",
    request_body = CreateOfferingRequest,
    responses(
        (status = 201, description = "Offering created", body = CreateOfferingResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Required parent missing (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Offering already exists (CONFLICT)", body = ErrorBody),
        (status = 503, description = "Database unavailable (UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(offering = %payload.key))]
pub async fn create_offering(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateOfferingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = validate_create_offering(payload)?;

    let applied = offering_plan(payload, &state.config.curriculum)
        .run(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(created_response(applied))))
}

#[utoipa::path(
    post,
    path = "/offerings/import",
    tag = "Offerings",
    operation_id = "importOfferings",
    summary = "Create many offerings at once",
    description = "Validates every row first, then applies all rows in one transaction. Any failing row rolls back the whole batch; the error names the row (1-based).",
    request_body = ImportOfferingsRequest,
    responses(
        (status = 201, description = "All rows imported", body = ImportOfferingsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "A row references a missing parent (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "A row duplicates an existing offering (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(rows = payload.rows.len()))]
pub async fn import_offerings(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ImportOfferingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let policy = &state.config.curriculum;
    validate_batch_size(payload.rows.len(), policy.max_import_rows)?;

    let rows = payload
        .rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| validate_create_offering(row).map_err(|e| at_row(i, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let plans = rows
        .into_iter()
        .map(|row| offering_plan(row, policy))
        .collect();
    let applied = run_batch(&state.db, "import offerings", plans).await?;

    let offerings: Vec<CreateOfferingResponse> =
        applied.into_iter().map(created_response).collect();
    Ok((
        StatusCode::CREATED,
        Json(ImportOfferingsResponse {
            imported: offerings.len(),
            offerings,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/offerings",
    tag = "Offerings",
    operation_id = "listOfferings",
    summary = "List offerings matching a filter",
    description = "Every parameter is optional; given parameters are combined with AND. Unknown parameters are rejected.",
    params(
        ("program_id" = Option<String>, Query, description = "Program ID"),
        ("course_id" = Option<String>, Query, description = "Course ID"),
        ("semester_id" = Option<i32>, Query, description = "Semester ID"),
        ("section_id" = Option<i32>, Query, description = "Section ID"),
        ("year" = Option<i32>, Query, description = "Academic year"),
    ),
    responses(
        (status = 200, description = "Matching offerings ordered by id", body = Vec<OfferingResponse>),
        (status = 400, description = "Unknown or malformed parameter (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_offerings(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<BTreeMap<String, String>>,
) -> Result<Json<Vec<OfferingResponse>>, AppError> {
    let cond = build_filter(OFFERING_FILTERS, &params)?;

    let rows = program_course::Entity::find()
        .filter(cond)
        .order_by_asc(program_course::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/offerings",
    tag = "Offerings",
    operation_id = "deleteOfferings",
    summary = "Delete offerings",
    description = "Deletes the offerings of a course in a program and semester, optionally narrowed to one section and/or year.",
    params(DeleteOfferingsQuery),
    responses(
        (status = 200, description = "Offerings deleted", body = DeleteOfferingsResponse),
        (status = 400, description = "Missing or malformed parameter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No offering matched (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query), fields(program_id = %query.program_id, course_id = %query.course_id))]
pub async fn delete_offerings(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DeleteOfferingsQuery>,
) -> Result<Json<DeleteOfferingsResponse>, AppError> {
    validate_delete_offerings(&query)?;

    let mut cond = Condition::all()
        .add(program_course::Column::ProgramId.eq(query.program_id.get()))
        .add(program_course::Column::CourseId.eq(query.course_id.trim()))
        .add(program_course::Column::SemesterId.eq(query.semester_id));
    if let Some(section_id) = query.section_id {
        cond = cond.add(program_course::Column::SectionId.eq(section_id));
    }
    if let Some(year) = query.year {
        cond = cond.add(program_course::Column::Year.eq(year));
    }

    let result = program_course::Entity::delete_many()
        .filter(cond)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("No matching offering".into()));
    }

    Ok(Json(DeleteOfferingsResponse {
        deleted: result.rows_affected,
    }))
}
