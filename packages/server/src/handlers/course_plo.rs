use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Query as SeaQuery, SelectStatement};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{course, course_plo, plo, program_course, program_plo};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::mapping::*;
use crate::state::AppState;
use crate::utils::lookup::find_program;

/// Ids of the PLOs linked to a program.
async fn program_plo_ids<C: ConnectionTrait>(db: &C, program_id: i64) -> Result<Vec<i64>, DbErr> {
    program_plo::Entity::find()
        .filter(program_plo::Column::ProgramId.eq(program_id))
        .select_only()
        .column(program_plo::Column::PloId)
        .into_tuple::<i64>()
        .all(db)
        .await
}

/// Courses the program offers in any semester, section or year.
fn offered_courses(program_id: i64) -> SelectStatement {
    SeaQuery::select()
        .distinct()
        .column(program_course::Column::CourseId)
        .from(program_course::Entity)
        .and_where(program_course::Column::ProgramId.eq(program_id))
        .to_owned()
}

fn linked_plos(program_id: i64) -> SelectStatement {
    SeaQuery::select()
        .column(program_plo::Column::PloId)
        .from(program_plo::Entity)
        .and_where(program_plo::Column::ProgramId.eq(program_id))
        .to_owned()
}

#[utoipa::path(
    get,
    path = "/programs/{id}/course-plos",
    tag = "Course PLOs",
    operation_id = "listCoursePlos",
    summary = "List PLO weights of the courses offered by a program",
    params(("id" = i64, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Weights ordered by course and PLO", body = Vec<CoursePloResponse>),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_course_plos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<CoursePloResponse>>, AppError> {
    find_program(&state.db, id).await?;

    let rows = course_plo::Entity::find()
        .filter(course_plo::Column::CourseId.in_subquery(offered_courses(id)))
        .filter(course_plo::Column::PloId.in_subquery(linked_plos(id)))
        .find_also_related(course::Entity)
        .order_by_asc(course_plo::Column::CourseId)
        .order_by_asc(course_plo::Column::PloId)
        .all(&state.db)
        .await?;

    let plo_ids: Vec<i64> = rows.iter().map(|(cp, _)| cp.plo_id).collect();
    let codes: HashMap<i64, String> = plo::Entity::find()
        .filter(plo::Column::Id.is_in(plo_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.code))
        .collect();

    let items = rows
        .into_iter()
        .map(|(cp, course)| CoursePloResponse {
            course_name: course.map(|c| c.name).unwrap_or_default(),
            plo_code: codes.get(&cp.plo_id).cloned().unwrap_or_default(),
            course_id: cp.course_id,
            plo_id: cp.plo_id.into(),
            weight: cp.weight,
        })
        .collect();

    Ok(Json(items))
}

#[utoipa::path(
    post,
    path = "/programs/{id}/course-plos",
    tag = "Course PLOs",
    operation_id = "createCoursePlos",
    summary = "Record PLO weights for courses",
    description = "Scores whose PLO is not linked to the program are skipped and returned in `skipped`. The remaining scores are inserted in one transaction.",
    params(("id" = i64, Path, description = "Program ID")),
    request_body = CreateCoursePlosRequest,
    responses(
        (status = 201, description = "Weights recorded", body = CreateCoursePlosResponse),
        (status = 400, description = "Validation error or no usable score (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Program or course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Weight already recorded (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id, scores = payload.scores.len()))]
pub async fn create_course_plos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<CreateCoursePlosRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_course_plos(&payload, state.config.curriculum.max_import_rows)?;

    let txn = state.db.begin().await?;
    find_program(&txn, id).await?;
    let linked: HashSet<i64> = program_plo_ids(&txn, id).await?.into_iter().collect();

    let (valid, skipped): (Vec<CoursePloScore>, Vec<CoursePloScore>) = payload
        .scores
        .into_iter()
        .partition(|s| linked.contains(&s.plo_id.get()));
    if valid.is_empty() {
        return Err(AppError::Validation(
            "None of the PLOs are linked to this program".into(),
        ));
    }

    let models = valid.iter().map(|s| course_plo::ActiveModel {
        course_id: Set(s.course_id.trim().to_string()),
        plo_id: Set(s.plo_id.get()),
        weight: Set(s.weight),
    });
    course_plo::Entity::insert_many(models)
        .exec_without_returning(&txn)
        .await?;

    txn.commit().await?;

    if !skipped.is_empty() {
        info!(skipped = skipped.len(), "Skipped scores for unlinked PLOs");
    }
    Ok((
        StatusCode::CREATED,
        Json(CreateCoursePlosResponse {
            inserted: valid.len(),
            skipped,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/programs/{id}/course-plos",
    tag = "Course PLOs",
    operation_id = "updateCoursePlo",
    summary = "Overwrite the weight of a PLO in a course",
    params(("id" = i64, Path, description = "Program ID")),
    request_body = CoursePloScore,
    responses(
        (status = 200, description = "Weight updated", body = CoursePloScore),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Program not found, or no weight recorded for a course and PLO of this program (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id, course_id = %payload.course_id, plo_id = %payload.plo_id))]
pub async fn update_course_plo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<CoursePloScore>,
) -> Result<Json<CoursePloScore>, AppError> {
    validate_score(&payload)?;
    find_program(&state.db, id).await?;

    let course_id = payload.course_id.trim().to_string();
    let result = course_plo::Entity::update_many()
        .col_expr(course_plo::Column::Weight, Expr::value(payload.weight))
        .filter(course_plo::Column::CourseId.eq(course_id.clone()))
        .filter(course_plo::Column::PloId.eq(payload.plo_id.get()))
        .filter(course_plo::Column::CourseId.in_subquery(offered_courses(id)))
        .filter(course_plo::Column::PloId.in_subquery(linked_plos(id)))
        .exec(&state.db)
        .await?;
    // Postgres counts matched rows, so an unchanged weight still reports 1.
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "No weight recorded for course {course_id} and PLO {} in program {id}",
            payload.plo_id
        )));
    }

    Ok(Json(CoursePloScore {
        course_id,
        ..payload
    }))
}
