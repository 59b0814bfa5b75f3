use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::upsert::{Prerequisite, UpsertError, UpsertPlan};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{course, course_clo, course_plo, plo_clo, program_course};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::course::*;
use crate::models::shared::escape_like;
use crate::state::AppState;
use crate::utils::lookup::find_course;

#[utoipa::path(
    get,
    path = "/courses",
    tag = "Courses",
    operation_id = "listCourses",
    summary = "List courses",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Courses ordered by id", body = Vec<CourseResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_courses(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CourseListQuery>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let mut select = course::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(course::Column::Id)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(course::Column::Name)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(course::Column::Engname)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let courses = select
        .order_by_asc(course::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/courses",
    tag = "Courses",
    operation_id = "createCourse",
    summary = "Create a course",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Course id already used (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id = %payload.id))]
pub async fn create_course(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_course(&payload)?;

    let id = payload.id.trim().to_string();
    let inserted = course::ActiveModel {
        id: Set(id.clone()),
        name: Set(payload.name.trim().to_string()),
        engname: Set(payload.engname.trim().to_string()),
    }
    .insert(&state.db)
    .await;

    let model = match inserted {
        Ok(model) => model,
        Err(e) => match AppError::from(e) {
            AppError::Conflict(_) => {
                return Err(AppError::Conflict(format!("Course {id} already exists")));
            }
            other => return Err(other),
        },
    };

    Ok((StatusCode::CREATED, Json(CourseResponse::from(model))))
}

#[utoipa::path(
    put,
    path = "/courses/{course_id}",
    tag = "Courses",
    operation_id = "updateCourse",
    summary = "Update a course's names",
    params(("course_id" = String, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(course_id))]
pub async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, AppError> {
    validate_update_course(&payload)?;

    let existing = find_course(&state.db, &course_id).await?;
    let mut active: course::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.engname = Set(payload.engname.trim().to_string());
    let model = active.update(&state.db).await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/courses/{course_id}",
    tag = "Courses",
    operation_id = "deleteCourse",
    summary = "Delete a course",
    description = "Only courses that no offering, PLO weight or CLO refers to can be deleted.",
    params(("course_id" = String, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Course is still referenced (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(course_id))]
pub async fn delete_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    course::Entity::find_by_id(course_id.clone())
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} not found")))?;

    let references = program_course::Entity::find()
        .filter(program_course::Column::CourseId.eq(course_id.clone()))
        .count(&txn)
        .await?
        + course_plo::Entity::find()
            .filter(course_plo::Column::CourseId.eq(course_id.clone()))
            .count(&txn)
            .await?
        + course_clo::Entity::find()
            .filter(course_clo::Column::CourseId.eq(course_id.clone()))
            .count(&txn)
            .await?
        + plo_clo::Entity::find()
            .filter(plo_clo::Column::CourseId.eq(course_id.clone()))
            .count(&txn)
            .await?;
    if references > 0 {
        return Err(AppError::Conflict(format!(
            "Course {course_id} is referenced by {references} row(s)"
        )));
    }

    course::Entity::delete_by_id(course_id).exec(&txn).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/courses/{course_id}/rename",
    tag = "Courses",
    operation_id = "renameCourse",
    summary = "Change a course's id",
    description = "Moves every offering, PLO weight, PLO-CLO mapping and CLO link from the old id to the new one, removes the old course and sets the names, all in one transaction. If the new id equals the old one only the names change.",
    params(("course_id" = String, Path, description = "Current course ID")),
    request_body = RenameCourseRequest,
    responses(
        (status = 200, description = "Course renamed; counts of moved rows per table", body = RenameCourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "New course id already used (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(course_id, new_course_id = %payload.new_course_id))]
pub async fn rename_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    AppJson(payload): AppJson<RenameCourseRequest>,
) -> Result<Json<RenameCourseResponse>, AppError> {
    validate_rename_course(&payload)?;

    let old_id = course_id;
    let new_id = payload.new_course_id.trim().to_string();
    let name = payload.name.trim().to_string();
    let engname = payload.engname.trim().to_string();

    let applied = UpsertPlan::new("rename course")
        .prerequisite(Prerequisite::<course::ActiveModel>::reject(
            format!("course {old_id}"),
            Condition::all().add(course::Column::Id.eq(old_id.clone())),
        ))
        .then(move |txn| Box::pin(rename_in(txn, old_id, new_id, name, engname)))
        .run(&state.db)
        .await?;

    let counts = applied.value;
    info!(
        course_id = %counts.course_id,
        offerings = counts.program_course,
        clo_links = counts.course_clo,
        "Renamed course"
    );
    Ok(Json(counts))
}

async fn rename_in(
    txn: &DatabaseTransaction,
    old_id: String,
    new_id: String,
    name: String,
    engname: String,
) -> Result<RenameCourseResponse, UpsertError> {
    // A concurrent rename of the same course waits here and then finds it gone.
    course::Entity::find_by_id(old_id.clone())
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| UpsertError::NotFound(format!("course {old_id} not found")))?;

    if old_id == new_id {
        course::Entity::update_many()
            .col_expr(course::Column::Name, Expr::value(name))
            .col_expr(course::Column::Engname, Expr::value(engname))
            .filter(course::Column::Id.eq(old_id.clone()))
            .exec(txn)
            .await?;
        return Ok(RenameCourseResponse {
            course_id: old_id,
            ..Default::default()
        });
    }

    if course::Entity::find_by_id(new_id.clone())
        .one(txn)
        .await?
        .is_some()
    {
        return Err(UpsertError::Conflict(format!(
            "Course {new_id} already exists"
        )));
    }

    course::ActiveModel {
        id: Set(new_id.clone()),
        name: Set(name),
        engname: Set(engname),
    }
    .insert(txn)
    .await?;

    let offerings = program_course::Entity::update_many()
        .col_expr(program_course::Column::CourseId, Expr::value(new_id.clone()))
        .filter(program_course::Column::CourseId.eq(old_id.clone()))
        .exec(txn)
        .await?
        .rows_affected;
    let plo_weights = course_plo::Entity::update_many()
        .col_expr(course_plo::Column::CourseId, Expr::value(new_id.clone()))
        .filter(course_plo::Column::CourseId.eq(old_id.clone()))
        .exec(txn)
        .await?
        .rows_affected;
    let plo_clos = plo_clo::Entity::update_many()
        .col_expr(plo_clo::Column::CourseId, Expr::value(new_id.clone()))
        .filter(plo_clo::Column::CourseId.eq(old_id.clone()))
        .exec(txn)
        .await?
        .rows_affected;
    let clo_links = course_clo::Entity::update_many()
        .col_expr(course_clo::Column::CourseId, Expr::value(new_id.clone()))
        .filter(course_clo::Column::CourseId.eq(old_id.clone()))
        .exec(txn)
        .await?
        .rows_affected;

    course::Entity::delete_by_id(old_id).exec(txn).await?;

    Ok(RenameCourseResponse {
        course_id: new_id,
        program_course: offerings,
        course_plo: plo_weights,
        plo_clo: plo_clos,
        course_clo: clo_links,
    })
}
