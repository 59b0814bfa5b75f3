use common::OfferingKey;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entity::{clo, course, course_clo, plo, program, program_course};
use crate::error::AppError;

/// Match the offering identified by `key`.
pub fn offering_condition(key: &OfferingKey) -> Condition {
    Condition::all()
        .add(program_course::Column::ProgramId.eq(key.program_id.get()))
        .add(program_course::Column::CourseId.eq(key.course_id.clone()))
        .add(program_course::Column::SemesterId.eq(key.semester_id))
        .add(program_course::Column::SectionId.eq(key.section_id))
        .add(program_course::Column::Year.eq(key.year))
}

/// Match the CLO links of the offering's course in the same term.
pub fn course_clo_condition(key: &OfferingKey) -> Condition {
    Condition::all()
        .add(course_clo::Column::CourseId.eq(key.course_id.clone()))
        .add(course_clo::Column::SemesterId.eq(key.semester_id))
        .add(course_clo::Column::SectionId.eq(key.section_id))
        .add(course_clo::Column::Year.eq(key.year))
}

/// Look up a program by ID, returning 404 if not found.
pub async fn find_program<C: ConnectionTrait>(db: &C, id: i64) -> Result<program::Model, AppError> {
    program::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))
}

pub async fn find_plo<C: ConnectionTrait>(db: &C, id: i64) -> Result<plo::Model, AppError> {
    plo::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("PLO not found".into()))
}

pub async fn find_course<C: ConnectionTrait>(db: &C, id: &str) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {id} not found")))
}

pub async fn find_clo<C: ConnectionTrait>(db: &C, id: i64) -> Result<clo::Model, AppError> {
    clo::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("CLO not found".into()))
}

/// Look up an offering by its natural key, returning 404 if not found.
pub async fn find_offering<C: ConnectionTrait>(
    db: &C,
    key: &OfferingKey,
) -> Result<program_course::Model, AppError> {
    program_course::Entity::find()
        .filter(offering_condition(key))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Offering not found".into()))
}
