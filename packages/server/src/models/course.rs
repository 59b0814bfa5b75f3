use serde::{Deserialize, Serialize};

use super::shared::{validate_course, validate_text};
use crate::entity::course;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCourseRequest {
    #[schema(example = "CS101")]
    pub id: String,
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCourseRequest {
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenameCourseRequest {
    /// New course id. May equal the current one to change only the names.
    #[schema(example = "CS102")]
    pub new_course_id: String,
    pub name: String,
    pub engname: String,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseListQuery {
    /// Case-insensitive match on course id or name.
    pub search: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CourseResponse {
    pub id: String,
    pub name: String,
    pub engname: String,
}

impl From<course::Model> for CourseResponse {
    fn from(m: course::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            engname: m.engname,
        }
    }
}

/// Rows touched by a course rename, per table.
#[derive(Serialize, utoipa::ToSchema, Default)]
pub struct RenameCourseResponse {
    pub course_id: String,
    pub program_course: u64,
    pub course_plo: u64,
    pub plo_clo: u64,
    pub course_clo: u64,
}

pub fn validate_create_course(req: &CreateCourseRequest) -> Result<(), AppError> {
    validate_course(&req.id)?;
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)
}

pub fn validate_update_course(req: &UpdateCourseRequest) -> Result<(), AppError> {
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)
}

pub fn validate_rename_course(req: &RenameCourseRequest) -> Result<(), AppError> {
    validate_course(&req.new_course_id)?;
    validate_text("name", &req.name)?;
    validate_text("engname", &req.engname)
}
