use common::WideId;
use serde::{Deserialize, Serialize};

use super::shared::{validate_course, validate_weight};
use crate::error::AppError;

/// Weight of a PLO within a course.
#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CoursePloScore {
    #[schema(example = "CS101")]
    pub course_id: String,
    #[schema(value_type = String, example = "1")]
    pub plo_id: WideId,
    #[schema(example = 0.5)]
    pub weight: f64,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCoursePlosRequest {
    pub scores: Vec<CoursePloScore>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateCoursePlosResponse {
    pub inserted: usize,
    /// Scores whose PLO is not linked to the program.
    pub skipped: Vec<CoursePloScore>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CoursePloResponse {
    pub course_id: String,
    pub course_name: String,
    #[schema(value_type = String)]
    pub plo_id: WideId,
    pub plo_code: String,
    pub weight: f64,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PloCloQuery {
    /// Comma-separated CLO ids, e.g. `1,2,3`.
    pub clo_ids: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PloCloResponse {
    #[schema(value_type = String)]
    pub id: WideId,
    #[schema(value_type = String)]
    pub plo_id: WideId,
    pub plo_code: String,
    pub plo_name: String,
    #[schema(value_type = String)]
    pub clo_id: WideId,
    pub clo_code: String,
    pub clo_name: String,
    pub weight: f64,
    pub course_id: String,
    pub semester_id: i32,
    pub section_id: i32,
    pub year: i32,
}

pub fn validate_score(score: &CoursePloScore) -> Result<(), AppError> {
    validate_course(&score.course_id)?;
    validate_weight(score.weight)
}

pub fn validate_create_course_plos(
    req: &CreateCoursePlosRequest,
    max: usize,
) -> Result<(), AppError> {
    if req.scores.is_empty() {
        return Err(AppError::Validation("scores must not be empty".into()));
    }
    if req.scores.len() > max {
        return Err(AppError::Validation(format!("Too many scores: max {max}")));
    }
    for (i, score) in req.scores.iter().enumerate() {
        validate_score(score).map_err(|e| super::shared::at_row(i, e))?;
    }
    Ok(())
}
