use common::{OfferingKey, WideId};
use serde::{Deserialize, Serialize};

use super::shared::{validate_course, validate_text};
use crate::entity::program_course;
use crate::error::AppError;

#[derive(Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateOfferingRequest {
    #[serde(flatten)]
    pub key: OfferingKey,
    /// Name for the course if it has to be created. Defaults to the course id.
    pub course_name: Option<String>,
    pub course_engname: Option<String>,
    /// Name for the section if it has to be created.
    pub section_name: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ImportOfferingsRequest {
    pub rows: Vec<CreateOfferingRequest>,
}

/// Deletion target. Section and year narrow the match when present.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteOfferingsQuery {
    #[param(value_type = String)]
    pub program_id: WideId,
    pub course_id: String,
    pub semester_id: i32,
    pub section_id: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OfferingResponse {
    #[schema(value_type = String, example = "1")]
    pub id: WideId,
    #[schema(value_type = String, example = "1")]
    pub program_id: WideId,
    pub course_id: String,
    pub semester_id: i32,
    pub section_id: i32,
    pub year: i32,
}

impl From<program_course::Model> for OfferingResponse {
    fn from(m: program_course::Model) -> Self {
        Self {
            id: m.id.into(),
            program_id: m.program_id.into(),
            course_id: m.course_id,
            semester_id: m.semester_id,
            section_id: m.section_id,
            year: m.year,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateOfferingResponse {
    pub offering: OfferingResponse,
    /// Parent rows that did not exist and were created, e.g. `course CS101`.
    pub created: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImportOfferingsResponse {
    pub imported: usize,
    pub offerings: Vec<CreateOfferingResponse>,
}

/// Offering with the names of everything it references.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OfferingDetail {
    #[schema(value_type = String)]
    pub id: WideId,
    #[schema(value_type = String)]
    pub program_id: WideId,
    pub program_name: String,
    pub course_id: String,
    pub course_name: String,
    pub course_engname: String,
    pub semester_id: i32,
    pub semester_name: Option<String>,
    pub section_id: i32,
    pub section_name: Option<String>,
    pub year: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteOfferingsResponse {
    pub deleted: u64,
}

/// Trim and check a create request. Returns the normalized request.
pub fn validate_create_offering(
    req: CreateOfferingRequest,
) -> Result<CreateOfferingRequest, AppError> {
    let key = req.key.normalized();
    key.validate().map_err(AppError::Validation)?;
    if let Some(name) = &req.course_name {
        validate_text("course_name", name)?;
    }
    if let Some(name) = &req.course_engname {
        validate_text("course_engname", name)?;
    }
    if let Some(name) = &req.section_name {
        validate_text("section_name", name)?;
    }
    Ok(CreateOfferingRequest { key, ..req })
}

pub fn validate_delete_offerings(query: &DeleteOfferingsQuery) -> Result<(), AppError> {
    validate_course(&query.course_id)
}
